//! Repository identity resolution
//!
//! Given endpoints believed to name the same repository, find the stored
//! repository that already owns any of them and record unseen aliases on it,
//! or create a new repository. The store is the only shared state between
//! workers; no in-process locking is done here.
//!
//! Recording aliases is an optimistic read-modify-write: the store only
//! writes the merged endpoint list while the stored list is still the one
//! that was read, and a refused write makes the resolution start over from
//! a fresh lookup. Concurrent merges into the same repository therefore all
//! land.
//!
//! Two workers resolving disjoint endpoint lists of the same repository at
//! the same moment can both miss each other's write and create two records.
//! That race is tolerated: later resolutions that touch both records hit the
//! multiple-match path below, which keeps the call available and reports the
//! inconsistency.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use crate::domain::endpoints::merge_endpoints;
use crate::domain::entities::{Repository, RepositoryField, RepositoryId};
use crate::repository::RepositoryStore;

/// Errors returned by [`RepositoryResolver::resolve`]
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("cannot resolve a repository from an empty endpoint list")]
    EmptyEndpoints,

    #[error("endpoints {endpoints:?} are claimed by several repositories: {ids:?}")]
    AmbiguousMatch {
        endpoints: Vec<String>,
        ids: Vec<RepositoryId>,
    },

    #[error("repository {id} kept changing underneath {attempts} merge attempts")]
    Conflict { id: RepositoryId, attempts: usize },

    #[error(transparent)]
    Store(#[from] archivist_common::Error),
}

/// Lookups a single resolution may repeat after losing a merge to another writer
const MAX_MERGE_ATTEMPTS: usize = 10;

/// What to do when the endpoints already belong to more than one repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MultipleMatchPolicy {
    /// Use the repository with the lowest id and report the inconsistency
    #[default]
    Canonical,
    /// Fail the resolution with [`ResolveError::AmbiguousMatch`]
    Reject,
}

impl FromStr for MultipleMatchPolicy {
    type Err = archivist_common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "canonical" => Ok(Self::Canonical),
            "reject" => Ok(Self::Reject),
            other => Err(archivist_common::Error::Configuration(format!(
                "Unknown multiple match policy: {}. Supported policies: canonical, reject",
                other
            ))),
        }
    }
}

impl fmt::Display for MultipleMatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canonical => write!(f, "canonical"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

/// Finds or creates the repository a list of endpoints refers to
#[derive(Clone)]
pub struct RepositoryResolver {
    store: Arc<dyn RepositoryStore>,
    policy: MultipleMatchPolicy,
}

impl RepositoryResolver {
    pub fn new(store: Arc<dyn RepositoryStore>) -> Self {
        Self {
            store,
            policy: MultipleMatchPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MultipleMatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> MultipleMatchPolicy {
        self.policy
    }

    /// Resolve `endpoints` to a repository id.
    ///
    /// `is_fork` is only recorded when the repository is created; resolving
    /// an existing repository never overwrites it. Store failures are
    /// returned unchanged and are not retried; a merge that lost to a
    /// concurrent writer is.
    pub async fn resolve(
        &self,
        endpoints: &[String],
        is_fork: Option<bool>,
    ) -> Result<RepositoryId, ResolveError> {
        if endpoints.is_empty() {
            return Err(ResolveError::EmptyEndpoints);
        }

        let mut attempt = 1;
        loop {
            let existing = match self.find_canonical(endpoints).await? {
                None => return self.create(endpoints, is_fork).await,
                Some(existing) => existing,
            };

            let id = existing.id;
            if self.add_aliases(existing, endpoints).await? {
                return Ok(id);
            }

            if attempt == MAX_MERGE_ATTEMPTS {
                return Err(ResolveError::Conflict {
                    id,
                    attempts: attempt,
                });
            }
            tracing::debug!(
                repository_id = %id,
                attempt,
                "Repository endpoints changed concurrently, resolving again"
            );
            attempt += 1;
        }
    }

    /// The repository the endpoints resolve to, applying the multiple match policy
    async fn find_canonical(
        &self,
        endpoints: &[String],
    ) -> Result<Option<Repository>, ResolveError> {
        let mut matches = self.store.find_by_endpoint_overlap(endpoints).await?;
        matches.sort_by_key(|r| r.id);

        if matches.len() > 1 {
            let ids: Vec<RepositoryId> = matches.iter().map(|r| r.id).collect();
            match self.policy {
                MultipleMatchPolicy::Reject => {
                    return Err(ResolveError::AmbiguousMatch {
                        endpoints: endpoints.to_vec(),
                        ids,
                    });
                }
                MultipleMatchPolicy::Canonical => {
                    tracing::warn!(
                        canonical_id = %ids[0],
                        ids = ?ids,
                        endpoints = ?endpoints,
                        "Endpoints are claimed by several repositories, using the lowest id"
                    );
                }
            }
        }

        Ok(matches.into_iter().next())
    }

    async fn create(
        &self,
        endpoints: &[String],
        is_fork: Option<bool>,
    ) -> Result<RepositoryId, ResolveError> {
        let repository = Repository::new(endpoints, is_fork);
        self.store.insert(&repository).await?;

        tracing::info!(
            repository_id = %repository.id,
            endpoints = ?repository.endpoints,
            "Created repository"
        );
        Ok(repository.id)
    }

    /// Record unseen endpoints on `existing`. Returns `false` when the stored
    /// endpoints changed after `existing` was read and nothing was written.
    async fn add_aliases(
        &self,
        existing: Repository,
        endpoints: &[String],
    ) -> Result<bool, ResolveError> {
        let Some(merged) = merge_endpoints(&existing.endpoints, endpoints) else {
            return Ok(true);
        };

        tracing::debug!(
            repository_id = %existing.id,
            before = existing.endpoints.len(),
            after = merged.len(),
            "Recording new repository endpoints"
        );
        let updated = Repository {
            endpoints: merged,
            ..existing.clone()
        };
        let written = self
            .store
            .update_fields(&updated, &[RepositoryField::Endpoints], &existing)
            .await?;
        Ok(written)
    }
}

impl fmt::Debug for RepositoryResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryResolver")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
