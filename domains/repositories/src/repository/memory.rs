//! In-memory repository store
//!
//! Implements the same port as the PostgreSQL store. Thread-safe via
//! `Arc<RwLock<>>`; clones share state, so a test can keep a handle while
//! the resolver owns another.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;

use crate::domain::entities::{Repository, RepositoryField, RepositoryId};
use crate::repository::{unique_fields, RepositoryStore};
use archivist_common::{Error, Result};

#[derive(Debug, Default)]
struct StoreState {
    repositories: BTreeMap<RepositoryId, Repository>,
    inserts: usize,
    updates: usize,
    conflicts: usize,
    unavailable: bool,
}

/// In-memory repository store
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepositoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryRepositoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store without counting the write as an insert
    pub fn with_repositories(repositories: impl IntoIterator<Item = Repository>) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.write().expect("store lock poisoned");
            for repository in repositories {
                state.repositories.insert(repository.id, repository);
            }
        }
        store
    }

    /// Look up a repository by id
    pub fn get(&self, id: RepositoryId) -> Option<Repository> {
        self.state
            .read()
            .expect("store lock poisoned")
            .repositories
            .get(&id)
            .cloned()
    }

    /// All stored repositories, ordered by id
    pub fn all(&self) -> Vec<Repository> {
        self.state
            .read()
            .expect("store lock poisoned")
            .repositories
            .values()
            .cloned()
            .collect()
    }

    /// Number of successful inserts
    pub fn insert_count(&self) -> usize {
        self.state.read().expect("store lock poisoned").inserts
    }

    /// Number of successful partial updates
    pub fn update_count(&self) -> usize {
        self.state.read().expect("store lock poisoned").updates
    }

    /// Number of partial updates refused because the stored values had changed
    pub fn conflict_count(&self) -> usize {
        self.state.read().expect("store lock poisoned").conflicts
    }

    /// Make every port operation fail until switched back
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().expect("store lock poisoned").unavailable = unavailable;
    }
}

fn unavailable() -> Error {
    Error::Internal("repository store unavailable".to_string())
}

fn poisoned() -> Error {
    Error::Internal("repository store lock poisoned".to_string())
}

#[async_trait::async_trait]
impl RepositoryStore for InMemoryRepositoryStore {
    async fn find_by_endpoint_overlap(&self, endpoints: &[String]) -> Result<Vec<Repository>> {
        let state = self.state.read().map_err(|_| poisoned())?;
        if state.unavailable {
            return Err(unavailable());
        }

        // BTreeMap iteration already yields id order
        Ok(state
            .repositories
            .values()
            .filter(|r| endpoints.iter().any(|e| r.has_endpoint(e)))
            .cloned()
            .collect())
    }

    async fn insert(&self, repository: &Repository) -> Result<()> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        if state.unavailable {
            return Err(unavailable());
        }
        if state.repositories.contains_key(&repository.id) {
            return Err(Error::Validation(format!(
                "repository {} already exists",
                repository.id
            )));
        }

        state.repositories.insert(repository.id, repository.clone());
        state.inserts += 1;
        Ok(())
    }

    async fn update_fields(
        &self,
        repository: &Repository,
        fields: &[RepositoryField],
        expected: &Repository,
    ) -> Result<bool> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        if state.unavailable {
            return Err(unavailable());
        }

        let fields = unique_fields(fields);
        let stored = state
            .repositories
            .get_mut(&repository.id)
            .ok_or_else(|| Error::NotFound(format!("repository {}", repository.id)))?;

        let unchanged = fields.iter().all(|field| match field {
            RepositoryField::Endpoints => stored.endpoints == expected.endpoints,
            RepositoryField::IsFork => stored.is_fork == expected.is_fork,
        });
        if !unchanged {
            state.conflicts += 1;
            return Ok(false);
        }

        for field in fields {
            match field {
                RepositoryField::Endpoints => stored.endpoints = repository.endpoints.clone(),
                RepositoryField::IsFork => stored.is_fork = repository.is_fork,
            }
        }
        stored.updated_at = Utc::now();
        state.updates += 1;
        Ok(true)
    }
}
