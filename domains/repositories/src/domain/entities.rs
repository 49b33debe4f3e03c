//! Repository domain entities
//!
//! A repository is identified by a stable id and is reachable through any of
//! its endpoints. The same repository may be discovered through mirrors,
//! renamed remotes or protocol variants, so the endpoint list only grows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::endpoints::dedup_endpoints;

/// Stable repository identifier, assigned at creation and never reassigned
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct RepositoryId(Uuid);

impl RepositoryId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RepositoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RepositoryId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Repository entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Repository {
    pub id: RepositoryId,
    pub endpoints: Vec<String>,
    /// `None` when it is not known whether the repository is a fork
    pub is_fork: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Repository {
    /// Create a new repository reachable through `endpoints`.
    ///
    /// Repeated endpoints are collapsed, keeping first-seen order.
    pub fn new(endpoints: &[String], is_fork: Option<bool>) -> Self {
        let now = Utc::now();
        Repository {
            id: RepositoryId::new(),
            endpoints: dedup_endpoints(endpoints),
            is_fork,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether the repository is known under `endpoint`
    pub fn has_endpoint(&self, endpoint: &str) -> bool {
        self.endpoints.iter().any(|e| e == endpoint)
    }
}

/// Columns that may be written by a partial update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryField {
    Endpoints,
    IsFork,
}

impl RepositoryField {
    /// Column name in the `repositories` table
    pub fn column(&self) -> &'static str {
        match self {
            RepositoryField::Endpoints => "endpoints",
            RepositoryField::IsFork => "is_fork",
        }
    }
}

impl fmt::Display for RepositoryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}
