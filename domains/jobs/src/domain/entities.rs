//! Job domain entities

use archivist_repositories::RepositoryId;
use serde::{Deserialize, Serialize};

/// A request to fetch and archive one repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Job {
    pub repository_id: RepositoryId,
}

impl Job {
    pub fn new(repository_id: RepositoryId) -> Self {
        Self { repository_id }
    }
}

impl From<RepositoryId> for Job {
    fn from(repository_id: RepositoryId) -> Self {
        Self::new(repository_id)
    }
}
