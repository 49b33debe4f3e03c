//! Persistence for the Repositories domain
//!
//! `RepositoryStore` is the narrow port the resolver depends on. It is
//! implemented by `PgRepositoryStore` for production and by
//! `InMemoryRepositoryStore` for tests and local runs.

pub mod memory;
pub mod postgres;

use crate::domain::entities::{Repository, RepositoryField};
use archivist_common::Result;

pub use memory::InMemoryRepositoryStore;
pub use postgres::PgRepositoryStore;

/// Storage operations required by repository resolution
#[async_trait::async_trait]
pub trait RepositoryStore: Send + Sync {
    /// Find every repository whose endpoint set intersects `endpoints`,
    /// ordered by id ascending.
    async fn find_by_endpoint_overlap(&self, endpoints: &[String]) -> Result<Vec<Repository>>;

    /// Persist a new repository
    async fn insert(&self, repository: &Repository) -> Result<()>;

    /// Write only `fields` of an existing repository.
    ///
    /// The write is conditional: it only happens while the stored values of
    /// `fields` still equal those in `expected`, the copy the caller read
    /// before computing `repository`. Returns `Ok(false)` when another writer
    /// changed them first and `Error::NotFound` when the repository is gone.
    async fn update_fields(
        &self,
        repository: &Repository,
        fields: &[RepositoryField],
        expected: &Repository,
    ) -> Result<bool>;
}

/// Drop repeated fields so each column is assigned once
pub(crate) fn unique_fields(fields: &[RepositoryField]) -> Vec<RepositoryField> {
    let mut unique = Vec::with_capacity(fields.len());
    for field in fields {
        if !unique.contains(field) {
            unique.push(*field);
        }
    }
    unique
}
