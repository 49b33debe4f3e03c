//! Repositories domain: repository identity, endpoint aliases, resolution

pub mod domain;
pub mod repository;
pub mod resolver;

// Re-export domain types at the crate root for convenience
pub use domain::endpoints::{dedup_endpoints, merge_endpoints};
pub use domain::entities::*;
// Re-export repository types
pub use repository::{InMemoryRepositoryStore, PgRepositoryStore, RepositoryStore};
pub use resolver::{MultipleMatchPolicy, RepositoryResolver, ResolveError};
