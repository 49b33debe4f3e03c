//! Error taxonomy for job consumption
//!
//! "No job right now" and "no job ever again" are not errors; they are
//! [`NextJob`](crate::iter::NextJob) variants.

use archivist_repositories::ResolveError;
use thiserror::Error;

use crate::domain::references::ObjectKind;

/// Errors raised while obtaining or processing jobs
#[derive(Debug, Error)]
pub enum JobError {
    /// An operation was attempted after the resource was closed
    #[error("already stopped: {resource}")]
    AlreadyStopped { resource: String },

    #[error("referenced object type not supported: {reference} points to a {kind}")]
    ReferencedObjectTypeNotSupported {
        reference: String,
        kind: ObjectKind,
    },

    #[error("job source error: {0}")]
    Source(String),

    #[error("job source I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("repository resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    #[error("job handler error: {0}")]
    Handler(String),
}

impl JobError {
    /// Retrying the same item cannot succeed without someone changing the
    /// input or repairing the stored repositories
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            JobError::AlreadyStopped { .. }
                | JobError::ReferencedObjectTypeNotSupported { .. }
                | JobError::Resolve(ResolveError::EmptyEndpoints)
                | JobError::Resolve(ResolveError::AmbiguousMatch { .. })
        )
    }
}
