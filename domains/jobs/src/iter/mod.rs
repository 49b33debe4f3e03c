//! Job iteration contract
//!
//! A worker drains a [`JobIter`] until it reports [`NextJob::Exhausted`].
//! [`NextJob::WaitForJobs`] means the source is empty for now but may still
//! produce jobs, so the worker backs off and asks again.

pub mod endpoints;
pub mod queue;
pub mod vec;

use crate::domain::entities::Job;
use crate::error::JobError;

pub use endpoints::EndpointsJobIter;
pub use queue::{job_queue, JobQueueSender, QueueJobIter};
pub use vec::VecJobIter;

/// Outcome of asking a source for its next job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextJob {
    Job(Job),
    /// The source will never produce another job
    Exhausted,
    /// The source is empty at the moment; ask again later
    WaitForJobs,
}

impl NextJob {
    pub fn into_job(self) -> Option<Job> {
        match self {
            NextJob::Job(job) => Some(job),
            _ => None,
        }
    }
}

/// A session over a queue of jobs
///
/// Once a source has reported `Exhausted` it keeps doing so. After `close()`
/// every call to `next()` fails with [`JobError::AlreadyStopped`]; closing
/// again is a no-op.
#[async_trait::async_trait]
pub trait JobIter: Send {
    async fn next(&mut self) -> Result<NextJob, JobError>;

    /// Release the underlying queue resources
    async fn close(&mut self) -> Result<(), JobError>;
}

#[async_trait::async_trait]
impl<I: JobIter + ?Sized> JobIter for Box<I> {
    async fn next(&mut self) -> Result<NextJob, JobError> {
        (**self).next().await
    }

    async fn close(&mut self) -> Result<(), JobError> {
        (**self).close().await
    }
}
