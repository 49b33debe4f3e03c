//! Jobs domain: job sources, consumption contract, worker loop

pub mod domain;
pub mod error;
pub mod iter;
pub mod worker;

// Re-export domain types at the crate root for convenience
pub use domain::entities::*;
pub use domain::references::{supported_references, ObjectKind, Reference, Referencer};
pub use domain::state::{SessionEvent, SessionState, SessionStateMachine};
pub use error::JobError;
pub use iter::{
    job_queue, EndpointsJobIter, JobIter, JobQueueSender, NextJob, QueueJobIter, VecJobIter,
};
pub use worker::{JobHandler, Worker, WorkerConfig, WorkerReport};
