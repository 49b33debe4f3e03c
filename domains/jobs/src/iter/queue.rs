//! Channel-backed job queue
//!
//! Producers push jobs through [`JobQueueSender`]; a worker drains the
//! [`QueueJobIter`]. An empty queue with live producers reports
//! `WaitForJobs`; once every sender is dropped and the queue is drained it
//! reports `Exhausted`.

use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};

use crate::domain::entities::Job;
use crate::domain::state::{SessionEvent, SessionStateMachine};
use crate::error::JobError;
use crate::iter::{JobIter, NextJob};

const RESOURCE: &str = "job queue";

/// Create a bounded job queue
pub fn job_queue(capacity: usize) -> (JobQueueSender, QueueJobIter) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        JobQueueSender { tx },
        QueueJobIter {
            rx: Some(rx),
            session: SessionStateMachine::new(RESOURCE),
        },
    )
}

/// Producer side of a job queue
#[derive(Debug, Clone)]
pub struct JobQueueSender {
    tx: mpsc::Sender<Job>,
}

impl JobQueueSender {
    /// Enqueue a job, waiting for capacity
    pub async fn send(&self, job: Job) -> Result<(), JobError> {
        self.tx.send(job).await.map_err(|_| stopped())
    }

    /// Enqueue a job if there is capacity right now
    pub fn try_send(&self, job: Job) -> Result<(), JobError> {
        self.tx.try_send(job).map_err(|err| match err {
            TrySendError::Full(_) => JobError::Source("job queue is full".to_string()),
            TrySendError::Closed(_) => stopped(),
        })
    }

    /// Whether the consumer has closed the queue
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side of a job queue
#[derive(Debug)]
pub struct QueueJobIter {
    rx: Option<mpsc::Receiver<Job>>,
    session: SessionStateMachine,
}

fn stopped() -> JobError {
    JobError::AlreadyStopped {
        resource: RESOURCE.to_string(),
    }
}

#[async_trait::async_trait]
impl JobIter for QueueJobIter {
    async fn next(&mut self) -> Result<NextJob, JobError> {
        self.session.ensure_open()?;
        if self.session.is_exhausted() {
            return Ok(NextJob::Exhausted);
        }

        let rx = self.rx.as_mut().ok_or_else(stopped)?;
        match rx.try_recv() {
            Ok(job) => Ok(NextJob::Job(job)),
            Err(TryRecvError::Empty) => Ok(NextJob::WaitForJobs),
            Err(TryRecvError::Disconnected) => {
                self.session.apply(SessionEvent::SourceDone);
                self.rx = None;
                Ok(NextJob::Exhausted)
            }
        }
    }

    async fn close(&mut self) -> Result<(), JobError> {
        if self.session.apply(SessionEvent::Close) {
            if let Some(mut rx) = self.rx.take() {
                rx.close();
                let mut dropped = 0usize;
                while rx.try_recv().is_ok() {
                    dropped += 1;
                }
                tracing::debug!(dropped, "Closed job queue");
            }
        }
        Ok(())
    }
}
