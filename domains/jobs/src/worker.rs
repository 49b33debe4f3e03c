//! Worker loop
//!
//! Drains a [`JobIter`] and hands every job to a [`JobHandler`]. The worker
//! backs off while the source reports `WaitForJobs`, stops on `Exhausted`,
//! and stops with the error when the source fails. Handler failures only
//! affect the job being handled. The iterator is closed on every exit path.
//!
//! Shutdown is observed between items and while backing off, never while
//! `next` is running: a source that resolves repositories finishes the item
//! it started, and that item is dispatched before the worker leaves. A
//! source blocked on input therefore stops once its pending read returns.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use archivist_common::Config;

use crate::domain::entities::Job;
use crate::error::JobError;
use crate::iter::{JobIter, NextJob};

/// Processes one job
#[async_trait::async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &Job) -> Result<(), JobError>;
}

/// Back-off settings for an idle worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Delay after the first `WaitForJobs`
    pub poll_interval: Duration,
    /// Ceiling for the doubling delay
    pub max_backoff: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl From<&Config> for WorkerConfig {
    fn from(config: &Config) -> Self {
        Self {
            poll_interval: config.worker_poll_interval,
            max_backoff: config.worker_max_backoff,
        }
    }
}

/// Counters for one worker session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub processed: usize,
    pub failed: usize,
    pub waits: usize,
}

pub struct Worker<I, H> {
    iter: I,
    handler: H,
    config: WorkerConfig,
}

impl<I, H> Worker<I, H>
where
    I: JobIter,
    H: JobHandler,
{
    pub fn new(iter: I, handler: H, config: WorkerConfig) -> Self {
        Self {
            iter,
            handler,
            config,
        }
    }

    /// Run until the source is exhausted or fails
    pub async fn run(self) -> Result<WorkerReport, JobError> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Run until the source is exhausted, fails, or `shutdown` completes
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<WorkerReport, JobError>
    where
        F: Future<Output = ()>,
    {
        tracing::info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            max_backoff_ms = self.config.max_backoff.as_millis() as u64,
            "Worker session started"
        );

        let shutdown = std::pin::pin!(shutdown);
        let outcome = self.drain(shutdown).await;
        let closed = self.iter.close().await;

        match (outcome, closed) {
            (Ok(report), Ok(())) => {
                tracing::info!(
                    processed = report.processed,
                    failed = report.failed,
                    waits = report.waits,
                    "Worker session finished"
                );
                Ok(report)
            }
            (Err(err), closed) => {
                if let Err(close_err) = closed {
                    tracing::warn!(error = %close_err, "Failed to close job source");
                }
                tracing::error!(error = %err, "Worker session aborted");
                Err(err)
            }
            (Ok(_), Err(close_err)) => Err(close_err),
        }
    }

    async fn drain<F>(&mut self, mut shutdown: Pin<&mut F>) -> Result<WorkerReport, JobError>
    where
        F: Future<Output = ()>,
    {
        let mut report = WorkerReport::default();
        let mut backoff = self.config.poll_interval;

        loop {
            if shutdown_requested(shutdown.as_mut()).await {
                tracing::info!("Shutdown requested, leaving job source");
                return Ok(report);
            }

            match self.iter.next().await? {
                NextJob::Job(job) => {
                    backoff = self.config.poll_interval;
                    self.dispatch(&job, &mut report).await;
                }
                NextJob::WaitForJobs => {
                    report.waits += 1;
                    tracing::debug!(
                        backoff_ms = backoff.as_millis() as u64,
                        "No jobs at the moment, backing off"
                    );
                    tokio::select! {
                        biased;
                        _ = shutdown.as_mut() => {
                            tracing::info!("Shutdown requested, leaving job source");
                            return Ok(report);
                        }
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = (backoff * 2).min(self.config.max_backoff);
                }
                NextJob::Exhausted => return Ok(report),
            }
        }
    }

    async fn dispatch(&self, job: &Job, report: &mut WorkerReport) {
        match self.handler.handle(job).await {
            Ok(()) => report.processed += 1,
            Err(err) if err.is_permanent() => {
                report.failed += 1;
                tracing::warn!(
                    repository_id = %job.repository_id,
                    error = %err,
                    "Job rejected permanently, skipping"
                );
            }
            Err(err) => {
                report.failed += 1;
                tracing::error!(
                    repository_id = %job.repository_id,
                    error = %err,
                    "Job failed"
                );
            }
        }
    }
}

/// Whether `shutdown` has completed, without waiting for it
async fn shutdown_requested<F>(shutdown: Pin<&mut F>) -> bool
where
    F: Future<Output = ()>,
{
    tokio::select! {
        biased;
        _ = shutdown => true,
        _ = std::future::ready(()) => false,
    }
}
