//! Archivist application composition root
//!
//! Wires the PostgreSQL store, the repository resolver and a job source into
//! a worker.

use std::future::Future;
use std::sync::Arc;

use archivist_common::Config;
use archivist_jobs::{
    EndpointsJobIter, Job, JobError, JobHandler, JobIter, Worker, WorkerConfig, WorkerReport,
};
use archivist_repositories::{
    MultipleMatchPolicy, PgRepositoryStore, RepositoryResolver, RepositoryStore,
};
use sqlx::PgPool;
use tokio::io::BufReader;

/// Hands resolved jobs to the archiving pipeline
#[derive(Debug, Clone, Default)]
pub struct DispatchHandler;

#[async_trait::async_trait]
impl JobHandler for DispatchHandler {
    async fn handle(&self, job: &Job) -> Result<(), JobError> {
        tracing::info!(repository_id = %job.repository_id, "Dispatching archive job");
        Ok(())
    }
}

/// Build the resolver configured by `config` on top of `store`
pub fn create_resolver(
    config: &Config,
    store: Arc<dyn RepositoryStore>,
) -> Result<RepositoryResolver, anyhow::Error> {
    let policy: MultipleMatchPolicy = config.resolver_multiple_match.parse()?;
    Ok(RepositoryResolver::new(store).with_policy(policy))
}

/// Open the endpoint list named by `config`, or stdin when none is set
pub async fn create_job_source(
    config: &Config,
    resolver: RepositoryResolver,
) -> Result<Box<dyn JobIter>, anyhow::Error> {
    let iter: Box<dyn JobIter> = match &config.endpoints_file {
        Some(path) => {
            tracing::info!(path = %path.display(), "Reading endpoints from file");
            Box::new(EndpointsJobIter::from_path(path, resolver).await?)
        }
        None => {
            tracing::info!("Reading endpoints from stdin");
            Box::new(EndpointsJobIter::new(
                BufReader::new(tokio::io::stdin()),
                resolver,
            ))
        }
    };
    Ok(iter)
}

/// Run a worker over the configured endpoint list until it is exhausted
/// or `shutdown` completes
pub async fn run_worker<F>(
    config: &Config,
    pool: PgPool,
    shutdown: F,
) -> Result<WorkerReport, anyhow::Error>
where
    F: Future<Output = ()>,
{
    let store: Arc<dyn RepositoryStore> = Arc::new(PgRepositoryStore::new(pool));
    let resolver = create_resolver(config, store)?;
    tracing::info!(policy = %resolver.policy(), "Repository resolver ready");

    let source = create_job_source(config, resolver).await?;
    let worker = Worker::new(source, DispatchHandler, WorkerConfig::from(config));

    Ok(worker.run_until(shutdown).await?)
}
