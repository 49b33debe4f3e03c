//! End-to-end worker flows over the in-memory store
//!
//! A producer resolves discovered endpoint lists and feeds a job queue while
//! a worker drains it, backing off whenever the queue is momentarily empty.

mod common;

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use archivist_jobs::{
    job_queue, EndpointsJobIter, Job, JobError, JobHandler, JobIter, NextJob, Worker, WorkerConfig,
};
use archivist_repositories::{InMemoryRepositoryStore, RepositoryId, RepositoryResolver};

use crate::common::unique_endpoints;

#[derive(Clone, Default)]
struct CollectingHandler {
    seen: Arc<Mutex<Vec<RepositoryId>>>,
}

#[async_trait::async_trait]
impl JobHandler for CollectingHandler {
    async fn handle(&self, job: &Job) -> Result<(), JobError> {
        self.seen.lock().unwrap().push(job.repository_id);
        Ok(())
    }
}

fn fast_config() -> WorkerConfig {
    WorkerConfig {
        poll_interval: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
    }
}

#[test_log::test(tokio::test)]
async fn test_producer_and_worker_share_repository_identity() {
    let store = InMemoryRepositoryStore::new();
    let resolver = RepositoryResolver::new(Arc::new(store.clone()));
    let (tx, iter) = job_queue(2);

    let discovered = vec![
        unique_endpoints(&["a", "b"]),
        unique_endpoints(&["x"]),
    ];
    let first = discovered[0].clone();
    let alias = vec![first[1].clone(), format!("{}.git", first[0])];
    let batches = vec![discovered[0].clone(), discovered[1].clone(), alias];

    let producer = {
        let resolver = resolver.clone();
        tokio::spawn(async move {
            for endpoints in batches {
                let id = resolver.resolve(&endpoints, None).await?;
                tx.send(Job::new(id)).await?;
                tokio::time::sleep(Duration::from_millis(3)).await;
            }
            Ok::<_, anyhow::Error>(())
        })
    };

    let handler = CollectingHandler::default();
    let report = Worker::new(iter, handler.clone(), fast_config())
        .run()
        .await
        .unwrap();
    producer.await.unwrap().unwrap();

    let seen = handler.seen.lock().unwrap().clone();
    assert_eq!(report.processed, 3);
    assert!(report.waits > 0);
    assert_eq!(seen[0], seen[2]);
    assert_ne!(seen[0], seen[1]);

    assert_eq!(store.all().len(), 2);
    let merged: BTreeSet<String> = store.get(seen[0]).unwrap().endpoints.into_iter().collect();
    assert_eq!(merged.len(), 3);
}

#[tokio::test]
async fn test_endpoint_list_worker_over_existing_repository() {
    let endpoints = unique_endpoints(&["main", "mirror", "fork"]);
    let store = InMemoryRepositoryStore::new();
    let resolver = RepositoryResolver::new(Arc::new(store.clone()));
    let existing = resolver
        .resolve(&endpoints[..1], Some(false))
        .await
        .unwrap();

    let input = format!(
        "# two discoveries of the same repository\n{} {}\n{}\n",
        endpoints[0], endpoints[1], endpoints[1]
    );
    let iter = EndpointsJobIter::new(std::io::Cursor::new(input.into_bytes()), resolver);

    let handler = CollectingHandler::default();
    let report = Worker::new(iter, handler.clone(), fast_config())
        .run()
        .await
        .unwrap();

    assert_eq!(report.processed, 2);
    assert_eq!(report.waits, 0);
    assert_eq!(*handler.seen.lock().unwrap(), vec![existing, existing]);
    assert_eq!(store.insert_count(), 1);
    assert_eq!(store.update_count(), 1);
    assert_eq!(store.get(existing).unwrap().is_fork, Some(false));
}

#[tokio::test]
async fn test_worker_aborts_when_store_fails() {
    let store = InMemoryRepositoryStore::new();
    let resolver = RepositoryResolver::new(Arc::new(store.clone()));
    store.set_unavailable(true);

    let input = format!("{}\n", unique_endpoints(&["a"])[0]);
    let iter = EndpointsJobIter::new(std::io::Cursor::new(input.into_bytes()), resolver);

    let result = Worker::new(iter, CollectingHandler::default(), fast_config())
        .run()
        .await;

    assert!(matches!(result, Err(JobError::Resolve(_))));
}

#[tokio::test]
async fn test_closed_queue_session_rejects_further_use() {
    let (tx, mut iter) = job_queue(1);
    assert_eq!(iter.next().await.unwrap(), NextJob::WaitForJobs);

    iter.close().await.unwrap();

    assert!(matches!(
        iter.next().await,
        Err(JobError::AlreadyStopped { .. })
    ));
    assert!(matches!(
        tx.send(Job::new(RepositoryId::new())).await,
        Err(JobError::AlreadyStopped { .. })
    ));
}
