//! Job source over a list of repository endpoints
//!
//! Each non-empty line names one repository through one or more
//! whitespace-separated endpoints; lines starting with `#` are comments.
//! Every line is resolved to a stable repository id before it becomes a job,
//! so the same repository listed under different aliases yields the same id.

use std::path::Path;

use archivist_repositories::RepositoryResolver;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use crate::domain::entities::Job;
use crate::domain::state::{SessionEvent, SessionStateMachine};
use crate::error::JobError;
use crate::iter::{JobIter, NextJob};

/// Resolves endpoint lines into jobs
pub struct EndpointsJobIter<R> {
    lines: Option<Lines<R>>,
    resolver: RepositoryResolver,
    session: SessionStateMachine,
    line_number: usize,
}

impl EndpointsJobIter<BufReader<File>> {
    /// Open an endpoint list file
    pub async fn from_path(
        path: impl AsRef<Path>,
        resolver: RepositoryResolver,
    ) -> Result<Self, JobError> {
        let file = File::open(path.as_ref()).await?;
        Ok(Self::new(BufReader::new(file), resolver))
    }
}

impl<R> EndpointsJobIter<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R, resolver: RepositoryResolver) -> Self {
        Self {
            lines: Some(reader.lines()),
            resolver,
            session: SessionStateMachine::new("endpoint list"),
            line_number: 0,
        }
    }
}

/// Split a line into endpoints; empty for blank and comment lines
pub fn parse_endpoints(line: &str) -> Vec<String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Vec::new();
    }
    line.split_whitespace().map(str::to_string).collect()
}

#[async_trait::async_trait]
impl<R> JobIter for EndpointsJobIter<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next(&mut self) -> Result<NextJob, JobError> {
        self.session.ensure_open()?;
        if self.session.is_exhausted() {
            return Ok(NextJob::Exhausted);
        }

        loop {
            let lines = match self.lines.as_mut() {
                Some(lines) => lines,
                None => return Ok(NextJob::Exhausted),
            };

            let Some(line) = lines.next_line().await? else {
                tracing::debug!(lines = self.line_number, "Endpoint list exhausted");
                self.session.apply(SessionEvent::SourceDone);
                self.lines = None;
                return Ok(NextJob::Exhausted);
            };
            self.line_number += 1;

            let endpoints = parse_endpoints(&line);
            if endpoints.is_empty() {
                continue;
            }

            let repository_id = self.resolver.resolve(&endpoints, None).await?;
            tracing::debug!(
                line = self.line_number,
                repository_id = %repository_id,
                "Resolved endpoint line"
            );
            return Ok(NextJob::Job(Job::new(repository_id)));
        }
    }

    async fn close(&mut self) -> Result<(), JobError> {
        if self.session.apply(SessionEvent::Close) {
            self.lines = None;
        }
        Ok(())
    }
}
