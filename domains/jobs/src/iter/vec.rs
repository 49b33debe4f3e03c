//! Finite in-memory job source

use std::collections::VecDeque;

use crate::domain::entities::Job;
use crate::domain::state::{SessionEvent, SessionStateMachine};
use crate::error::JobError;
use crate::iter::{JobIter, NextJob};

/// Yields a fixed list of jobs, then `Exhausted`
#[derive(Debug)]
pub struct VecJobIter {
    jobs: VecDeque<Job>,
    session: SessionStateMachine,
}

impl VecJobIter {
    pub fn new(jobs: impl IntoIterator<Item = Job>) -> Self {
        Self {
            jobs: jobs.into_iter().collect(),
            session: SessionStateMachine::new("job list"),
        }
    }

    pub fn remaining(&self) -> usize {
        self.jobs.len()
    }
}

#[async_trait::async_trait]
impl JobIter for VecJobIter {
    async fn next(&mut self) -> Result<NextJob, JobError> {
        self.session.ensure_open()?;

        match self.jobs.pop_front() {
            Some(job) => Ok(NextJob::Job(job)),
            None => {
                self.session.apply(SessionEvent::SourceDone);
                Ok(NextJob::Exhausted)
            }
        }
    }

    async fn close(&mut self) -> Result<(), JobError> {
        if self.session.apply(SessionEvent::Close) {
            self.jobs.clear();
        }
        Ok(())
    }
}
