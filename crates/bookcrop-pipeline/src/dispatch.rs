// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded per-stage fan-out.
//
// Every file of a stage becomes one task in a `JoinSet`. A semaphore caps how
// many run at once, and the codec work itself happens on the blocking pool
// because image decoding and encoding never yield. `run` returns only when
// every task has finished: this is the barrier between stages.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use bookcrop_core::PageFile;
use bookcrop_core::error::{BookcropError, Result};
use bookcrop_core::types::{FailurePolicy, StageKind};

use crate::report::{PageFailure, PageOutcome, StageReport};

/// A unit of work that names the file it acts on.
pub trait PageJob: Send + 'static {
    fn page_name(&self) -> &str;
}

impl PageJob for PageFile {
    fn page_name(&self) -> &str {
        self.name()
    }
}

/// Runs one stage's per-file operations with bounded concurrency.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    jobs: usize,
    policy: FailurePolicy,
}

impl Dispatcher {
    pub fn new(jobs: usize, policy: FailurePolicy) -> Self {
        Self {
            jobs: jobs.max(1),
            policy,
        }
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Apply `op` to every item and wait for all of them.
    ///
    /// Under `FailFast` the first error is returned once pages already in
    /// flight have finished; pages not yet started are skipped. Under `KeepGoing` errors are collected in the report.
    /// Completion order never affects the report: failures are sorted by name.
    pub async fn run<T, F>(&self, stage: StageKind, items: Vec<T>, op: F) -> Result<StageReport>
    where
        T: PageJob,
        F: Fn(&T) -> Result<PageOutcome> + Send + Sync + 'static,
    {
        let op = Arc::new(op);
        let permits = Arc::new(Semaphore::new(self.jobs));
        let mut tasks = JoinSet::new();

        debug!(%stage, files = items.len(), jobs = self.jobs, "Dispatching stage");

        for item in items {
            let op = Arc::clone(&op);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|err| BookcropError::Task(err.to_string()))?;
                tokio::task::spawn_blocking(move || {
                    let outcome = op(&item);
                    (item.page_name().to_string(), outcome)
                })
                .await
                .map_err(|err| BookcropError::Task(err.to_string()))
            });
        }

        let mut report = StageReport::new(stage);
        while let Some(joined) = tasks.join_next().await {
            let (name, outcome) = joined.map_err(|err| BookcropError::Task(err.to_string()))??;
            match outcome {
                Ok(outcome) => report.record(outcome),
                Err(err) => match self.policy {
                    FailurePolicy::FailFast => {
                        error!(%stage, file = %name, error = %err, "Page failed, aborting run");
                        // Queued pages fail to get a permit and never start.
                        // Blocking work already running cannot be aborted, so
                        // wait for it to leave the temp folder alone.
                        permits.close();
                        while tasks.join_next().await.is_some() {}
                        return Err(err);
                    }
                    FailurePolicy::KeepGoing => {
                        warn!(%stage, file = %name, error = %err, "Page failed, continuing");
                        report.failures.push(PageFailure {
                            name,
                            error: err.to_string(),
                        });
                    }
                },
            }
        }

        report.failures.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(report)
    }
}
