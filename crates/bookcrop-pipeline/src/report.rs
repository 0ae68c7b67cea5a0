// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-stage and per-run outcome reports.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bookcrop_core::error::{BookcropError, Result};
use bookcrop_core::types::{RunId, StageKind};

use crate::materialize::Materialization;

/// What happened to one file inside a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// The transformation was applied.
    Processed,
    /// The file reached the temp folder unchanged (copied or left in place).
    CarriedOver,
    /// The file produced nothing for the next step.
    Skipped,
}

/// A file the stage could not process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageFailure {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: StageKind,
    pub processed: usize,
    pub carried_over: usize,
    pub skipped: usize,
    pub failures: Vec<PageFailure>,
}

impl StageReport {
    pub fn new(stage: StageKind) -> Self {
        Self {
            stage,
            processed: 0,
            carried_over: 0,
            skipped: 0,
            failures: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: PageOutcome) {
        match outcome {
            PageOutcome::Processed => self.processed += 1,
            PageOutcome::CarriedOver => self.carried_over += 1,
            PageOutcome::Skipped => self.skipped += 1,
        }
    }

    /// Fold the counts of a second batch of the same stage into this one.
    pub fn merge(&mut self, other: StageReport) {
        self.processed += other.processed;
        self.carried_over += other.carried_over;
        self.skipped += other.skipped;
        self.failures.extend(other.failures);
        self.failures.sort_by(|a, b| a.name.cmp(&b.name));
    }

    pub fn total(&self) -> usize {
        self.processed + self.carried_over + self.skipped + self.failures.len()
    }
}

/// Summary of one complete run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stages: Vec<StageReport>,
    pub materialization: Materialization,
    /// Number of files delivered to the output folder.
    pub delivered: usize,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = (StageKind, &PageFailure)> {
        self.stages
            .iter()
            .flat_map(|stage| stage.failures.iter().map(move |f| (stage.stage, f)))
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// `Err` naming the first stage that lost files, if any did.
    pub fn ensure_complete(&self) -> Result<()> {
        match self.stages.iter().find(|stage| !stage.failures.is_empty()) {
            Some(stage) => Err(BookcropError::StageFailed {
                stage: stage.stage,
                failed: stage.failures.len(),
            }),
            None => Ok(()),
        }
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
