// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stage executors, one module per transformation.
//
// Each module exposes a per-file operation (source page in, one file written
// into the temp folder) and an async `run` that applies it to a whole folder
// snapshot through the dispatcher.

pub mod convert;
pub mod crop;
pub mod rename;
pub mod rotate;

use std::path::PathBuf;

use crate::state::RunState;

/// Where a stage reads from and writes to.
#[derive(Debug, Clone)]
pub struct StageContext {
    /// Input folder on the first stage, temp folder afterwards.
    pub source: PathBuf,
    pub working: PathBuf,
    /// Whether an earlier stage already wrote into `working`.
    pub staged: bool,
}

impl StageContext {
    pub fn new(state: &RunState) -> Self {
        Self {
            source: state.source().to_path_buf(),
            working: state.working().to_path_buf(),
            staged: state.is_staged(),
        }
    }
}
