// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run state threaded through the stages of one pipeline run.

use std::path::Path;

use bookcrop_core::config::Locations;
use bookcrop_core::types::RunId;

/// Ownership unit of a single run.
///
/// `staged` is the only state passed from one stage to the next: once any
/// stage has written into the temp folder, every later stage reads from there
/// instead of from the input folder.
#[derive(Debug, Clone)]
pub struct RunState {
    id: RunId,
    locations: Locations,
    staged: bool,
}

impl RunState {
    pub fn new(locations: Locations) -> Self {
        Self {
            id: RunId::new(),
            locations,
            staged: false,
        }
    }

    pub fn id(&self) -> RunId {
        self.id
    }

    pub fn input(&self) -> &Path {
        &self.locations.input
    }

    pub fn working(&self) -> &Path {
        &self.locations.working
    }

    pub fn output(&self) -> &Path {
        &self.locations.output
    }

    pub fn is_staged(&self) -> bool {
        self.staged
    }

    /// Folder the next stage reads from.
    pub fn source(&self) -> &Path {
        if self.staged {
            self.working()
        } else {
            self.input()
        }
    }

    /// Record that a stage has executed. Set even when the stage wrote nothing.
    pub fn mark_staged(&mut self) {
        self.staged = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn source_switches_to_working_once_staged() {
        let mut state = RunState::new(Locations {
            input: PathBuf::from("in"),
            output: PathBuf::from("out"),
            working: PathBuf::from("tmp"),
        });
        assert!(!state.is_staged());
        assert_eq!(state.source(), Path::new("in"));

        state.mark_staged();
        assert!(state.is_staged());
        assert_eq!(state.source(), Path::new("tmp"));

        state.mark_staged();
        assert_eq!(state.source(), Path::new("tmp"));
    }
}
