// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Materialization: turn the temp folder (or the untouched input) into the
// output folder once every stage has run.

use std::fs;
use std::io;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use bookcrop_core::error::Result;

use crate::state::RunState;
use crate::workspace::{copy_all, list_pages};

/// How the output folder was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Materialization {
    /// The temp folder was renamed into place as the output folder.
    Promote,
    /// Temp folder contents were copied into the output; temp is retained.
    CopyMerge,
    /// No stage ran: input was copied verbatim.
    PureCopy,
}

impl Materialization {
    pub fn decide(staged: bool, clean: bool) -> Self {
        match (staged, clean) {
            (true, true) => Self::Promote,
            (true, false) => Self::CopyMerge,
            (false, _) => Self::PureCopy,
        }
    }
}

/// Produce the output folder. Returns the decision taken and how many files
/// the output folder holds afterwards.
#[instrument(skip_all, fields(staged = state.is_staged(), clean = clean))]
pub fn materialize(state: &RunState, clean: bool) -> Result<(Materialization, usize)> {
    let decision = Materialization::decide(state.is_staged(), clean);
    debug!(?decision, "Materializing output");

    match decision {
        Materialization::Promote => promote(state)?,
        Materialization::CopyMerge => {
            info!("Copying files to output folder");
            copy_all(state.working(), state.output())?;
        }
        Materialization::PureCopy => {
            warn!("NO changes were applied to source images");
            fs::remove_dir(state.working())?;
            copy_all(state.input(), state.output())?;
        }
    }

    let delivered = list_pages(state.output())?.len();
    info!(delivered, "Done");
    Ok((decision, delivered))
}

/// Replace the (empty) output folder with the temp folder.
fn promote(state: &RunState) -> Result<()> {
    let (working, output) = (state.working(), state.output());
    info!("Moving temp folder to output");
    fs::remove_dir(output)?;
    match fs::rename(working, output) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
            debug!("Temp and output are on different filesystems, copying instead");
            fs::create_dir_all(output)?;
            copy_all(working, output)?;
            fs::remove_dir_all(working)?;
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookcrop_core::config::Locations;
    use std::path::Path;

    fn state(root: &Path) -> RunState {
        let locations = Locations {
            input: root.join("input"),
            output: root.join("output"),
            working: root.join("tmp"),
        };
        for dir in [&locations.input, &locations.output, &locations.working] {
            fs::create_dir(dir).unwrap();
        }
        fs::write(locations.input.join("scan1.png"), b"original").unwrap();
        RunState::new(locations)
    }

    #[test]
    fn decision_table() {
        assert_eq!(Materialization::decide(true, true), Materialization::Promote);
        assert_eq!(Materialization::decide(true, false), Materialization::CopyMerge);
        assert_eq!(Materialization::decide(false, true), Materialization::PureCopy);
        assert_eq!(Materialization::decide(false, false), Materialization::PureCopy);
    }

    #[test]
    fn pure_copy_removes_temp_and_copies_input() {
        let root = tempfile::tempdir().unwrap();
        let state = state(root.path());

        let (decision, delivered) = materialize(&state, false).unwrap();
        assert_eq!(decision, Materialization::PureCopy);
        assert_eq!(delivered, 1);
        assert!(!state.working().exists());
        assert_eq!(fs::read(state.output().join("scan1.png")).unwrap(), b"original");
    }

    #[test]
    fn copy_merge_keeps_temp() {
        let root = tempfile::tempdir().unwrap();
        let mut state = state(root.path());
        fs::write(state.working().join("scan1.png"), b"cropped").unwrap();
        state.mark_staged();

        let (decision, delivered) = materialize(&state, false).unwrap();
        assert_eq!(decision, Materialization::CopyMerge);
        assert_eq!(delivered, 1);
        assert_eq!(fs::read(state.output().join("scan1.png")).unwrap(), b"cropped");
        assert!(state.working().join("scan1.png").exists());
    }

    #[test]
    fn promote_moves_temp_into_place() {
        let root = tempfile::tempdir().unwrap();
        let mut state = state(root.path());
        fs::write(state.working().join("scan1.png"), b"rotated").unwrap();
        state.mark_staged();

        let (decision, _) = materialize(&state, true).unwrap();
        assert_eq!(decision, Materialization::Promote);
        assert!(!state.working().exists());
        assert_eq!(fs::read(state.output().join("scan1.png")).unwrap(), b"rotated");
    }

    #[test]
    fn serializes_kebab_case() {
        let json = serde_json::to_string(&Materialization::CopyMerge).unwrap();
        assert_eq!(json, "\"copy-merge\"");
    }
}
