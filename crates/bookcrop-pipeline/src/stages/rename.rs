// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rename stage — name every page `pattern % (embedded index + offset)`.
//
// On the first stage pages are copied out of the input folder under their new
// names. Later stages move them inside the temp folder; when a new name is
// still held by another page the moves go through hidden intermediate names so
// concurrent moves never overwrite one another.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use bookcrop_core::PageFile;
use bookcrop_core::config::RenameSettings;
use bookcrop_core::error::{BookcropError, Result};
use bookcrop_core::types::StageKind;

use crate::dispatch::{Dispatcher, PageJob};
use crate::report::{PageOutcome, StageReport};
use crate::stages::StageContext;
use crate::workspace::list_pages;

/// One planned rename: `source` ends up named `target` in the temp folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameStep {
    pub source: PageFile,
    pub target: String,
}

impl RenameStep {
    fn is_identity(&self) -> bool {
        self.source.name() == self.target
    }

    fn intermediate_name(&self) -> String {
        format!(".{}.bookcrop-rename", self.target)
    }
}

impl PageJob for RenameStep {
    fn page_name(&self) -> &str {
        self.source.name()
    }
}

/// New file name for one page, extension kept as-is.
pub fn target_name(page: &PageFile, settings: &RenameSettings) -> Result<String> {
    let index = i128::from(page.embedded_index()?) + i128::from(settings.offset);
    Ok(format!("{}{}", settings.pattern.format(index), page.extension()))
}

/// Plan every rename before touching the disk. Two pages mapping to the same
/// name is an error.
pub fn plan(pages: Vec<PageFile>, settings: &RenameSettings) -> Result<Vec<RenameStep>> {
    let mut claimed: HashMap<String, String> = HashMap::with_capacity(pages.len());
    let mut steps = Vec::with_capacity(pages.len());
    for page in pages {
        let target = target_name(&page, settings)?;
        if let Some(first) = claimed.insert(target.clone(), page.name().to_string()) {
            return Err(BookcropError::NameCollision {
                stage: StageKind::Rename,
                target,
                first,
                second: page.name().to_string(),
            });
        }
        steps.push(RenameStep {
            source: page,
            target,
        });
    }
    Ok(steps)
}

/// Whether an in-place move would land on a name another page still holds.
fn needs_two_phase(steps: &[RenameStep]) -> bool {
    let current: HashSet<&str> = steps.iter().map(|s| s.source.name()).collect();
    steps
        .iter()
        .any(|s| !s.is_identity() && current.contains(s.target.as_str()))
}

fn copy_renamed(step: &RenameStep, dest: &Path) -> Result<PageOutcome> {
    debug!("Renaming \"{}\" to \"{}\"", step.source.name(), step.target);
    fs::copy(step.source.path(), dest.join(&step.target))?;
    Ok(PageOutcome::Processed)
}

fn move_renamed(step: &RenameStep, dest: &Path) -> Result<PageOutcome> {
    debug!("Renaming \"{}\" to \"{}\"", step.source.name(), step.target);
    fs::rename(step.source.path(), dest.join(&step.target))?;
    Ok(PageOutcome::Processed)
}

pub async fn run(
    ctx: &StageContext,
    settings: &RenameSettings,
    dispatcher: &Dispatcher,
) -> Result<StageReport> {
    info!("Renaming");
    let steps = plan(list_pages(&ctx.source)?, settings)?;
    let working = ctx.working.clone();

    let report = if !ctx.staged {
        dispatcher
            .run(StageKind::Rename, steps, move |step| copy_renamed(step, &working))
            .await?
    } else {
        let (unchanged, moves): (Vec<_>, Vec<_>) =
            steps.into_iter().partition(RenameStep::is_identity);
        let mut report = if needs_two_phase(&moves) {
            move_in_two_phases(moves, working, dispatcher).await?
        } else {
            dispatcher
                .run(StageKind::Rename, moves, move |step| move_renamed(step, &working))
                .await?
        };
        report.processed += unchanged.len();
        report
    };

    info!("Renamed");
    Ok(report)
}

/// A page parked under its intermediate name, waiting for its final one.
#[derive(Debug, Clone)]
struct ParkedPage {
    original: String,
    parked: PageFile,
    target: String,
}

impl PageJob for ParkedPage {
    fn page_name(&self) -> &str {
        &self.original
    }
}

/// Move a parked page to its final name. On failure the intermediate file
/// is removed so it never reaches the output.
fn unpark(page: &ParkedPage, dest: &Path) -> Result<PageOutcome> {
    debug!("Renaming \"{}\" to \"{}\"", page.original, page.target);
    if let Err(err) = fs::rename(page.parked.path(), dest.join(&page.target)) {
        if let Err(cleanup) = fs::remove_file(page.parked.path()) {
            warn!(file = page.parked.name(), error = %cleanup, "Could not remove intermediate file");
        }
        return Err(err.into());
    }
    Ok(PageOutcome::Processed)
}

/// Move every page to a hidden intermediate name, then to its final name.
/// Pages that fail the first phase are left out of the second.
async fn move_in_two_phases(
    moves: Vec<RenameStep>,
    working: PathBuf,
    dispatcher: &Dispatcher,
) -> Result<StageReport> {
    debug!(pages = moves.len(), "New names overlap old ones, renaming in two phases");
    let (parks, parked): (Vec<_>, Vec<_>) = moves
        .into_iter()
        .map(|step| {
            let intermediate = step.intermediate_name();
            let park = RenameStep {
                source: step.source.clone(),
                target: intermediate.clone(),
            };
            let parked = ParkedPage {
                original: step.source.name().to_string(),
                parked: PageFile::new(working.clone(), intermediate),
                target: step.target,
            };
            (park, parked)
        })
        .unzip();

    let dest = working.clone();
    let first = dispatcher
        .run(StageKind::Rename, parks, move |step| move_renamed(step, &dest))
        .await?;
    let failed: HashSet<&str> = first.failures.iter().map(|f| f.name.as_str()).collect();
    let parked: Vec<ParkedPage> = parked
        .into_iter()
        .filter(|page| !failed.contains(page.original.as_str()))
        .collect();

    let mut report = dispatcher
        .run(StageKind::Rename, parked, move |page| unpark(page, &working))
        .await?;
    report.failures.extend(first.failures);
    report.failures.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(report)
}
