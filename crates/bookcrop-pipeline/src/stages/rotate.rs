// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rotate stage — turn all, even or odd pages upside down.

use std::path::Path;

use tracing::{debug, info, instrument};

use bookcrop_core::PageFile;
use bookcrop_core::error::Result;
use bookcrop_core::types::{RotateMode, StageKind};
use bookcrop_imaging::PageImage;

use crate::dispatch::Dispatcher;
use crate::report::{PageOutcome, StageReport};
use crate::stages::StageContext;
use crate::workspace::{copy_page, list_pages};

/// Pages split by whether they get rotated. The two lists are disjoint and
/// together hold every input page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPartition {
    pub rotate: Vec<PageFile>,
    pub pass_through: Vec<PageFile>,
}

/// Classify `pages` in a single pass.
pub fn partition(pages: Vec<PageFile>, mode: RotateMode) -> RotationPartition {
    let (rotate, pass_through) = match mode {
        RotateMode::None => (Vec::new(), pages),
        RotateMode::All => (pages, Vec::new()),
        RotateMode::Even | RotateMode::Odd => {
            let wanted = mode.selected_parity();
            pages
                .into_iter()
                .partition(|page| Some(page.parity()) == wanted)
        }
    };
    RotationPartition {
        rotate,
        pass_through,
    }
}

/// Rotate one page by 180° into `dest` under the same name.
#[instrument(level = "debug", skip_all, fields(page = page.name()))]
pub fn rotate_page(page: &PageFile, dest: &Path) -> Result<PageOutcome> {
    debug!("Rotating {}", page.name());
    PageImage::open(page.path())?
        .rotate_half_turn()
        .save(dest.join(page.name()))?;
    Ok(PageOutcome::Processed)
}

/// Rotate the selected pages and make sure the rest are in the temp folder.
///
/// Pass-through pages are copied whenever the stage reads from the input
/// folder; when it reads from the temp folder they are already there.
pub async fn run(
    ctx: &StageContext,
    mode: RotateMode,
    dispatcher: &Dispatcher,
) -> Result<StageReport> {
    info!("Rotating");
    let pages = list_pages(&ctx.source)?;
    let RotationPartition {
        rotate,
        pass_through,
    } = partition(pages, mode);
    debug!(
        ?mode,
        rotate = rotate.len(),
        pass_through = pass_through.len(),
        "Pages partitioned"
    );

    let working = ctx.working.clone();
    let mut report = dispatcher
        .run(StageKind::Rotate, rotate, move |page| rotate_page(page, &working))
        .await?;

    if ctx.staged {
        report.carried_over += pass_through.len();
    } else {
        let working = ctx.working.clone();
        let carried = dispatcher
            .run(StageKind::Rotate, pass_through, move |page| {
                copy_page(page, &working)?;
                Ok(PageOutcome::CarriedOver)
            })
            .await?;
        report.merge(carried);
    }

    info!("Rotated");
    Ok(report)
}
