// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Convert stage — re-encode every page as an RGB JPEG named `<stem>.jpg`.
//
// Pages that are already JPEG are not re-encoded; the configured
// `JpegPolicy` decides whether they travel on to the output.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{debug, info, instrument, warn};

use bookcrop_core::PageFile;
use bookcrop_core::config::ConvertSettings;
use bookcrop_core::error::{BookcropError, Result};
use bookcrop_core::types::{JpegPolicy, StageKind};
use bookcrop_imaging::PageImage;

use crate::dispatch::Dispatcher;
use crate::report::{PageOutcome, StageReport};
use crate::stages::StageContext;
use crate::workspace::{copy_page, list_pages};

/// Name the converted page will carry.
pub fn converted_name(page: &PageFile) -> String {
    format!("{}.jpg", page.stem())
}

/// Name `page` will have in the temp folder after this stage, or `None` when
/// it produces nothing there.
fn output_name(page: &PageFile, staged: bool, policy: JpegPolicy) -> Option<String> {
    if !page.is_jpeg() {
        return Some(converted_name(page));
    }
    match (staged, policy) {
        (true, _) | (false, JpegPolicy::CopyThrough) => Some(page.name().to_string()),
        (false, JpegPolicy::Drop) => None,
    }
}

/// Reject runs where two pages would end up under one name, e.g.
/// `p1.png` and `p1.tif`, or `p1.png` next to a carried `p1.jpg`.
pub fn check_collisions(pages: &[PageFile], staged: bool, policy: JpegPolicy) -> Result<()> {
    let mut claimed: HashMap<String, &str> = HashMap::with_capacity(pages.len());
    for page in pages {
        let Some(target) = output_name(page, staged, policy) else {
            continue;
        };
        if let Some(first) = claimed.insert(target.clone(), page.name()) {
            return Err(BookcropError::NameCollision {
                stage: StageKind::Convert,
                target,
                first: first.to_string(),
                second: page.name().to_string(),
            });
        }
    }
    Ok(())
}

/// Convert one page into `dest`.
///
/// When `staged`, the page already lives in the temp folder and its
/// pre-conversion file is deleted once the JPEG is written.
#[instrument(level = "debug", skip_all, fields(page = page.name()))]
pub fn convert_page(
    page: &PageFile,
    dest: &Path,
    staged: bool,
    policy: JpegPolicy,
) -> Result<PageOutcome> {
    if page.is_jpeg() {
        return carry_jpeg(page, dest, staged, policy);
    }

    debug!("Converting {} to jpeg", page.name());
    PageImage::open(page.path())?
        .to_rgb()
        .save(dest.join(converted_name(page)))?;
    if staged {
        debug!("Deleting file: {}", page.path().display());
        fs::remove_file(page.path())?;
    }
    Ok(PageOutcome::Processed)
}

fn carry_jpeg(page: &PageFile, dest: &Path, staged: bool, policy: JpegPolicy) -> Result<PageOutcome> {
    match (staged, policy) {
        (true, _) => {
            debug!("Skipping {}, already jpeg", page.name());
            Ok(PageOutcome::CarriedOver)
        }
        (false, JpegPolicy::CopyThrough) => {
            debug!("Skipping {}, already jpeg. Copying it unchanged", page.name());
            copy_page(page, dest)?;
            Ok(PageOutcome::CarriedOver)
        }
        (false, JpegPolicy::Drop) => {
            warn!("Skipping {}, already jpeg. It will not reach the output", page.name());
            Ok(PageOutcome::Skipped)
        }
    }
}

pub async fn run(
    ctx: &StageContext,
    settings: &ConvertSettings,
    dispatcher: &Dispatcher,
) -> Result<StageReport> {
    info!("Converting to jpeg");
    let pages = list_pages(&ctx.source)?;
    check_collisions(&pages, ctx.staged, settings.jpeg_policy)?;

    let (working, staged, policy) = (ctx.working.clone(), ctx.staged, settings.jpeg_policy);
    let report = dispatcher
        .run(StageKind::Convert, pages, move |page| {
            convert_page(page, &working, staged, policy)
        })
        .await?;

    if report.skipped > 0 {
        warn!(dropped = report.skipped, "Jpeg pages dropped from the run");
    }
    info!("Converted");
    Ok(report)
}
