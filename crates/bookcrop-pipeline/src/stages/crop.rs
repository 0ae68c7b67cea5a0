// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Crop stage — clip every page to one rectangle resolved up front.

use std::path::Path;

use tracing::{debug, info, instrument, warn};

use bookcrop_core::PageFile;
use bookcrop_core::config::CropSettings;
use bookcrop_core::error::Result;
use bookcrop_core::geometry::CropRect;
use bookcrop_core::types::StageKind;
use bookcrop_imaging::PageImage;

use crate::dispatch::Dispatcher;
use crate::report::{PageOutcome, StageReport};
use crate::stages::StageContext;
use crate::workspace::list_pages;

/// Resolve the run's crop rectangle.
///
/// Right and bottom anchors measure from the first page of the sorted
/// snapshot, so the geometry does not depend on directory enumeration order.
pub fn resolve_rect(settings: &CropSettings, pages: &[PageFile]) -> Result<CropRect> {
    let probe = match (settings.anchor.needs_probe(), pages.first()) {
        (true, Some(first)) => {
            let (width, height) = PageImage::probe_dimensions(first.path())?;
            debug!(probe = first.name(), width, height, "Reference page for crop");
            Some((first.name(), width, height))
        }
        _ => None,
    };
    CropRect::resolve(settings.size, settings.anchor, probe)
}

/// Crop one page into `dest` under the same name.
#[instrument(level = "debug", skip_all, fields(page = page.name()))]
pub fn crop_page(page: &PageFile, dest: &Path, rect: CropRect) -> Result<PageOutcome> {
    debug!("Cropping {}", page.name());
    PageImage::open(page.path())?
        .crop(rect, page.name())?
        .save(dest.join(page.name()))?;
    Ok(PageOutcome::Processed)
}

pub async fn run(
    ctx: &StageContext,
    settings: &CropSettings,
    dispatcher: &Dispatcher,
) -> Result<StageReport> {
    info!("Start cropping");
    let pages = list_pages(&ctx.source)?;
    if pages.is_empty() {
        warn!(source = %ctx.source.display(), "Nothing to crop");
        return Ok(StageReport::new(StageKind::Crop));
    }

    let rect = resolve_rect(settings, &pages)?;
    debug!(size = %settings.size, anchor = %settings.anchor, %rect, "Crop rectangle resolved");

    let working = ctx.working.clone();
    let report = dispatcher
        .run(StageKind::Crop, pages, move |page| crop_page(page, &working, rect))
        .await?;
    info!("Cropped");
    Ok(report)
}
