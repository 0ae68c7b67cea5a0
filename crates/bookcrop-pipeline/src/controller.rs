// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline controller — runs the enabled stages in fixed order, then
// materializes the output.

use chrono::Utc;
use tracing::{debug, info, instrument};

use bookcrop_core::config::{ConvertSettings, CropSettings, PipelineConfig, RenameSettings};
use bookcrop_core::error::Result;
use bookcrop_core::types::{RotateMode, StageKind};

use crate::dispatch::Dispatcher;
use crate::materialize::materialize;
use crate::report::{RunReport, StageReport};
use crate::stages::{self, StageContext};
use crate::state::RunState;
use crate::workspace::{self, Confirm};

/// One enabled stage together with its settings.
#[derive(Debug, Clone, Copy)]
enum Stage<'a> {
    Crop(&'a CropSettings),
    Rotate(RotateMode),
    Rename(&'a RenameSettings),
    Convert(&'a ConvertSettings),
}

impl Stage<'_> {
    fn kind(&self) -> StageKind {
        match self {
            Stage::Crop(_) => StageKind::Crop,
            Stage::Rotate(_) => StageKind::Rotate,
            Stage::Rename(_) => StageKind::Rename,
            Stage::Convert(_) => StageKind::Convert,
        }
    }
}

/// A validated pipeline, ready to prepare folders and run.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Validate `config` up front so no stage starts on a bad configuration.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Check the input folder and ready the output and temp folders.
    pub fn prepare(&self, confirm: &dyn Confirm) -> Result<RunState> {
        workspace::prepare(&self.config.locations, confirm)
    }

    fn plan(&self) -> Vec<Stage<'_>> {
        let config = &self.config;
        let mut plan = Vec::with_capacity(StageKind::ORDER.len());
        if let Some(crop) = &config.crop {
            plan.push(Stage::Crop(crop));
        }
        if config.rotate.is_enabled() {
            plan.push(Stage::Rotate(config.rotate));
        }
        if let Some(rename) = &config.rename {
            plan.push(Stage::Rename(rename));
        }
        if let Some(convert) = &config.convert {
            plan.push(Stage::Convert(convert));
        }
        plan
    }

    /// Run every enabled stage, then produce the output folder.
    ///
    /// Each stage completes for all pages before the next one starts. Under
    /// fail-fast the first page error ends the run before materialization.
    #[instrument(skip_all, fields(run = %state.id()))]
    pub async fn run(&self, mut state: RunState) -> Result<RunReport> {
        let started_at = Utc::now();
        let dispatcher = Dispatcher::new(self.config.jobs, self.config.failure_policy);
        let plan = self.plan();
        debug!(
            stages = ?plan.iter().map(Stage::kind).collect::<Vec<_>>(),
            jobs = dispatcher.jobs(),
            "Starting run"
        );

        let mut stages = Vec::with_capacity(plan.len());
        for stage in plan {
            let ctx = StageContext::new(&state);
            let report = self.run_stage(stage, &ctx, &dispatcher).await?;
            debug!(
                stage = %report.stage,
                processed = report.processed,
                carried_over = report.carried_over,
                skipped = report.skipped,
                failed = report.failures.len(),
                "Stage finished"
            );
            stages.push(report);
            state.mark_staged();
        }

        let (materialization, delivered) = materialize(&state, self.config.clean)?;
        let report = RunReport {
            run_id: state.id(),
            started_at,
            finished_at: Utc::now(),
            stages,
            materialization,
            delivered,
        };
        info!(elapsed_ms = report.elapsed_ms(), "Finished");
        Ok(report)
    }

    async fn run_stage(
        &self,
        stage: Stage<'_>,
        ctx: &StageContext,
        dispatcher: &Dispatcher,
    ) -> Result<StageReport> {
        match stage {
            Stage::Crop(settings) => stages::crop::run(ctx, settings, dispatcher).await,
            Stage::Rotate(mode) => stages::rotate::run(ctx, mode, dispatcher).await,
            Stage::Rename(settings) => stages::rename::run(ctx, settings, dispatcher).await,
            Stage::Convert(settings) => stages::convert::run(ctx, settings, dispatcher).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materialize::Materialization;
    use crate::workspace::{AssumeYes, list_pages};
    use bookcrop_core::config::Locations;
    use bookcrop_core::error::BookcropError;
    use bookcrop_core::geometry::CropAnchor;
    use bookcrop_core::types::{FailurePolicy, JpegPolicy};
    use bookcrop_imaging::PageImage;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::fs;
    use std::io;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    fn locations(root: &Path) -> Locations {
        Locations {
            input: root.join("input"),
            output: root.join("output"),
            working: root.join("tmp"),
        }
    }

    fn write_page(dir: &Path, name: &str, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 9]));
        DynamicImage::ImageRgb8(img).save(dir.join(name)).unwrap();
    }

    fn input_with(root: &Path, pages: &[(&str, u32, u32)]) -> Locations {
        let locs = locations(root);
        fs::create_dir(&locs.input).unwrap();
        for (name, width, height) in pages {
            write_page(&locs.input, name, *width, *height);
        }
        locs
    }

    fn config(locations: Locations) -> PipelineConfig {
        PipelineConfig {
            locations,
            jobs: 2,
            ..PipelineConfig::default()
        }
    }

    fn names(dir: &Path) -> Vec<String> {
        list_pages(dir)
            .unwrap()
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    async fn run(config: PipelineConfig) -> Result<RunReport> {
        let pipeline = Pipeline::new(config)?;
        let state = pipeline.prepare(&AssumeYes)?;
        pipeline.run(state).await
    }

    #[test]
    fn plan_follows_enabled_stages() {
        let mut config = config(locations(Path::new("/books")));
        config.rotate = RotateMode::Even;
        config.convert = Some(ConvertSettings::default());
        let pipeline = Pipeline::new(config).unwrap();
        let kinds: Vec<_> = pipeline.plan().iter().map(Stage::kind).collect();
        assert_eq!(kinds, pipeline.config().enabled_stages());
    }

    #[test]
    fn overlapping_locations_are_rejected_before_anything_runs() {
        let mut config = config(locations(Path::new("/books")));
        config.locations.working = config.locations.input.clone();
        let err = Pipeline::new(config).unwrap_err();
        assert!(matches!(err, BookcropError::OverlappingLocations { .. }));
    }

    #[tokio::test]
    async fn crop_and_rename_scenario() {
        let root = tempfile::tempdir().unwrap();
        let locs = input_with(root.path(), &[("scan3.png", 1000, 1500), ("scan4.png", 1000, 1500)]);
        let mut config = config(locs.clone());
        config.crop = Some(CropSettings {
            size: "500x500".parse().unwrap(),
            anchor: CropAnchor::RightTop,
        });
        config.rename = Some(RenameSettings {
            offset: 10,
            pattern: "page_%s".parse().unwrap(),
        });

        let report = run(config).await.unwrap();
        assert_eq!(report.materialization, Materialization::CopyMerge);
        assert_eq!(report.delivered, 2);
        report.ensure_complete().unwrap();

        assert_eq!(names(&locs.output), ["page_13.png", "page_14.png"]);
        let page = PageImage::open(locs.output.join("page_13.png")).unwrap();
        assert_eq!((page.width(), page.height()), (500, 500));
        // Left edge of the rectangle sits at x = 500 of the scan.
        let rgb = page.as_dynamic().to_rgb8();
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([(500 % 256) as u8, 0, 9]));
        // The temp folder is retained without --clean.
        assert_eq!(names(&locs.working), ["page_13.png", "page_14.png"]);
        assert_eq!(names(&locs.input), ["scan3.png", "scan4.png"]);
    }

    /// Log sink shared between the subscriber and the test.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[tokio::test]
    async fn no_stages_is_a_pure_copy() {
        let root = tempfile::tempdir().unwrap();
        let locs = input_with(root.path(), &[("p1.png", 8, 8), ("p2.png", 8, 8)]);

        let logs = Captured::default();
        let sink = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let report = run(config(locs.clone())).await.unwrap();
        let text = logs.text();
        assert!(
            text.lines()
                .any(|line| line.contains("WARN") && line.contains("NO changes were applied to source images")),
            "missing pure-copy warning in:\n{text}"
        );
        assert_eq!(report.materialization, Materialization::PureCopy);
        assert!(report.stages.is_empty());
        assert!(!locs.working.exists());
        for name in ["p1.png", "p2.png"] {
            assert_eq!(
                fs::read(locs.output.join(name)).unwrap(),
                fs::read(locs.input.join(name)).unwrap()
            );
        }
    }

    async fn convert_only(policy: JpegPolicy) -> (tempfile::TempDir, Locations, RunReport) {
        let root = tempfile::tempdir().unwrap();
        let locs = input_with(root.path(), &[("page1.png", 8, 8)]);
        DynamicImage::new_rgb8(8, 8)
            .save_with_format(locs.input.join("page2.jpg"), ImageFormat::Jpeg)
            .unwrap();
        let mut config = config(locs.clone());
        config.convert = Some(ConvertSettings { jpeg_policy: policy });
        let report = run(config).await.unwrap();
        (root, locs, report)
    }

    #[tokio::test]
    async fn convert_only_copies_existing_jpegs_through() {
        let (_root, locs, report) = convert_only(JpegPolicy::CopyThrough).await;
        assert_eq!(names(&locs.output), ["page1.jpg", "page2.jpg"]);
        assert_eq!(
            fs::read(locs.output.join("page2.jpg")).unwrap(),
            fs::read(locs.input.join("page2.jpg")).unwrap()
        );
        assert_eq!(report.stages[0].carried_over, 1);
    }

    #[tokio::test]
    async fn convert_only_with_drop_loses_existing_jpegs() {
        let (_root, locs, report) = convert_only(JpegPolicy::Drop).await;
        assert_eq!(names(&locs.output), ["page1.jpg"]);
        assert_eq!(report.stages[0].skipped, 1);
        assert_eq!(report.delivered, 1);
    }

    #[tokio::test]
    async fn clean_promotes_temp_folder() {
        let root = tempfile::tempdir().unwrap();
        let locs = input_with(root.path(), &[("p1.png", 6, 4), ("p2.png", 6, 4)]);
        let mut config = config(locs.clone());
        config.rotate = RotateMode::Odd;
        config.clean = true;

        let report = run(config).await.unwrap();
        assert_eq!(report.materialization, Materialization::Promote);
        assert!(!locs.working.exists());
        assert_eq!(names(&locs.output), ["p1.png", "p2.png"]);
        assert_eq!(
            fs::read(locs.output.join("p2.png")).unwrap(),
            fs::read(locs.input.join("p2.png")).unwrap()
        );
    }

    #[tokio::test]
    async fn stages_chain_through_the_temp_folder() {
        let root = tempfile::tempdir().unwrap();
        let locs = input_with(root.path(), &[("scan1.png", 40, 30), ("scan2.png", 40, 30)]);
        let mut config = config(locs.clone());
        config.crop = Some(CropSettings {
            size: "20x10".parse().unwrap(),
            anchor: CropAnchor::LeftTop,
        });
        config.rotate = RotateMode::All;
        config.rename = Some(RenameSettings {
            offset: 1,
            pattern: "scan%s".parse().unwrap(),
        });
        config.convert = Some(ConvertSettings::default());

        let report = run(config).await.unwrap();
        let kinds: Vec<_> = report.stages.iter().map(|s| s.stage).collect();
        assert_eq!(kinds, StageKind::ORDER);
        assert_eq!(names(&locs.output), ["scan2.jpg", "scan3.jpg"]);
        assert_eq!(names(&locs.working), ["scan2.jpg", "scan3.jpg"]);
        let page = PageImage::open(locs.output.join("scan2.jpg")).unwrap();
        assert_eq!((page.width(), page.height()), (20, 10));
    }

    fn corrupt_input(root: &Path) -> Locations {
        let locs = input_with(root, &[("scan1.png", 20, 20)]);
        fs::write(locs.input.join("scan2.png"), b"not a png").unwrap();
        locs
    }

    #[tokio::test]
    async fn keep_going_delivers_the_good_pages() {
        let root = tempfile::tempdir().unwrap();
        let locs = corrupt_input(root.path());
        let mut config = config(locs.clone());
        config.rotate = RotateMode::All;
        config.failure_policy = FailurePolicy::KeepGoing;

        let report = run(config).await.unwrap();
        assert!(report.has_failures());
        let failed: Vec<_> = report.failures().map(|(stage, f)| (stage, f.name.clone())).collect();
        assert_eq!(failed, [(StageKind::Rotate, "scan2.png".to_string())]);
        assert_eq!(names(&locs.output), ["scan1.png"]);
        assert!(matches!(
            report.ensure_complete(),
            Err(BookcropError::StageFailed { stage: StageKind::Rotate, failed: 1 })
        ));
    }

    #[tokio::test]
    async fn fail_fast_stops_before_materializing() {
        let root = tempfile::tempdir().unwrap();
        let locs = corrupt_input(root.path());
        let mut config = config(locs.clone());
        config.rotate = RotateMode::All;

        let err = run(config).await.unwrap_err();
        assert!(matches!(err, BookcropError::ImageError(_)));
        assert!(names(&locs.output).is_empty());
    }
}
