// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line flags and their translation into a `PipelineConfig`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use bookcrop_core::config::{ConvertSettings, CropSettings, Locations, PipelineConfig, RenameSettings};
use bookcrop_core::error::Result;
use bookcrop_core::types::{FailurePolicy, JpegPolicy, RotateMode};

/// What to do with pages that are already JPEG when converting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum JpegPolicyArg {
    /// Carry them to the output unchanged (default)
    CopyThrough,
    /// Leave them out of the output
    Drop,
}

impl From<JpegPolicyArg> for JpegPolicy {
    fn from(arg: JpegPolicyArg) -> Self {
        match arg {
            JpegPolicyArg::CopyThrough => JpegPolicy::CopyThrough,
            JpegPolicyArg::Drop => JpegPolicy::Drop,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "bookcrop")]
#[command(about = "Batch crop, rotate, rename and convert scanned book pages", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Folder containing input images
    #[arg(short, long, default_value = "input")]
    pub input: PathBuf,

    /// Folder to save processed images
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Temporary storage folder
    #[arg(long = "temp-folder", visible_alias = "tf", default_value = "tmp")]
    pub temp_folder: PathBuf,

    /// Crop input images
    #[arg(short, long)]
    pub crop: bool,

    /// Crop size in WidthxHeight
    #[arg(long = "crop-size", visible_alias = "cs", default_value = "1080x1920")]
    pub crop_size: String,

    /// Corner the crop is measured from (lefttop, leftbottom, righttop,
    /// rightbottom, lt, lb, rt, rb)
    #[arg(long = "crop-position", visible_alias = "cp", default_value = "lt")]
    pub crop_position: String,

    /// Rotate pages 180°. 0 - no, 1 - all, 2 - even, 3 - odd
    #[arg(long = "rotate", visible_alias = "rt", default_value_t = 0)]
    pub rotate: u8,

    /// Convert images to JPEG format
    #[arg(short = 'j', long = "convert-jpeg")]
    pub convert_jpeg: bool,

    /// What to do with pages that are already JPEG when converting
    #[arg(long = "jpeg-policy", value_enum, default_value = "copy-through")]
    pub jpeg_policy: JpegPolicyArg,

    /// Rename output files according to the --rename-pattern value
    #[arg(short, long)]
    pub rename: bool,

    /// Rename index offset
    #[arg(
        long = "rename-index",
        visible_alias = "ri",
        default_value_t = 0,
        allow_negative_numbers = true
    )]
    pub rename_index: i64,

    /// Rename pattern. Use %s to set the index position; do not add the file
    /// extension
    #[arg(long = "rename-pattern", visible_alias = "rp", default_value = "page_%s")]
    pub rename_pattern: String,

    /// Increase logging verbosity
    #[arg(short, long)]
    pub debug: bool,

    /// Show time marks in logs
    #[arg(short, long = "time-marks")]
    pub time_marks: bool,

    /// Move the temp folder to the output instead of copying it
    #[arg(long = "clean", visible_alias = "cl")]
    pub clean: bool,

    /// Pages processed at the same time (defaults to the number of cores)
    #[arg(long)]
    pub jobs: Option<usize>,

    /// Keep processing the remaining pages when one fails
    #[arg(long = "keep-going")]
    pub keep_going: bool,

    /// Clear non-empty output and temp folders without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Load the whole pipeline configuration from a JSON file instead of flags
    #[arg(long, env = "BOOKCROP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the resolved configuration as JSON and exit
    #[arg(long = "print-config")]
    pub print_config: bool,

    /// Write the run report as JSON to this file
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl Cli {
    /// Resolve the flags into a validated pipeline configuration.
    ///
    /// With `--config`, the file provides everything except `--jobs` and
    /// `--keep-going`, which still override it when given.
    pub fn to_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => self.flags_to_config()?,
        };
        if let Some(jobs) = self.jobs {
            config.jobs = jobs;
        }
        if self.keep_going {
            config.failure_policy = FailurePolicy::KeepGoing;
        }
        config.validate()?;
        Ok(config)
    }

    fn flags_to_config(&self) -> Result<PipelineConfig> {
        let crop = if self.crop {
            Some(CropSettings {
                size: self.crop_size.parse()?,
                anchor: self.crop_position.parse()?,
            })
        } else {
            None
        };
        let rename = if self.rename {
            Some(RenameSettings {
                offset: self.rename_index,
                pattern: self.rename_pattern.parse()?,
            })
        } else {
            None
        };
        let convert = self.convert_jpeg.then(|| ConvertSettings {
            jpeg_policy: self.jpeg_policy.into(),
        });

        Ok(PipelineConfig {
            locations: Locations {
                input: self.input.clone(),
                output: self.output.clone(),
                working: self.temp_folder.clone(),
            },
            crop,
            rotate: RotateMode::try_from(self.rotate)?,
            rename,
            convert,
            clean: self.clean,
            ..PipelineConfig::default()
        })
    }
}
