// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run configuration.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BookcropError, Result};
use crate::geometry::{CropAnchor, CropSize};
use crate::pattern::RenamePattern;
use crate::types::{FailurePolicy, JpegPolicy, RotateMode, StageKind};

/// The three folders a run works with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locations {
    /// Folder containing the scanned pages. Never modified.
    pub input: PathBuf,
    /// Folder receiving the finished pages.
    pub output: PathBuf,
    /// Scratch folder holding intermediate results between stages.
    pub working: PathBuf,
}

impl Default for Locations {
    fn default() -> Self {
        Self {
            input: PathBuf::from("input"),
            output: PathBuf::from("output"),
            working: PathBuf::from("tmp"),
        }
    }
}

impl Locations {
    /// No folder may equal or contain another: clearing the temp or output
    /// folder must never reach into a sibling.
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("input", &self.input),
            ("output", &self.output),
            ("temp", &self.working),
        ];
        let resolved: Vec<PathBuf> = named.iter().map(|(_, path)| resolve(path)).collect();
        for i in 0..named.len() {
            for j in i + 1..named.len() {
                let (a, b) = (&resolved[i], &resolved[j]);
                if a.starts_with(b) || b.starts_with(a) {
                    return Err(BookcropError::OverlappingLocations {
                        path: named[i].1.to_path_buf(),
                        first: named[i].0,
                        second: named[j].0,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Absolute, normalized form of `path`. The deepest existing ancestor is
/// canonicalized so symlinks are followed; the missing tail is appended.
fn resolve(path: &Path) -> PathBuf {
    let absolute = match std::env::current_dir() {
        Ok(cwd) if path.is_relative() => cwd.join(path),
        _ => path.to_path_buf(),
    };
    let normalized = normalize(&absolute);

    let mut existing = normalized.as_path();
    let mut tail = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            return tail.iter().rev().fold(canonical, |acc, name| acc.join(name));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                existing = parent;
            }
            _ => return normalized,
        }
    }
}

/// Drop `.` and fold `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropSettings {
    pub size: CropSize,
    #[serde(default)]
    pub anchor: CropAnchor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameSettings {
    /// Added to every embedded page index.
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub pattern: RenamePattern,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertSettings {
    #[serde(default)]
    pub jpeg_policy: JpegPolicy,
}

/// Everything one pipeline run needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub locations: Locations,
    /// Crop every page to a fixed rectangle.
    #[serde(default)]
    pub crop: Option<CropSettings>,
    #[serde(default)]
    pub rotate: RotateMode,
    /// Rename pages from their embedded index.
    #[serde(default)]
    pub rename: Option<RenameSettings>,
    /// Convert pages to JPEG.
    #[serde(default)]
    pub convert: Option<ConvertSettings>,
    /// Promote the temp folder to the output folder instead of copying.
    #[serde(default)]
    pub clean: bool,
    /// Upper bound on pages processed at the same time.
    #[serde(default = "default_jobs")]
    pub jobs: usize,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

/// One worker per available core.
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            locations: Locations::default(),
            crop: None,
            rotate: RotateMode::None,
            rename: None,
            convert: None,
            clean: false,
            jobs: default_jobs(),
            failure_policy: FailurePolicy::FailFast,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.jobs == 0 {
            return Err(BookcropError::InvalidJobs);
        }
        self.locations.validate()
    }

    /// Stages this configuration enables, in pipeline order.
    pub fn enabled_stages(&self) -> Vec<StageKind> {
        StageKind::ORDER
            .into_iter()
            .filter(|stage| match stage {
                StageKind::Crop => self.crop.is_some(),
                StageKind::Rotate => self.rotate.is_enabled(),
                StageKind::Rename => self.rename.is_some(),
                StageKind::Convert => self.convert.is_some(),
            })
            .collect()
    }
}
