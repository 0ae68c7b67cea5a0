// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Book Cropper.

use std::path::PathBuf;

use thiserror::Error;

use crate::geometry::CropRect;
use crate::types::StageKind;

/// Top-level error type for all Book Cropper operations.
#[derive(Debug, Error)]
pub enum BookcropError {
    // -- Configuration errors --
    #[error("input folder \"{}\" does not exist", .0.display())]
    InputMissing(PathBuf),

    #[error("input folder \"{}\" is EMPTY", .0.display())]
    InputEmpty(PathBuf),

    #[error("invalid crop size \"{0}\": expected WidthxHeight, e.g. 1080x1920")]
    InvalidCropSize(String),

    #[error("unsupported crop position \"{0}\": try lt, lb, rt, rb")]
    InvalidCropAnchor(String),

    #[error("unsupported rotate mode {0}: 0 - no, 1 - all, 2 - even, 3 - odd")]
    InvalidRotateMode(u8),

    #[error("invalid rename pattern \"{pattern}\": {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("{first} and {second} folders must not overlap: \"{}\" is or contains the other", .path.display())]
    OverlappingLocations {
        path: PathBuf,
        first: &'static str,
        second: &'static str,
    },

    #[error("worker count must be at least 1")]
    InvalidJobs,

    // -- Geometry --
    #[error("crop rectangle {rect} does not fit {file} ({width}x{height})")]
    CropOutOfBounds {
        file: String,
        rect: CropRect,
        width: u32,
        height: u32,
    },

    // -- Processing errors --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("embedded page index of \"{0}\" does not fit in 64 bits")]
    IndexOverflow(String),

    #[error("{stage} would write \"{target}\" for both \"{first}\" and \"{second}\"")]
    NameCollision {
        stage: StageKind,
        target: String,
        first: String,
        second: String,
    },

    #[error("{stage} stage failed for {failed} file(s)")]
    StageFailed { stage: StageKind, failed: usize },

    #[error("worker task failed: {0}")]
    Task(String),

    // -- Flow --
    #[error("clearing folder \"{}\" was declined", .0.display())]
    Declined(PathBuf),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BookcropError {
    /// Errors caused by what the user asked for rather than by the files
    /// being processed. These are detected before any stage runs.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InputMissing(_)
                | Self::InputEmpty(_)
                | Self::InvalidCropSize(_)
                | Self::InvalidCropAnchor(_)
                | Self::InvalidRotateMode(_)
                | Self::InvalidPattern { .. }
                | Self::OverlappingLocations { .. }
                | Self::InvalidJobs
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BookcropError>;
