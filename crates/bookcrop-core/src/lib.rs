// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Book Cropper — Core types, configuration and error definitions shared across
// all crates.

pub mod config;
pub mod error;
pub mod geometry;
pub mod page;
pub mod pattern;
pub mod types;

pub use config::{ConvertSettings, CropSettings, Locations, PipelineConfig, RenameSettings};
pub use error::{BookcropError, Result};
pub use geometry::{CropAnchor, CropRect, CropSize};
pub use page::PageFile;
pub use pattern::RenamePattern;
pub use types::*;
