// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page image — crop, half-turn rotation and RGB conversion of a single scanned
// page. Operates on in-memory images using the `image` crate.

use std::path::Path;

use bookcrop_core::error::{BookcropError, Result};
use bookcrop_core::geometry::CropRect;
use image::DynamicImage;
use tracing::{debug, instrument};

/// A decoded page image.
///
/// Transformations consume `self` and return a new `PageImage`, enabling
/// method chaining.
///
/// ```ignore
/// PageImage::open("input/scan3.png")?
///     .crop(rect, "scan3.png")?
///     .rotate_half_turn()
///     .save("tmp/scan3.png")?;
/// ```
pub struct PageImage {
    image: DynamicImage,
}

impl PageImage {
    // -- Construction ---------------------------------------------------------

    /// Decode an image from a file path.
    #[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|err| {
            BookcropError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        debug!(width = img.width(), height = img.height(), "Page loaded");
        Ok(Self { image: img })
    }

    /// Read the pixel dimensions from the file header without decoding the
    /// whole image.
    pub fn probe_dimensions(path: impl AsRef<Path>) -> Result<(u32, u32)> {
        image::image_dimensions(path.as_ref()).map_err(|err| {
            BookcropError::ImageError(format!(
                "failed to read dimensions of {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Clip the page to `rect`. `name` identifies the page in the error.
    ///
    /// Unlike a clamping crop, a rectangle reaching past the page edge is an
    /// error: every page of a run must come out the same size.
    pub fn crop(self, rect: CropRect, name: &str) -> Result<Self> {
        let (width, height) = (self.width(), self.height());
        if !rect.fits(width, height) {
            return Err(BookcropError::CropOutOfBounds {
                file: name.to_string(),
                rect,
                width,
                height,
            });
        }
        debug!(%rect, "Cropping page");
        let cropped = self
            .image
            .crop_imm(rect.left, rect.top, rect.width(), rect.height());
        Ok(Self { image: cropped })
    }

    /// Turn the page upside down. Lossless; applying it twice restores the
    /// original pixels.
    pub fn rotate_half_turn(self) -> Self {
        Self {
            image: self.image.rotate180(),
        }
    }

    /// Convert to 8-bit, 3-channel RGB, dropping any alpha channel.
    pub fn to_rgb(self) -> Self {
        Self {
            image: DynamicImage::ImageRgb8(self.image.to_rgb8()),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Write the page to a file. The format is inferred from the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.image.save(path.as_ref()).map_err(|err| {
            BookcropError::ImageError(format!(
                "failed to save image to {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }
}
