// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Crop geometry — requested size, anchor corner, and the resolved rectangle
// that is applied to every page of a run.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BookcropError, Result};

/// Requested crop size in pixels, written `WidthxHeight` on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CropSize {
    pub width: u32,
    pub height: u32,
}

impl FromStr for CropSize {
    type Err = BookcropError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || BookcropError::InvalidCropSize(s.to_string());
        let lower = s.trim().to_ascii_lowercase();
        let (w, h) = lower.split_once('x').ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

impl TryFrom<String> for CropSize {
    type Error = BookcropError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CropSize> for String {
    fn from(size: CropSize) -> Self {
        size.to_string()
    }
}

impl std::fmt::Display for CropSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Corner from which the crop size is measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CropAnchor {
    #[default]
    LeftTop,
    LeftBottom,
    RightTop,
    RightBottom,
}

impl CropAnchor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeftTop => "lt",
            Self::LeftBottom => "lb",
            Self::RightTop => "rt",
            Self::RightBottom => "rb",
        }
    }

    /// Anchors touching the right or bottom edge need the page dimensions.
    pub fn needs_probe(&self) -> bool {
        !matches!(self, Self::LeftTop)
    }
}

impl FromStr for CropAnchor {
    type Err = BookcropError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lt" | "lefttop" => Ok(Self::LeftTop),
            "lb" | "leftbottom" => Ok(Self::LeftBottom),
            "rt" | "righttop" => Ok(Self::RightTop),
            "rb" | "rightbottom" => Ok(Self::RightBottom),
            _ => Err(BookcropError::InvalidCropAnchor(s.to_string())),
        }
    }
}

impl TryFrom<String> for CropAnchor {
    type Error = BookcropError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CropAnchor> for String {
    fn from(anchor: CropAnchor) -> Self {
        anchor.as_str().to_string()
    }
}

impl std::fmt::Display for CropAnchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Crop rectangle as (left, top, right, bottom) pixel edges; right and bottom
/// are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropRect {
    /// Resolve the rectangle for a run.
    ///
    /// `probe` holds the name and pixel dimensions of the reference page. It
    /// is only consulted for anchors on the right or bottom edge; passing
    /// `None` for those anchors is a caller bug reported as an image error.
    pub fn resolve(
        size: CropSize,
        anchor: CropAnchor,
        probe: Option<(&str, u32, u32)>,
    ) -> Result<Self> {
        if !anchor.needs_probe() {
            return Ok(Self {
                left: 0,
                top: 0,
                right: size.width,
                bottom: size.height,
            });
        }

        let (name, width, height) = probe.ok_or_else(|| {
            BookcropError::ImageError(format!("crop anchor {anchor} needs a reference page"))
        })?;

        let out_of_bounds = |rect: CropRect| BookcropError::CropOutOfBounds {
            file: name.to_string(),
            rect,
            width,
            height,
        };
        let requested = Self {
            left: 0,
            top: 0,
            right: size.width,
            bottom: size.height,
        };
        let x = width
            .checked_sub(size.width)
            .ok_or_else(|| out_of_bounds(requested))?;
        let y = height
            .checked_sub(size.height)
            .ok_or_else(|| out_of_bounds(requested))?;

        let (left, top, right, bottom) = match anchor {
            CropAnchor::LeftTop => (0, 0, size.width, size.height),
            CropAnchor::LeftBottom => (0, y, size.width, height),
            CropAnchor::RightTop => (x, 0, width, size.height),
            CropAnchor::RightBottom => (x, y, width, height),
        };
        Ok(Self {
            left,
            top,
            right,
            bottom,
        })
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    /// Whether the rectangle lies entirely inside a `width` x `height` image.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        self.right <= width && self.bottom <= height
    }
}

impl std::fmt::Display for CropRect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.left, self.top, self.right, self.bottom
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_crop_size_case_insensitively() {
        let size: CropSize = "500X700".parse().unwrap();
        assert_eq!(size, CropSize { width: 500, height: 700 });
        assert_eq!(size.to_string(), "500x700");
    }

    #[test]
    fn rejects_malformed_crop_sizes() {
        for bad in ["500", "x500", "500x", "axb", "0x10", "-5x10"] {
            assert!(
                matches!(bad.parse::<CropSize>(), Err(BookcropError::InvalidCropSize(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn anchors_accept_short_and_long_forms() {
        assert_eq!("lt".parse::<CropAnchor>().unwrap(), CropAnchor::LeftTop);
        assert_eq!("LeftBottom".parse::<CropAnchor>().unwrap(), CropAnchor::LeftBottom);
        assert_eq!("righttop".parse::<CropAnchor>().unwrap(), CropAnchor::RightTop);
        assert_eq!("RB".parse::<CropAnchor>().unwrap(), CropAnchor::RightBottom);
        assert!(matches!(
            "tb".parse::<CropAnchor>(),
            Err(BookcropError::InvalidCropAnchor(_))
        ));
    }

    #[test]
    fn left_top_does_not_need_a_probe() {
        let size = CropSize { width: 300, height: 200 };
        let rect = CropRect::resolve(size, CropAnchor::LeftTop, None).unwrap();
        assert_eq!(rect, CropRect { left: 0, top: 0, right: 300, bottom: 200 });
    }

    #[test]
    fn right_top_anchors_to_probe_width() {
        let size = CropSize { width: 500, height: 500 };
        let rect =
            CropRect::resolve(size, CropAnchor::RightTop, Some(("scan3.png", 1000, 1500))).unwrap();
        assert_eq!(rect, CropRect { left: 500, top: 0, right: 1000, bottom: 500 });
        assert_eq!(rect.width(), 500);
        assert_eq!(rect.height(), 500);
    }

    #[test]
    fn bottom_anchors_use_probe_height() {
        let size = CropSize { width: 400, height: 300 };
        let probe = Some(("p.png", 1000, 1500));
        assert_eq!(
            CropRect::resolve(size, CropAnchor::LeftBottom, probe).unwrap(),
            CropRect { left: 0, top: 1200, right: 400, bottom: 1500 }
        );
        assert_eq!(
            CropRect::resolve(size, CropAnchor::RightBottom, probe).unwrap(),
            CropRect { left: 600, top: 1200, right: 1000, bottom: 1500 }
        );
    }

    #[test]
    fn oversized_crop_is_rejected_at_resolution() {
        let size = CropSize { width: 2000, height: 100 };
        let err = CropRect::resolve(size, CropAnchor::RightTop, Some(("p.png", 1000, 1500)))
            .unwrap_err();
        assert!(matches!(err, BookcropError::CropOutOfBounds { width: 1000, .. }));
    }

    #[test]
    fn fits_checks_both_edges() {
        let rect = CropRect { left: 500, top: 0, right: 1000, bottom: 500 };
        assert!(rect.fits(1000, 500));
        assert!(!rect.fits(999, 500));
        assert!(!rect.fits(1000, 499));
    }

    #[test]
    fn anchor_serializes_as_short_form() {
        let json = serde_json::to_string(&CropAnchor::RightBottom).unwrap();
        assert_eq!(json, "\"rb\"");
        let back: CropAnchor = serde_json::from_str("\"leftbottom\"").unwrap();
        assert_eq!(back, CropAnchor::LeftBottom);
    }
}
