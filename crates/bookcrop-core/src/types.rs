// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Book Cropper pipeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BookcropError;

/// Unique identifier for a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The transformations a run can apply, in the order they always run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Crop,
    Rotate,
    Rename,
    Convert,
}

impl StageKind {
    /// Fixed pipeline order.
    pub const ORDER: [StageKind; 4] = [Self::Crop, Self::Rotate, Self::Rename, Self::Convert];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crop => "crop",
            Self::Rotate => "rotate",
            Self::Rename => "rename",
            Self::Convert => "convert",
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parity of a page's embedded index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parity {
    Even,
    Odd,
}

/// Which pages get turned upside down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotateMode {
    /// Rotation stage disabled.
    #[default]
    None,
    /// Rotate every page.
    All,
    /// Rotate pages whose embedded index is even.
    Even,
    /// Rotate pages whose embedded index is odd.
    Odd,
}

impl RotateMode {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Parity selected for rotation, or `None` when every page rotates.
    pub fn selected_parity(&self) -> Option<Parity> {
        match self {
            Self::Even => Some(Parity::Even),
            Self::Odd => Some(Parity::Odd),
            Self::None | Self::All => None,
        }
    }
}

/// Numeric command-line codes: 0 - no, 1 - all, 2 - even, 3 - odd.
impl TryFrom<u8> for RotateMode {
    type Error = BookcropError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::All),
            2 => Ok(Self::Even),
            3 => Ok(Self::Odd),
            other => Err(BookcropError::InvalidRotateMode(other)),
        }
    }
}

/// What the convert stage does with files that are already JPEG.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JpegPolicy {
    /// Carry the file forward unchanged so later steps see a complete set.
    #[default]
    CopyThrough,
    /// Leave the file behind. On a first-stage convert it produces no output.
    Drop,
}

/// How a stage reacts to a file that cannot be processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// The first failing file aborts the run.
    #[default]
    FailFast,
    /// Record the failure, finish the remaining files, report at the end.
    KeepGoing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_codes_map_to_modes() {
        assert_eq!(RotateMode::try_from(0).unwrap(), RotateMode::None);
        assert_eq!(RotateMode::try_from(1).unwrap(), RotateMode::All);
        assert_eq!(RotateMode::try_from(2).unwrap(), RotateMode::Even);
        assert_eq!(RotateMode::try_from(3).unwrap(), RotateMode::Odd);
        assert!(matches!(
            RotateMode::try_from(4),
            Err(BookcropError::InvalidRotateMode(4))
        ));
    }

    #[test]
    fn only_partition_modes_select_a_parity() {
        assert_eq!(RotateMode::All.selected_parity(), None);
        assert_eq!(RotateMode::Even.selected_parity(), Some(Parity::Even));
        assert_eq!(RotateMode::Odd.selected_parity(), Some(Parity::Odd));
        assert!(!RotateMode::None.is_enabled());
    }

    #[test]
    fn stage_order_is_fixed() {
        assert_eq!(
            StageKind::ORDER,
            [StageKind::Crop, StageKind::Rotate, StageKind::Rename, StageKind::Convert]
        );
        assert!(StageKind::Crop < StageKind::Convert);
    }

    #[test]
    fn policies_serialize_kebab_case() {
        assert_eq!(
            serde_json::to_string(&JpegPolicy::CopyThrough).unwrap(),
            "\"copy-through\""
        );
        assert_eq!(
            serde_json::to_string(&FailurePolicy::KeepGoing).unwrap(),
            "\"keep-going\""
        );
    }
}
