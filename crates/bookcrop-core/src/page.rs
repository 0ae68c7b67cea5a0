// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page file references and the page index embedded in their names.

use std::path::{Path, PathBuf};

use crate::error::{BookcropError, Result};
use crate::types::Parity;

/// Extensions treated as already being JPEG.
const JPEG_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "jpe", "jfif"];

/// A scanned page: a file name inside a directory.
///
/// Identity is the path; the page index is derived from the name on demand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageFile {
    dir: PathBuf,
    name: String,
}

impl PageFile {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            name: name.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full file name including the extension.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.name)
    }

    /// The same file name inside another directory.
    pub fn in_dir(&self, dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, self.name.clone())
    }

    /// File name without its final extension. Leading-dot names such as
    /// `.scan1` have no extension.
    pub fn stem(&self) -> &str {
        split_name(&self.name).0
    }

    /// Final extension including the dot (`.png`), or an empty string.
    pub fn extension(&self) -> &str {
        split_name(&self.name).1
    }

    pub fn is_jpeg(&self) -> bool {
        let ext = self.extension().trim_start_matches('.');
        JPEG_EXTENSIONS
            .iter()
            .any(|candidate| ext.eq_ignore_ascii_case(candidate))
    }

    /// Integer formed by concatenating every digit of the stem; 0 when the
    /// stem has no digits.
    pub fn embedded_index(&self) -> Result<u64> {
        embedded_index(self.stem())
    }

    /// Parity of the embedded index, read from the last digit of the stem.
    pub fn parity(&self) -> Parity {
        embedded_parity(self.stem())
    }
}

impl std::fmt::Display for PageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path().display())
    }
}

/// Split a file name into stem and extension the way page names are usually
/// written: the extension starts at the last dot that is not the first
/// character.
fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) if pos > 0 && !name[..pos].chars().all(|c| c == '.') => name.split_at(pos),
        _ => (name, ""),
    }
}

/// Digits of `stem` concatenated and parsed; 0 when there are none.
pub fn embedded_index(stem: &str) -> Result<u64> {
    let digits: String = stem.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Ok(0);
    }
    digits
        .parse()
        .map_err(|_| BookcropError::IndexOverflow(stem.to_string()))
}

/// Parity of the embedded index of `stem`; no digits counts as index 0.
pub fn embedded_parity(stem: &str) -> Parity {
    match stem.chars().rev().find(|c| c.is_ascii_digit()) {
        Some(last) if (last as u8 - b'0') % 2 == 1 => Parity::Odd,
        _ => Parity::Even,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn splits_stem_and_extension() {
        let page = PageFile::new("input", "scan3.png");
        assert_eq!(page.stem(), "scan3");
        assert_eq!(page.extension(), ".png");

        let archive = PageFile::new("input", "book.part2.tiff");
        assert_eq!(archive.stem(), "book.part2");
        assert_eq!(archive.extension(), ".tiff");

        let bare = PageFile::new("input", "README");
        assert_eq!(bare.stem(), "README");
        assert_eq!(bare.extension(), "");

        let hidden = PageFile::new("input", ".scan1");
        assert_eq!(hidden.stem(), ".scan1");
        assert_eq!(hidden.extension(), "");
    }

    #[test]
    fn embedded_index_concatenates_digits() {
        assert_eq!(embedded_index("scan3").unwrap(), 3);
        assert_eq!(embedded_index("vol2_page014").unwrap(), 2014);
        assert_eq!(embedded_index("cover").unwrap(), 0);
        assert_eq!(embedded_index("").unwrap(), 0);
    }

    #[test]
    fn extension_digits_do_not_count() {
        let page = PageFile::new("input", "page7.jp2");
        assert_eq!(page.embedded_index().unwrap(), 7);
        assert_eq!(page.parity(), Parity::Odd);
    }

    #[test]
    fn huge_index_overflows_cleanly() {
        let stem = "p".to_string() + &"9".repeat(30);
        assert!(matches!(
            embedded_index(&stem),
            Err(BookcropError::IndexOverflow(_))
        ));
        // Parity stays available even when the index does not fit.
        assert_eq!(embedded_parity(&stem), Parity::Odd);
    }

    #[test]
    fn jpeg_family_is_case_insensitive() {
        assert!(PageFile::new("d", "a.jpg").is_jpeg());
        assert!(PageFile::new("d", "a.JPEG").is_jpeg());
        assert!(PageFile::new("d", "a.jfif").is_jpeg());
        assert!(!PageFile::new("d", "a.png").is_jpeg());
        assert!(!PageFile::new("d", "jpg").is_jpeg());
    }

    #[test]
    fn in_dir_keeps_the_name() {
        let page = PageFile::new("input", "scan4.png");
        let moved = page.in_dir("tmp");
        assert_eq!(moved.name(), "scan4.png");
        assert_eq!(moved.path(), PathBuf::from("tmp").join("scan4.png"));
    }

    proptest! {
        #[test]
        fn parity_matches_index_when_it_fits(stem in "[a-z_]{0,4}[0-9]{0,12}[a-z]{0,3}") {
            let index = embedded_index(&stem).unwrap();
            let expected = if index % 2 == 0 { Parity::Even } else { Parity::Odd };
            prop_assert_eq!(embedded_parity(&stem), expected);
        }
    }
}
