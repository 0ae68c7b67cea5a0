// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// printf-style rename patterns with exactly one index placeholder.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BookcropError, Result};

/// How the page index is rendered into the pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placeholder {
    /// `%s` or `%d`; `%s` ignores the zero flag.
    numeric: bool,
    zero_pad: bool,
    width: usize,
}

/// A rename pattern such as `page_%s` or `scan-%04d`.
///
/// Supported conversions are `%s`, `%d` and `%i`, optionally with a `0` flag
/// and a width. `%%` is a literal percent sign. The pattern must contain
/// exactly one placeholder and no path separators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RenamePattern {
    source: String,
    prefix: String,
    placeholder: Placeholder,
    suffix: String,
}

impl RenamePattern {
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Render the pattern for one page index. The extension is not included.
    pub fn format(&self, index: i128) -> String {
        let Placeholder {
            numeric,
            zero_pad,
            width,
        } = self.placeholder;
        let rendered = if numeric && zero_pad {
            format!("{index:0width$}")
        } else {
            format!("{index:>width$}")
        };
        format!("{}{}{}", self.prefix, rendered, self.suffix)
    }
}

impl FromStr for RenamePattern {
    type Err = BookcropError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| BookcropError::InvalidPattern {
            pattern: s.to_string(),
            reason: reason.to_string(),
        };

        if s.contains(['/', '\\']) {
            return Err(invalid("must not contain path separators"));
        }

        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut placeholder = None;
        let mut chars = s.chars().peekable();

        while let Some(c) = chars.next() {
            let target = if placeholder.is_some() {
                &mut suffix
            } else {
                &mut prefix
            };
            if c != '%' {
                target.push(c);
                continue;
            }
            if chars.peek() == Some(&'%') {
                chars.next();
                target.push('%');
                continue;
            }

            let zero_pad = chars.next_if_eq(&'0').is_some();
            let mut width = String::new();
            while let Some(digit) = chars.next_if(|d| d.is_ascii_digit()) {
                width.push(digit);
            }
            let numeric = match chars.next() {
                Some('s') => false,
                Some('d' | 'i') => true,
                Some(_) => return Err(invalid("unsupported conversion, use %s or %d")),
                None => return Err(invalid("dangling %")),
            };
            if placeholder.is_some() {
                return Err(invalid("more than one index placeholder"));
            }
            let width = if width.is_empty() {
                0
            } else {
                width.parse().map_err(|_| invalid("placeholder width too large"))?
            };
            placeholder = Some(Placeholder {
                numeric,
                zero_pad,
                width,
            });
        }

        let placeholder = placeholder.ok_or_else(|| invalid("missing %s index placeholder"))?;
        Ok(Self {
            source: s.to_string(),
            prefix,
            placeholder,
            suffix,
        })
    }
}

impl TryFrom<String> for RenamePattern {
    type Error = BookcropError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<RenamePattern> for String {
    fn from(pattern: RenamePattern) -> Self {
        pattern.source
    }
}

impl Default for RenamePattern {
    fn default() -> Self {
        Self {
            source: "page_%s".to_string(),
            prefix: "page_".to_string(),
            placeholder: Placeholder {
                numeric: false,
                zero_pad: false,
                width: 0,
            },
            suffix: String::new(),
        }
    }
}

impl std::fmt::Display for RenamePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}
