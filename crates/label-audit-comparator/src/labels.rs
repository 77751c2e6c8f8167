//! Label file parsing.
//!
//! Each line holds `class_id x_center y_center width height`. Historical
//! exports end every record with a fixed-width tail (trailing digit plus line
//! break) that is dropped before the fields are split, so the parser discards
//! `strip_tail` characters from the raw line, terminator included.

use std::fs;
use std::path::Path;

use label_audit_types::{AuditError, AuditResult, BBox, FrameBoxSet};

pub const DEFAULT_STRIP_TAIL: usize = 2;

const FIELD_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineFormat {
    pub strip_tail: usize,
}

impl Default for LineFormat {
    fn default() -> Self {
        Self {
            strip_tail: DEFAULT_STRIP_TAIL,
        }
    }
}

impl LineFormat {
    pub fn new(strip_tail: usize) -> Self {
        Self { strip_tail }
    }

    /// Parses one raw line, including its terminator if it had one.
    /// `line` is the 1-based line number reported on failure.
    pub fn parse_line(&self, raw: &str, line: usize) -> AuditResult<BBox> {
        let body = strip_chars(raw, self.strip_tail);
        let tokens: Vec<&str> = body.split_whitespace().collect();
        if tokens.len() != FIELD_COUNT {
            return Err(AuditError::parse(
                line,
                format!("expected {FIELD_COUNT} fields, found {}", tokens.len()),
            ));
        }

        let mut values = [0.0f64; FIELD_COUNT];
        for (slot, token) in values.iter_mut().zip(&tokens) {
            let value: f64 = token
                .parse()
                .map_err(|_| AuditError::parse(line, format!("'{token}' is not a number")))?;
            if !value.is_finite() {
                return Err(AuditError::parse(
                    line,
                    format!("'{token}' is not a finite number"),
                ));
            }
            *slot = value;
        }

        let [class, x_center, y_center, width, height] = values;
        if class < 0.0 || class.fract() != 0.0 || class > f64::from(u32::MAX) {
            return Err(AuditError::parse(
                line,
                format!("class id '{}' is not a non-negative integer", tokens[0]),
            ));
        }

        Ok(BBox::new(class as u32, x_center, y_center, width, height))
    }

    /// Parses a whole frame file body. Blank lines are skipped; the result is
    /// sorted in scan order.
    pub fn parse_frame(&self, contents: &str) -> AuditResult<FrameBoxSet> {
        let mut boxes = Vec::new();
        for (index, raw) in contents.split_inclusive('\n').enumerate() {
            if raw.trim().is_empty() {
                continue;
            }
            boxes.push(self.parse_line(raw, index + 1)?);
        }
        Ok(FrameBoxSet::from_unsorted(boxes))
    }

    /// Reads and parses a frame file. A missing file surfaces as
    /// [`AuditError::MissingFrameFile`] so callers can decide to skip it.
    pub fn read_frame(&self, path: &Path) -> AuditResult<FrameBoxSet> {
        let contents = fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                AuditError::MissingFrameFile {
                    path: path.to_path_buf(),
                }
            } else {
                AuditError::io(path, source)
            }
        })?;
        self.parse_frame(&contents).map_err(|err| err.in_file(path))
    }
}

fn strip_chars(raw: &str, count: usize) -> &str {
    if count == 0 {
        return raw;
    }
    match raw.char_indices().rev().nth(count - 1) {
        Some((cut, _)) => &raw[..cut],
        None => "",
    }
}
