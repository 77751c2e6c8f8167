//! Shared domain models for the label-audit workspace.
//!
//! This crate centralizes the lightweight data structures used by the
//! comparator and CLI crates: parsed boxes, per-frame box sets, the rate table,
//! thresholds, frame windows and the final tally. Keep it free of I/O so every
//! crate can depend on it cheaply.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

pub type AuditResult<T> = Result<T, AuditError>;

/// One annotated object on one frame. Geometry is expressed as fractions of
/// the frame dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BBox {
    pub class_id: u32,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

impl BBox {
    pub fn new(class_id: u32, x_center: f64, y_center: f64, width: f64, height: f64) -> Self {
        Self {
            class_id,
            x_center,
            y_center,
            width,
            height,
        }
    }

    fn scan_order(&self, other: &Self) -> Ordering {
        self.x_center
            .total_cmp(&other.x_center)
            .then_with(|| self.y_center.total_cmp(&other.y_center))
    }
}

/// Boxes of a single frame, kept sorted by `(x_center, y_center)`.
///
/// The order is the only tie-break used when scanning for matches, so it is
/// established once at construction and never changes afterwards. The sort is
/// stable: boxes sharing a center keep their file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameBoxSet {
    boxes: Vec<BBox>,
}

impl FrameBoxSet {
    pub fn from_unsorted(mut boxes: Vec<BBox>) -> Self {
        boxes.sort_by(BBox::scan_order);
        Self { boxes }
    }

    pub fn empty() -> Self {
        Self { boxes: Vec::new() }
    }

    pub fn boxes(&self) -> &[BBox] {
        &self.boxes
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BBox> {
        self.boxes.iter()
    }
}

impl FromIterator<BBox> for FrameBoxSet {
    fn from_iter<I: IntoIterator<Item = BBox>>(iter: I) -> Self {
        Self::from_unsorted(iter.into_iter().collect())
    }
}

/// Monetary rates per chargeable event. Unchanged boxes are free and a
/// class-only relabel is billed at the diff rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateTable {
    pub cost_diff_box: f64,
    pub cost_diff_box_increased: f64,
    pub cost_new_box: f64,
    pub cost_new_box_increased: f64,
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            cost_diff_box: 0.4,
            cost_diff_box_increased: 0.6,
            cost_new_box: 0.8,
            cost_new_box_increased: 1.0,
        }
    }
}

impl RateTable {
    pub fn validate(&self) -> AuditResult<()> {
        let rates = [
            ("cost_diff_box", self.cost_diff_box),
            ("cost_diff_box_increased", self.cost_diff_box_increased),
            ("cost_new_box", self.cost_new_box),
            ("cost_new_box_increased", self.cost_new_box_increased),
        ];
        for (name, value) in rates {
            if !value.is_finite() {
                return Err(AuditError::configuration(format!(
                    "{name} must be a finite number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Partition of the difference metric: below `low` a box is unchanged,
/// strictly between the two it changed, at or above `high` it is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    pub low: f64,
    pub high: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            low: 0.1,
            high: 0.7,
        }
    }
}

impl Thresholds {
    pub fn new(low: f64, high: f64) -> AuditResult<Self> {
        let thresholds = Self { low, high };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> AuditResult<()> {
        for (name, value) in [
            ("box_change_low_threshold", self.low),
            ("box_change_high_threshold", self.high),
        ] {
            if !(0.0..1.0).contains(&value) {
                return Err(AuditError::configuration(format!(
                    "{name} must be within [0, 1), got {value}"
                )));
            }
        }
        if self.low > self.high {
            return Err(AuditError::configuration(format!(
                "box_change_low_threshold ({}) exceeds box_change_high_threshold ({})",
                self.low, self.high
            )));
        }
        Ok(())
    }
}

/// Contiguous slice of the sorted frame files selected for evaluation.
/// `to` is exclusive; `None` runs to the end of the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameWindow {
    pub from: usize,
    pub to: Option<usize>,
}

impl FrameWindow {
    pub fn all() -> Self {
        Self::default()
    }

    /// Builds a window from the raw configuration values, where `-1` as the
    /// upper bound means "to the end".
    pub fn from_bounds(frames_from: i64, frames_to: i64) -> AuditResult<Self> {
        let from = usize::try_from(frames_from).map_err(|_| {
            AuditError::configuration(format!("frames_from must be >= 0, got {frames_from}"))
        })?;
        let to = match frames_to {
            -1 => None,
            value => Some(usize::try_from(value).map_err(|_| {
                AuditError::configuration(format!(
                    "frames_to must be >= 0 or -1, got {frames_to}"
                ))
            })?),
        };
        if let Some(to) = to {
            if from > to {
                return Err(AuditError::configuration(format!(
                    "frames_from ({from}) exceeds frames_to ({to})"
                )));
            }
        }
        Ok(Self { from, to })
    }

    /// Applies the window to a sorted sequence, clamping both bounds to its
    /// length.
    pub fn select<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let end = self.to.map_or(items.len(), |to| to.min(items.len()));
        let start = self.from.min(end);
        &items[start..end]
    }
}

/// Inclusive range of positions inside the selected window where the
/// increased rates apply.
///
/// Positions are compared against both bounds as given: a `to` of `-1`
/// disables the window, while a `from` of `-1` leaves it open from position 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BonusWindow {
    pub from: i64,
    pub to: i64,
}

impl Default for BonusWindow {
    fn default() -> Self {
        Self::disabled()
    }
}

impl BonusWindow {
    pub fn new(from: i64, to: i64) -> Self {
        Self { from, to }
    }

    pub fn disabled() -> Self {
        Self { from: -1, to: -1 }
    }

    pub fn contains(&self, position: usize) -> bool {
        let Ok(position) = i64::try_from(position) else {
            return false;
        };
        self.from <= position && position <= self.to
    }
}

/// Final tally of an audit run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ReconciliationResult {
    pub total_cost: f64,
    pub new_box_count: u64,
    pub deleted_box_count: u64,
    pub class_only_diff_count: u64,
    pub geometry_diff_count: u64,
}

impl ReconciliationResult {
    pub fn into_tuple(self) -> (f64, u64, u64, u64, u64) {
        (
            self.total_cost,
            self.new_box_count,
            self.deleted_box_count,
            self.class_only_diff_count,
            self.geometry_diff_count,
        )
    }

    pub fn chargeable_events(&self) -> u64 {
        self.new_box_count
            + self.deleted_box_count
            + self.class_only_diff_count
            + self.geometry_diff_count
    }
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("malformed label line {line}{}: {reason}", location(.path))]
    Parse {
        path: Option<PathBuf>,
        line: usize,
        reason: String,
    },

    #[error("degenerate comparison between {a} and {b}: zero denominator")]
    DegenerateMetric { a: f64, b: f64 },

    #[error("no reviewed label file at {}", .path.display())]
    MissingFrameFile { path: PathBuf },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn location(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" in {}", path.display()),
        None => String::new(),
    }
}

impl AuditError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn parse(line: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            path: None,
            line,
            reason: reason.into(),
        }
    }

    pub fn degenerate(a: f64, b: f64) -> Self {
        Self::DegenerateMetric { a, b }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attaches the originating file to a parse error; other variants pass
    /// through untouched.
    pub fn in_file(self, file: &Path) -> Self {
        match self {
            Self::Parse {
                path: None,
                line,
                reason,
            } => Self::Parse {
                path: Some(file.to_path_buf()),
                line,
                reason,
            },
            other => other,
        }
    }
}
