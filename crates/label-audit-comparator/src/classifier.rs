//! Per-box classification against the pool of reviewed boxes of a frame.

use label_audit_types::{AuditResult, BBox, FrameBoxSet, Thresholds};

use crate::metric::BoxDelta;

/// Fate of a before box relative to one reviewed box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Geometry within tolerance and same class; free.
    Unchanged,
    /// Geometry within tolerance but relabeled.
    ClassChanged,
    /// Moved or resized beyond the low threshold.
    GeometryChanged,
    /// Displaced at or beyond the high threshold.
    Deleted,
}

impl Verdict {
    /// Whether the matched reviewed box leaves the pool. A deleted verdict
    /// keeps the candidate available to later before boxes.
    pub fn consumes_candidate(&self) -> bool {
        !matches!(self, Verdict::Deleted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// First pool entry, in pool order, matching any rule.
    Matched { verdict: Verdict, candidate: usize },
    /// No available pool entry matched any rule.
    Unmatched,
    /// The pool had no available entries left.
    PoolExhausted,
}

/// Reviewed boxes of a frame plus the set of entries already consumed.
#[derive(Debug)]
pub struct AfterPool<'a> {
    boxes: &'a [BBox],
    consumed: Vec<bool>,
    available: usize,
}

impl<'a> AfterPool<'a> {
    pub fn new(set: &'a FrameBoxSet) -> Self {
        Self {
            boxes: set.boxes(),
            consumed: vec![false; set.len()],
            available: set.len(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.available == 0
    }

    pub fn available(&self) -> usize {
        self.available
    }

    /// Unconsumed entries in pool order with their indices.
    pub fn candidates(&self) -> impl Iterator<Item = (usize, &'a BBox)> + '_ {
        self.boxes
            .iter()
            .enumerate()
            .filter(|(index, _)| !self.consumed[*index])
    }

    pub fn consume(&mut self, index: usize) {
        if !self.consumed[index] {
            self.consumed[index] = true;
            self.available -= 1;
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BoxClassifier {
    thresholds: Thresholds,
}

impl BoxClassifier {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Applies the three rules, in order, to a single pair.
    pub fn verdict(&self, before: &BBox, after: &BBox) -> AuditResult<Option<Verdict>> {
        let Thresholds { low, high } = self.thresholds;
        let delta = BoxDelta::between(before, after)?;

        if delta.similarity_terms().iter().all(|&value| value < low) {
            return Ok(Some(if before.class_id != after.class_id {
                Verdict::ClassChanged
            } else {
                Verdict::Unchanged
            }));
        }

        let displacement = delta.displacement_terms();
        if displacement
            .iter()
            .any(|&value| low < value && value < high)
        {
            return Ok(Some(Verdict::GeometryChanged));
        }
        if displacement.iter().any(|&value| value >= high) {
            return Ok(Some(Verdict::Deleted));
        }
        Ok(None)
    }

    /// Scans the pool in order and stops at the first entry matching a rule.
    /// The pool itself is left untouched; consuming is up to the caller.
    pub fn classify(&self, before: &BBox, pool: &AfterPool<'_>) -> AuditResult<Classification> {
        if pool.is_exhausted() {
            return Ok(Classification::PoolExhausted);
        }
        for (candidate, after) in pool.candidates() {
            if let Some(verdict) = self.verdict(before, after)? {
                return Ok(Classification::Matched { verdict, candidate });
            }
        }
        Ok(Classification::Unmatched)
    }
}
