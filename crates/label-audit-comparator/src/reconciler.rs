//! Frame-level reconciliation of before and after box sets.

use label_audit_types::{AuditResult, FrameBoxSet, Thresholds};
use tracing::trace;

use crate::classifier::{AfterPool, BoxClassifier, Classification, Verdict};
use crate::rates::FrameRates;

/// Chargeable outcome emitted while reconciling a frame. Each event carries
/// the rate it was resolved at; `count` multiplies it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChargeEvent {
    ClassChanged { rate: f64 },
    GeometryChanged { rate: f64 },
    Deleted { rate: f64, count: u64 },
    New { rate: f64, count: u64 },
}

impl ChargeEvent {
    pub fn amount(&self) -> f64 {
        match *self {
            ChargeEvent::ClassChanged { rate } | ChargeEvent::GeometryChanged { rate } => rate,
            ChargeEvent::Deleted { rate, count } | ChargeEvent::New { rate, count } => {
                rate * count as f64
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FrameReconciler {
    classifier: BoxClassifier,
}

impl FrameReconciler {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            classifier: BoxClassifier::new(thresholds),
        }
    }

    /// Classifies every before box, in scan order, against the shared pool of
    /// reviewed boxes, then bills whatever is left in the pool as new.
    pub fn reconcile(
        &self,
        before: &FrameBoxSet,
        after: &FrameBoxSet,
        rates: FrameRates,
    ) -> AuditResult<Vec<ChargeEvent>> {
        let mut events = Vec::new();
        let mut pool = AfterPool::new(after);

        for (index, before_box) in before.iter().enumerate() {
            match self.classifier.classify(before_box, &pool)? {
                Classification::PoolExhausted => {
                    let remaining = (before.len() - index) as u64;
                    events.push(ChargeEvent::Deleted {
                        rate: rates.diff_box,
                        count: remaining,
                    });
                    break;
                }
                Classification::Unmatched => {
                    trace!(index, "before box matched no reviewed box");
                }
                Classification::Matched { verdict, candidate } => {
                    trace!(index, candidate, ?verdict, "before box classified");
                    if let Some(event) = charge_for(verdict, rates) {
                        events.push(event);
                    }
                    if verdict.consumes_candidate() {
                        pool.consume(candidate);
                    }
                }
            }
        }

        let leftovers = pool.available() as u64;
        if leftovers > 0 {
            events.push(ChargeEvent::New {
                rate: rates.new_box,
                count: leftovers,
            });
        }
        Ok(events)
    }

    /// Bills every reviewed box as new; used when there is no baseline.
    pub fn all_new(after: &FrameBoxSet, rates: FrameRates) -> Vec<ChargeEvent> {
        if after.is_empty() {
            return Vec::new();
        }
        vec![ChargeEvent::New {
            rate: rates.new_box,
            count: after.len() as u64,
        }]
    }
}

fn charge_for(verdict: Verdict, rates: FrameRates) -> Option<ChargeEvent> {
    match verdict {
        Verdict::Unchanged => None,
        Verdict::ClassChanged => Some(ChargeEvent::ClassChanged {
            rate: rates.diff_box,
        }),
        Verdict::GeometryChanged => Some(ChargeEvent::GeometryChanged {
            rate: rates.diff_box,
        }),
        Verdict::Deleted => Some(ChargeEvent::Deleted {
            rate: rates.diff_box,
            count: 1,
        }),
    }
}
