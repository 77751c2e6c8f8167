use label_audit_types::ReconciliationResult;

use crate::reconciler::ChargeEvent;

/// Running total and per-kind counters.
///
/// Events are folded one at a time, in the order they are applied, so the
/// floating total depends only on the event sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CostAccumulator {
    result: ReconciliationResult,
}

impl CostAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &ChargeEvent) {
        self.result.total_cost += event.amount();
        match *event {
            ChargeEvent::ClassChanged { .. } => self.result.class_only_diff_count += 1,
            ChargeEvent::GeometryChanged { .. } => self.result.geometry_diff_count += 1,
            ChargeEvent::Deleted { count, .. } => self.result.deleted_box_count += count,
            ChargeEvent::New { count, .. } => self.result.new_box_count += count,
        }
    }

    pub fn apply_all<'a>(&mut self, events: impl IntoIterator<Item = &'a ChargeEvent>) {
        for event in events {
            self.apply(event);
        }
    }

    pub fn finish(self) -> ReconciliationResult {
        self.result
    }
}

impl<'a> FromIterator<&'a ChargeEvent> for CostAccumulator {
    fn from_iter<I: IntoIterator<Item = &'a ChargeEvent>>(iter: I) -> Self {
        let mut accumulator = Self::new();
        accumulator.apply_all(iter);
        accumulator
    }
}
