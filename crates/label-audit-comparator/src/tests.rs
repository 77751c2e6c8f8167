use label_audit_types::{
    AuditError, BBox, BonusWindow, FrameBoxSet, RateTable, ReconciliationResult, Thresholds,
};

use crate::{ChargeEvent, CostAccumulator, FrameRates, FrameReconciler, RateSchedule};

fn reconciler() -> FrameReconciler {
    FrameReconciler::new(Thresholds::new(0.1, 0.7).unwrap())
}

fn normal_rates() -> FrameRates {
    RateSchedule::new(RateTable::default(), BonusWindow::disabled()).for_position(0)
}

fn frame(boxes: &[BBox]) -> FrameBoxSet {
    FrameBoxSet::from_unsorted(boxes.to_vec())
}

fn tally(events: &[ChargeEvent]) -> ReconciliationResult {
    events.iter().collect::<CostAccumulator>().finish()
}

fn reconcile(before: &[BBox], after: &[BBox]) -> ReconciliationResult {
    let events = reconciler()
        .reconcile(&frame(before), &frame(after), normal_rates())
        .unwrap();
    tally(&events)
}

#[test]
fn identical_frames_cost_nothing() {
    let boxes = [
        BBox::new(0, 0.2, 0.3, 0.1, 0.2),
        BBox::new(1, 0.6, 0.4, 0.15, 0.1),
        BBox::new(2, 0.6, 0.8, 0.05, 0.05),
    ];
    let result = reconcile(&boxes, &boxes);
    assert_eq!(result, ReconciliationResult::default());
}

#[test]
fn class_relabel_is_billed_at_diff_rate() {
    let before = [BBox::new(0, 0.5, 0.5, 0.1, 0.1)];
    let after = [BBox::new(1, 0.5, 0.5, 0.1, 0.1)];
    let result = reconcile(&before, &after);
    assert_eq!(result.class_only_diff_count, 1);
    assert_eq!(result.geometry_diff_count, 0);
    assert_eq!(result.new_box_count, 0);
    assert_eq!(result.deleted_box_count, 0);
    assert_eq!(result.total_cost, RateTable::default().cost_diff_box);
}

#[test]
fn empty_reviewed_frame_deletes_every_box() {
    let before = [
        BBox::new(0, 0.2, 0.2, 0.1, 0.1),
        BBox::new(0, 0.7, 0.7, 0.1, 0.1),
    ];
    let result = reconcile(&before, &[]);
    assert_eq!(result.deleted_box_count, 2);
    assert_eq!(result.total_cost, 2.0 * RateTable::default().cost_diff_box);
}

#[test]
fn empty_baseline_frame_bills_new_boxes() {
    let after = [BBox::new(3, 0.4, 0.4, 0.2, 0.2)];
    let result = reconcile(&[], &after);
    assert_eq!(result.new_box_count, 1);
    assert_eq!(result.total_cost, RateTable::default().cost_new_box);
}

#[test]
fn one_extra_reviewed_box_counts_once() {
    let kept = BBox::new(0, 0.2, 0.5, 0.1, 0.1);
    let added = BBox::new(1, 0.9, 0.5, 0.05, 0.05);
    let result = reconcile(&[kept], &[kept, added]);
    assert_eq!(result.new_box_count, 1);
    assert_eq!(result.chargeable_events(), 1);
}

#[test]
fn resized_box_is_geometry_change() {
    let before = [BBox::new(0, 0.5, 0.5, 0.1, 0.1)];
    let after = [BBox::new(0, 0.5, 0.5, 0.14, 0.1)];
    let result = reconcile(&before, &after);
    assert_eq!(result.geometry_diff_count, 1);
    assert_eq!(result.new_box_count, 0);
}

#[test]
fn deleted_verdict_leaves_reviewed_box_in_pool() {
    // Both before boxes are judged deleted against the same reviewed box,
    // which is then still billed as new at the end of the frame.
    let before = [
        BBox::new(0, 0.2, 0.5, 0.1, 0.1),
        BBox::new(0, 0.3, 0.5, 0.1, 0.1),
    ];
    let after = [BBox::new(0, 0.8, 0.5, 0.1, 0.1)];
    let events = reconciler()
        .reconcile(&frame(&before), &frame(&after), normal_rates())
        .unwrap();
    assert_eq!(
        events,
        vec![
            ChargeEvent::Deleted {
                rate: 0.4,
                count: 1
            },
            ChargeEvent::Deleted {
                rate: 0.4,
                count: 1
            },
            ChargeEvent::New {
                rate: 0.8,
                count: 1
            },
        ]
    );
    let result = tally(&events);
    assert_eq!(result.deleted_box_count, 2);
    assert_eq!(result.new_box_count, 1);
    assert!((result.total_cost - 1.6).abs() < 1e-12);
}

#[test]
fn exhausted_pool_bills_remaining_before_boxes_at_once() {
    let first = BBox::new(0, 0.2, 0.5, 0.1, 0.1);
    let before = [
        first,
        BBox::new(1, 0.5, 0.5, 0.1, 0.1),
        BBox::new(2, 0.8, 0.5, 0.1, 0.1),
    ];
    let events = reconciler()
        .reconcile(&frame(&before), &frame(&[first]), normal_rates())
        .unwrap();
    assert_eq!(
        events,
        vec![ChargeEvent::Deleted {
            rate: 0.4,
            count: 2
        }]
    );
}

#[test]
fn unmatched_box_produces_no_event() {
    let reconciler = FrameReconciler::new(Thresholds::new(0.5, 0.7).unwrap());
    let before = [BBox::new(0, 0.5, 0.5, 0.375, 0.25)];
    let after = [BBox::new(0, 0.5, 0.5, 0.625, 0.25)];
    let events = reconciler
        .reconcile(&frame(&before), &frame(&after), normal_rates())
        .unwrap();
    // The reviewed box was never consumed, so it is billed as new.
    assert_eq!(
        events,
        vec![ChargeEvent::New {
            rate: 0.8,
            count: 1
        }]
    );
}

#[test]
fn bonus_rates_flow_into_events() {
    let schedule = RateSchedule::new(RateTable::default(), BonusWindow::new(0, 0));
    let before = [BBox::new(0, 0.5, 0.5, 0.1, 0.1)];
    let after = [
        BBox::new(1, 0.5, 0.5, 0.1, 0.1),
        BBox::new(0, 0.9, 0.9, 0.05, 0.05),
    ];
    let events = reconciler()
        .reconcile(&frame(&before), &frame(&after), schedule.for_position(0))
        .unwrap();
    let result = tally(&events);
    assert_eq!(result.class_only_diff_count, 1);
    assert_eq!(result.new_box_count, 1);
    assert!((result.total_cost - (0.6 + 1.0)).abs() < 1e-12);
}

#[test]
fn all_new_counts_every_box() {
    let after = frame(&[
        BBox::new(0, 0.1, 0.1, 0.1, 0.1),
        BBox::new(0, 0.4, 0.1, 0.1, 0.1),
        BBox::new(0, 0.7, 0.1, 0.1, 0.1),
    ]);
    let result = tally(&FrameReconciler::all_new(&after, normal_rates()));
    assert_eq!(result.new_box_count, 3);
    assert_eq!(result.deleted_box_count, 0);
    assert!(FrameReconciler::all_new(&FrameBoxSet::empty(), normal_rates()).is_empty());
}

#[test]
fn zero_sized_boxes_fail_the_comparison() {
    let before = [BBox::new(0, 0.5, 0.5, 0.0, 0.1)];
    let after = [BBox::new(0, 0.5, 0.5, 0.0, 0.1)];
    let err = reconciler()
        .reconcile(&frame(&before), &frame(&after), normal_rates())
        .unwrap_err();
    assert!(matches!(err, AuditError::DegenerateMetric { .. }));
}
