use std::fmt::Write as _;

use crate::output::types::AuditReport;

/// Human-readable summary printed at the end of a run. Cost is shown with
/// two decimals; the JSON report keeps full precision.
pub fn render_summary(report: &AuditReport) -> String {
    let result = &report.result;
    let mut out = String::new();
    let _ = writeln!(out, "mode:               {}", report.mode.as_str());
    let _ = writeln!(
        out,
        "frames:             {} evaluated, {} skipped",
        report.frames_evaluated, report.frames_skipped
    );
    let _ = writeln!(out, "cost:               {:.2}", result.total_cost);
    let _ = writeln!(out, "new boxes:          {}", result.new_box_count);
    let _ = writeln!(out, "deleted boxes:      {}", result.deleted_box_count);
    let _ = writeln!(out, "class-only changes: {}", result.class_only_diff_count);
    let _ = write!(out, "geometry changes:   {}", result.geometry_diff_count);
    out
}

#[cfg(test)]
mod tests {
    use label_audit_types::ReconciliationResult;

    use super::*;
    use crate::output::types::AuditMode;

    #[test]
    fn summary_rounds_cost_to_cents() {
        let report = AuditReport {
            mode: AuditMode::Baseline,
            result: ReconciliationResult {
                total_cost: 1.0 / 3.0,
                new_box_count: 2,
                deleted_box_count: 1,
                class_only_diff_count: 0,
                geometry_diff_count: 4,
            },
            frames_evaluated: 3,
            frames_skipped: 1,
            frames: Vec::new(),
        };
        let summary = render_summary(&report);
        assert!(summary.contains("cost:               0.33"));
        assert!(summary.contains("3 evaluated, 1 skipped"));
        assert!(summary.contains("geometry changes:   4"));
    }
}
