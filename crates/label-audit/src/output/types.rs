use label_audit_types::ReconciliationResult;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditMode {
    /// Before and after label files are reconciled frame by frame.
    Baseline,
    /// Every reviewed box is billed as new.
    NoBaseline,
}

impl AuditMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditMode::Baseline => "baseline",
            AuditMode::NoBaseline => "no-baseline",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameStatus {
    Reconciled,
    AllNew,
    /// The reviewed label file was missing; the frame contributed nothing.
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameRecord {
    pub file_name: String,
    /// Position inside the evaluated frame range.
    pub position: usize,
    pub increased: bool,
    pub status: FrameStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_boxes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_boxes: Option<usize>,
    pub result: ReconciliationResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub mode: AuditMode,
    pub result: ReconciliationResult,
    pub frames_evaluated: usize,
    pub frames_skipped: usize,
    pub frames: Vec<FrameRecord>,
}
