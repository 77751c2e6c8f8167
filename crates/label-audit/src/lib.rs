//! Annotation audit: reconciles pre-annotated and reviewed YOLO label
//! directories frame by frame and prices the review work.

pub mod audit;
pub mod cli;
pub mod discovery;
pub mod output;
pub mod progress;
pub mod settings;

pub use audit::{
    AuditPlan, FrameJob, FrameSelection, ProgressCallback, reconcile_selection, run_audit,
    select_frames,
};
pub use output::{AuditMode, AuditReport, FrameRecord, FrameStatus, OutputError};
pub use settings::{ConfigError, EffectiveSettings, ReportSettings, resolve_settings};
