mod error;
mod json;
mod summary;
mod types;

pub use error::OutputError;
pub use json::write_report;
pub use summary::render_summary;
pub use types::{AuditMode, AuditReport, FrameRecord, FrameStatus};
