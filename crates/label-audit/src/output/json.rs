use std::fs;
use std::path::Path;

use crate::output::error::OutputError;
use crate::output::types::AuditReport;
use crate::settings::ReportSettings;

/// Writes the report to the configured path, creating parent directories.
pub fn write_report(settings: &ReportSettings, report: &AuditReport) -> Result<(), OutputError> {
    write_json(&settings.path, report, settings.pretty)
}

fn write_json<T>(path: &Path, data: &T, pretty: bool) -> Result<(), OutputError>
where
    T: serde::Serialize + ?Sized,
{
    let encoded = if pretty {
        serde_json::to_vec_pretty(data)?
    } else {
        serde_json::to_vec(data)?
    };
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, encoded)?;
    Ok(())
}
