use std::process::ExitCode;
use std::time::Duration;

use label_audit::audit::{AuditPlan, reconcile_selection, select_frames};
use label_audit::cli::{CliArgs, CliSources, parse_cli};
use label_audit::output::{OutputError, render_summary, write_report};
use label_audit::progress::{frame_bar, frame_callback};
use label_audit::settings::{ConfigError, resolve_settings};
use label_audit_types::AuditError;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Audit(#[from] AuditError),
    #[error(transparent)]
    Output(#[from] OutputError),
}

fn main() -> ExitCode {
    let (cli, sources) = parse_cli();
    init_tracing(cli.verbose);

    match run(&cli, &sources) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &CliArgs, sources: &CliSources) -> Result<(), AppError> {
    let settings = resolve_settings(cli, sources)?;
    let plan = AuditPlan::from_settings(&settings)?;
    let selection = select_frames(&plan)?;

    let bar = (!cli.quiet && !selection.is_empty()).then(|| {
        let bar = frame_bar(selection.len());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    });
    let callback = bar.as_ref().map(frame_callback);

    let result = reconcile_selection(&plan, &selection, callback.as_ref());
    if let Some(bar) = bar {
        match &result {
            Ok(_) => bar.finish_with_message("done"),
            Err(_) => bar.abandon_with_message("failed"),
        }
    }
    let report = result?;

    if let Some(report_settings) = settings.report.as_ref() {
        write_report(report_settings, &report)?;
        info!(path = %report_settings.path.display(), "wrote audit report");
    }
    println!("{}", render_summary(&report));
    Ok(())
}
