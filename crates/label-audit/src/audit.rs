//! Batch driver: pairs label files across the before and after directories,
//! reconciles every selected frame and folds the results into one report.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use label_audit_comparator::{
    ChargeEvent, CostAccumulator, FrameReconciler, LineFormat, RateSchedule,
};
use label_audit_types::{AuditError, AuditResult, BonusWindow, FrameWindow, Thresholds};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::discovery::{list_label_files, resolve_label_dir};
use crate::output::{AuditMode, AuditReport, FrameRecord, FrameStatus};
use crate::settings::EffectiveSettings;

pub type ProgressCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// Validated inputs for one audit run.
#[derive(Debug, Clone)]
pub struct AuditPlan {
    /// `None` when the task was not pre-annotated.
    pub before_dir: Option<PathBuf>,
    pub after_dir: PathBuf,
    pub thresholds: Thresholds,
    pub schedule: RateSchedule,
    pub window: FrameWindow,
    pub format: LineFormat,
    pub jobs: Option<usize>,
}

impl AuditPlan {
    /// Checks the merged settings and resolves the label directories.
    pub fn from_settings(settings: &EffectiveSettings) -> AuditResult<Self> {
        settings.rates.validate()?;
        let thresholds = Thresholds::new(settings.low_threshold, settings.high_threshold)?;
        let window = FrameWindow::from_bounds(settings.frames_from, settings.frames_to)?;
        let bonus = BonusWindow::new(settings.increased_from, settings.increased_to);

        let after_dir = resolve_label_dir(&settings.after_dir, settings.descend)?;
        let before_dir = if settings.have_preannotated {
            let Some(dir) = settings.before_dir.as_deref() else {
                return Err(AuditError::configuration(
                    "before_dir is required unless have_preannotated is false",
                ));
            };
            Some(resolve_label_dir(dir, settings.descend)?)
        } else {
            None
        };

        Ok(Self {
            before_dir,
            after_dir,
            thresholds,
            schedule: RateSchedule::new(settings.rates, bonus),
            window,
            format: LineFormat::new(settings.strip_tail),
            jobs: settings.jobs,
        })
    }
}

/// One frame scheduled for reconciliation.
#[derive(Debug, Clone)]
pub struct FrameJob {
    pub position: usize,
    pub file_name: String,
    pub before: Option<PathBuf>,
    pub after: PathBuf,
}

#[derive(Debug, Clone)]
pub struct FrameSelection {
    pub mode: AuditMode,
    pub jobs: Vec<FrameJob>,
}

impl FrameSelection {
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Lists the frames to evaluate and decides the audit mode.
///
/// With a baseline, frames are enumerated from the before directory and the
/// same file name is looked up among the reviewed labels. Without one (or
/// when the before directory holds no label files) the reviewed directory is
/// enumerated instead.
pub fn select_frames(plan: &AuditPlan) -> AuditResult<FrameSelection> {
    let before = match plan.before_dir.as_deref() {
        Some(dir) => {
            let names = list_label_files(dir)?;
            if names.is_empty() {
                info!(
                    dir = %dir.display(),
                    "no pre-annotated label files; billing all boxes as new"
                );
                None
            } else {
                Some((dir, names))
            }
        }
        None => None,
    };

    let (mode, names) = match &before {
        Some((_, names)) => (AuditMode::Baseline, names.clone()),
        None => (AuditMode::NoBaseline, list_label_files(&plan.after_dir)?),
    };

    let jobs = plan
        .window
        .select(&names)
        .iter()
        .enumerate()
        .map(|(position, name)| FrameJob {
            position,
            file_name: name.clone(),
            before: before.as_ref().map(|(dir, _)| dir.join(name)),
            after: plan.after_dir.join(name),
        })
        .collect();

    Ok(FrameSelection { mode, jobs })
}

struct FrameOutcome {
    status: FrameStatus,
    before_boxes: Option<usize>,
    after_boxes: Option<usize>,
    events: Vec<ChargeEvent>,
}

/// Reconciles every selected frame and aggregates the result.
///
/// Frames are processed in parallel, but their events are folded into the
/// total in frame order, so the reported cost does not depend on scheduling.
/// The first failing frame in order aborts the run.
pub fn reconcile_selection(
    plan: &AuditPlan,
    selection: &FrameSelection,
    progress: Option<&ProgressCallback>,
) -> AuditResult<AuditReport> {
    info!(
        mode = selection.mode.as_str(),
        frames = selection.len(),
        "starting audit"
    );
    let reconciler = FrameReconciler::new(plan.thresholds);
    let processed = AtomicU64::new(0);

    let run = || -> Vec<AuditResult<FrameOutcome>> {
        selection
            .jobs
            .par_iter()
            .map(|job| {
                let outcome = reconcile_frame(plan, &reconciler, job);
                let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(callback) = progress {
                    callback(done);
                }
                outcome
            })
            .collect()
    };

    let outcomes = match plan.jobs {
        Some(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|err| {
                AuditError::configuration(format!("failed to start worker pool: {err}"))
            })?
            .install(run),
        None => run(),
    };

    let mut total = CostAccumulator::new();
    let mut frames = Vec::with_capacity(outcomes.len());
    let mut frames_skipped = 0;
    for (job, outcome) in selection.jobs.iter().zip(outcomes) {
        let outcome = outcome?;
        if outcome.status == FrameStatus::Skipped {
            frames_skipped += 1;
        }
        total.apply_all(&outcome.events);
        frames.push(FrameRecord {
            file_name: job.file_name.clone(),
            position: job.position,
            increased: plan.schedule.is_increased(job.position),
            status: outcome.status,
            before_boxes: outcome.before_boxes,
            after_boxes: outcome.after_boxes,
            result: outcome.events.iter().collect::<CostAccumulator>().finish(),
        });
    }

    let result = total.finish();
    info!(
        total_cost = result.total_cost,
        frames_skipped, "audit finished"
    );
    Ok(AuditReport {
        mode: selection.mode,
        result,
        frames_evaluated: frames.len() - frames_skipped,
        frames_skipped,
        frames,
    })
}

/// Selects and reconciles in one call.
pub fn run_audit(plan: &AuditPlan) -> AuditResult<AuditReport> {
    let selection = select_frames(plan)?;
    reconcile_selection(plan, &selection, None)
}

fn reconcile_frame(
    plan: &AuditPlan,
    reconciler: &FrameReconciler,
    job: &FrameJob,
) -> AuditResult<FrameOutcome> {
    let rates = plan.schedule.for_position(job.position);
    if plan.schedule.is_increased(job.position) {
        debug!(frame = %job.file_name, position = job.position, "increased rates apply");
    }

    let Some(before_path) = job.before.as_deref() else {
        let after = plan.format.read_frame(&job.after)?;
        return Ok(FrameOutcome {
            status: FrameStatus::AllNew,
            before_boxes: None,
            after_boxes: Some(after.len()),
            events: FrameReconciler::all_new(&after, rates),
        });
    };

    let before = plan.format.read_frame(before_path)?;
    let after = match plan.format.read_frame(&job.after) {
        Ok(after) => after,
        Err(AuditError::MissingFrameFile { path }) => {
            debug!(
                frame = %job.file_name,
                path = %path.display(),
                "reviewed label file missing; skipping frame"
            );
            return Ok(FrameOutcome {
                status: FrameStatus::Skipped,
                before_boxes: Some(before.len()),
                after_boxes: None,
                events: Vec::new(),
            });
        }
        Err(err) => return Err(err),
    };

    let events = reconciler.reconcile(&before, &after, rates)?;
    Ok(FrameOutcome {
        status: FrameStatus::Reconciled,
        before_boxes: Some(before.len()),
        after_boxes: Some(after.len()),
        events,
    })
}
