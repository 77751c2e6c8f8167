use std::path::PathBuf;

use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use label_audit_comparator::DEFAULT_STRIP_TAIL;
use label_audit_types::{RateTable, Thresholds};

/// Records which defaulted options were set explicitly on the command line,
/// so config file values only fill in the rest.
#[derive(Debug, Default)]
pub struct CliSources {
    pub cost_diff_box_from_cli: bool,
    pub cost_diff_box_increased_from_cli: bool,
    pub cost_new_box_from_cli: bool,
    pub cost_new_box_increased_from_cli: bool,
    pub low_threshold_from_cli: bool,
    pub high_threshold_from_cli: bool,
    pub strip_tail_from_cli: bool,
}

impl CliSources {
    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            cost_diff_box_from_cli: value_from_cli(matches, "cost_diff_box"),
            cost_diff_box_increased_from_cli: value_from_cli(matches, "cost_diff_box_increased"),
            cost_new_box_from_cli: value_from_cli(matches, "cost_new_box"),
            cost_new_box_increased_from_cli: value_from_cli(matches, "cost_new_box_increased"),
            low_threshold_from_cli: value_from_cli(matches, "box_change_low_threshold"),
            high_threshold_from_cli: value_from_cli(matches, "box_change_high_threshold"),
            strip_tail_from_cli: value_from_cli(matches, "strip_tail"),
        }
    }
}

fn value_from_cli(matches: &ArgMatches, id: &str) -> bool {
    matches
        .value_source(id)
        .is_some_and(|source| matches!(source, ValueSource::CommandLine))
}

pub fn parse_cli() -> (CliArgs, CliSources) {
    let command = CliArgs::command();
    let matches = command.get_matches();
    let args = match CliArgs::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(err) => err.exit(),
    };
    let sources = CliSources::from_matches(&matches);
    (args, sources)
}

/// Parses an explicit argument list; used by tests and embedders.
pub fn parse_cli_from<I, T>(args: I) -> Result<(CliArgs, CliSources), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = CliArgs::command().try_get_matches_from(args)?;
    let args = CliArgs::from_arg_matches(&matches)?;
    let sources = CliSources::from_matches(&matches);
    Ok((args, sources))
}

#[derive(Debug, Parser)]
#[command(
    name = "label-audit",
    about = "Compare reviewed bounding-box labels with their pre-annotations and price the work",
    disable_help_subcommand = true
)]
pub struct CliArgs {
    /// Override the configuration file path (TOML, or YAML by extension)
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the pre-annotated label files
    #[arg(long = "before", value_name = "DIR")]
    pub before: Option<PathBuf>,

    /// Directory holding the reviewed label files
    #[arg(long = "after", value_name = "DIR")]
    pub after: Option<PathBuf>,

    /// Rate for a changed, relabeled or deleted box
    #[arg(
        long = "cost-diff-box",
        id = "cost_diff_box",
        default_value_t = RateTable::default().cost_diff_box
    )]
    pub cost_diff_box: f64,

    /// Rate for a changed, relabeled or deleted box inside the bonus window
    #[arg(
        long = "cost-diff-box-increased",
        id = "cost_diff_box_increased",
        default_value_t = RateTable::default().cost_diff_box_increased
    )]
    pub cost_diff_box_increased: f64,

    /// Rate for a newly drawn box
    #[arg(
        long = "cost-new-box",
        id = "cost_new_box",
        default_value_t = RateTable::default().cost_new_box
    )]
    pub cost_new_box: f64,

    /// Rate for a newly drawn box inside the bonus window
    #[arg(
        long = "cost-new-box-increased",
        id = "cost_new_box_increased",
        default_value_t = RateTable::default().cost_new_box_increased
    )]
    pub cost_new_box_increased: f64,

    /// Differences below this ratio leave a box unchanged
    #[arg(
        long = "low-threshold",
        id = "box_change_low_threshold",
        default_value_t = Thresholds::default().low
    )]
    pub low_threshold: f64,

    /// Differences at or above this ratio count the box as deleted
    #[arg(
        long = "high-threshold",
        id = "box_change_high_threshold",
        default_value_t = Thresholds::default().high
    )]
    pub high_threshold: f64,

    /// Frame range to evaluate, as "<from>-<to>" over the sorted label files
    #[arg(
        long = "frames",
        value_name = "RANGE",
        conflicts_with_all = ["frames_from", "frames_to"]
    )]
    pub frames: Option<String>,

    /// First frame (zero-based) of the evaluated range
    #[arg(long = "frames-from", id = "frames_from", allow_negative_numbers = true)]
    pub frames_from: Option<i64>,

    /// End of the evaluated range (exclusive); -1 runs to the last frame
    #[arg(long = "frames-to", id = "frames_to", allow_negative_numbers = true)]
    pub frames_to: Option<i64>,

    /// First position of the bonus window inside the evaluated range; -1 disables
    #[arg(long = "increased-from", id = "increased_from", allow_negative_numbers = true)]
    pub increased_from: Option<i64>,

    /// Last position (inclusive) of the bonus window; -1 disables
    #[arg(long = "increased-to", id = "increased_to", allow_negative_numbers = true)]
    pub increased_to: Option<i64>,

    /// Bonus window spanning this many frames from the range start
    #[arg(
        long = "increased-frames",
        value_name = "COUNT",
        conflicts_with_all = ["increased_from", "increased_to"]
    )]
    pub increased_frames: Option<u32>,

    /// Bill every reviewed box as new, ignoring the before directory
    #[arg(long = "no-preannotated")]
    pub no_preannotated: bool,

    /// Use the directories as given instead of descending to the deepest leaf
    #[arg(long = "no-descend")]
    pub no_descend: bool,

    /// Characters dropped from the end of every raw label line
    #[arg(long = "strip-tail", id = "strip_tail", default_value_t = DEFAULT_STRIP_TAIL)]
    pub strip_tail: usize,

    /// Write the full report as JSON to this file
    #[arg(long = "json", value_name = "FILE")]
    pub json: Option<PathBuf>,

    /// Write compact JSON instead of pretty-printed
    #[arg(long = "compact")]
    pub compact: bool,

    /// Worker threads used to reconcile frames
    #[arg(long = "jobs", value_parser = clap::value_parser!(u32).range(1..))]
    pub jobs: Option<u32>,

    /// Hide the progress bar
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_not_reported_as_cli_values() {
        let (args, sources) = parse_cli_from(["label-audit", "--after", "reviewed"]).unwrap();
        assert_eq!(args.cost_diff_box, 0.4);
        assert_eq!(args.strip_tail, DEFAULT_STRIP_TAIL);
        assert!(!sources.cost_diff_box_from_cli);
        assert!(!sources.low_threshold_from_cli);
    }

    #[test]
    fn explicit_values_are_tracked() {
        let (args, sources) = parse_cli_from([
            "label-audit",
            "--after",
            "reviewed",
            "--cost-new-box",
            "1.25",
            "--low-threshold",
            "0.05",
            "--frames-to",
            "-1",
        ])
        .unwrap();
        assert_eq!(args.cost_new_box, 1.25);
        assert!(sources.cost_new_box_from_cli);
        assert!(sources.low_threshold_from_cli);
        assert!(!sources.high_threshold_from_cli);
        assert_eq!(args.frames_to, Some(-1));
    }

    #[test]
    fn frame_range_conflicts_with_explicit_bounds() {
        let result = parse_cli_from([
            "label-audit",
            "--frames",
            "0-10",
            "--frames-from",
            "2",
        ]);
        assert!(result.is_err());
    }
}
