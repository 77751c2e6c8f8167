use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};
use label_audit_types::RateTable;
use serde::Deserialize;

use crate::cli::{CliArgs, CliSources};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    #[serde(alias = "initial_labels_dir")]
    before_dir: Option<String>,
    #[serde(alias = "final_labels_dir")]
    after_dir: Option<String>,
    cost_diff_box: Option<f64>,
    cost_diff_box_increased: Option<f64>,
    cost_new_box: Option<f64>,
    cost_new_box_increased: Option<f64>,
    box_change_low_threshold: Option<f64>,
    box_change_high_threshold: Option<f64>,
    frames: Option<String>,
    frames_from: Option<i64>,
    frames_to: Option<i64>,
    increased_cost_frame_from: Option<i64>,
    increased_cost_frame_to: Option<i64>,
    increased_frames: Option<u32>,
    have_preannotated: Option<bool>,
    descend: Option<bool>,
    strip_tail: Option<usize>,
    jobs: Option<u32>,
    report: Option<ReportFileConfig>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
struct ReportFileConfig {
    json: Option<String>,
    pretty: Option<bool>,
}

/// Settings after layering command line, config file and defaults.
///
/// Values are merged but not yet validated against the audit rules; that
/// happens when the plan is built.
#[derive(Debug, Clone)]
pub struct EffectiveSettings {
    pub before_dir: Option<PathBuf>,
    pub after_dir: PathBuf,
    pub rates: RateTable,
    pub low_threshold: f64,
    pub high_threshold: f64,
    pub frames_from: i64,
    pub frames_to: i64,
    pub increased_from: i64,
    pub increased_to: i64,
    pub have_preannotated: bool,
    pub descend: bool,
    pub strip_tail: usize,
    pub jobs: Option<usize>,
    pub report: Option<ReportSettings>,
    pub config_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub path: PathBuf,
    pub pretty: bool,
}

const PROJECT_CONFIG_FILE: &str = "label-audit.toml";

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    ParseYaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    InvalidValue {
        path: Option<PathBuf>,
        field: &'static str,
        value: String,
    },
    MissingValue {
        field: &'static str,
    },
    NotFound {
        path: PathBuf,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(
                    f,
                    "failed to read config file {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseToml { path, source } => {
                write!(
                    f,
                    "failed to parse config file {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseYaml { path, source } => {
                write!(
                    f,
                    "failed to parse config file {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::InvalidValue { path, field, value } => {
                if let Some(path) = path {
                    write!(
                        f,
                        "invalid value '{}' for '{}' in {}",
                        value,
                        field,
                        path.display()
                    )
                } else {
                    write!(f, "invalid value '{}' for '{}'", value, field)
                }
            }
            ConfigError::MissingValue { field } => {
                write!(
                    f,
                    "'{}' must be set on the command line or in the config file",
                    field
                )
            }
            ConfigError::NotFound { path } => {
                write!(f, "config file {} does not exist", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::ParseToml { source, .. } => Some(source),
            ConfigError::ParseYaml { source, .. } => Some(source),
            ConfigError::InvalidValue { .. } => None,
            ConfigError::MissingValue { .. } => None,
            ConfigError::NotFound { .. } => None,
        }
    }
}

pub fn resolve_settings(
    cli: &CliArgs,
    sources: &CliSources,
) -> Result<EffectiveSettings, ConfigError> {
    let (file, config_path) = load_config(cli.config.as_deref())?;
    merge(cli, sources, file, config_path)
}

fn load_config(path_override: Option<&Path>) -> Result<(FileConfig, Option<PathBuf>), ConfigError> {
    if let Some(path) = path_override {
        let path = expand_pathbuf(path.to_path_buf());
        if !path.exists() {
            return Err(ConfigError::NotFound { path });
        }
        let config = read_config_file(&path)?;
        return Ok((config, Some(path)));
    }

    if let Some(project_path) = project_config_path() {
        if project_path.exists() {
            let config = read_config_file(&project_path)?;
            return Ok((config, Some(project_path)));
        }
    }

    let Some(default_path) = default_config_path() else {
        return Ok((FileConfig::default(), None));
    };
    if !default_path.exists() {
        return Ok((FileConfig::default(), None));
    }
    let config = read_config_file(&default_path)?;
    Ok((config, Some(default_path)))
}

fn read_config_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if is_yaml(path) {
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::ParseYaml {
            path: path.to_path_buf(),
            source,
        })
    } else {
        toml::from_str(&contents).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

fn merge(
    cli: &CliArgs,
    sources: &CliSources,
    file: FileConfig,
    config_path: Option<PathBuf>,
) -> Result<EffectiveSettings, ConfigError> {
    let config_dir = config_path
        .as_ref()
        .and_then(|path| path.parent().map(|dir| dir.to_path_buf()));

    let FileConfig {
        before_dir: file_before_dir,
        after_dir: file_after_dir,
        cost_diff_box: file_cost_diff_box,
        cost_diff_box_increased: file_cost_diff_box_increased,
        cost_new_box: file_cost_new_box,
        cost_new_box_increased: file_cost_new_box_increased,
        box_change_low_threshold: file_low_threshold,
        box_change_high_threshold: file_high_threshold,
        frames: file_frames,
        frames_from: file_frames_from,
        frames_to: file_frames_to,
        increased_cost_frame_from: file_increased_from,
        increased_cost_frame_to: file_increased_to,
        increased_frames: file_increased_frames,
        have_preannotated: file_have_preannotated,
        descend: file_descend,
        strip_tail: file_strip_tail,
        jobs: file_jobs,
        report: file_report,
    } = file;

    let before_dir = match cli.before.clone() {
        Some(dir) => Some(expand_pathbuf(dir)),
        None => normalize_string(file_before_dir)
            .and_then(|dir| resolve_path_from_config(dir, config_dir.as_deref())),
    };
    let after_dir = match cli.after.clone() {
        Some(dir) => Some(expand_pathbuf(dir)),
        None => normalize_string(file_after_dir)
            .and_then(|dir| resolve_path_from_config(dir, config_dir.as_deref())),
    };
    let Some(after_dir) = after_dir else {
        return Err(ConfigError::MissingValue { field: "after_dir" });
    };

    let rates = RateTable {
        cost_diff_box: layered(
            cli.cost_diff_box,
            sources.cost_diff_box_from_cli,
            file_cost_diff_box,
        ),
        cost_diff_box_increased: layered(
            cli.cost_diff_box_increased,
            sources.cost_diff_box_increased_from_cli,
            file_cost_diff_box_increased,
        ),
        cost_new_box: layered(
            cli.cost_new_box,
            sources.cost_new_box_from_cli,
            file_cost_new_box,
        ),
        cost_new_box_increased: layered(
            cli.cost_new_box_increased,
            sources.cost_new_box_increased_from_cli,
            file_cost_new_box_increased,
        ),
    };
    let low_threshold = layered(
        cli.low_threshold,
        sources.low_threshold_from_cli,
        file_low_threshold,
    );
    let high_threshold = layered(
        cli.high_threshold,
        sources.high_threshold_from_cli,
        file_high_threshold,
    );
    let strip_tail = layered(cli.strip_tail, sources.strip_tail_from_cli, file_strip_tail);

    let mut frames_from = 0;
    let mut frames_to = -1;
    if let Some(value) = normalize_string(file_frames) {
        (frames_from, frames_to) = parse_frame_range(&value, config_path.as_ref())?;
    }
    if let Some(value) = file_frames_from {
        frames_from = value;
    }
    if let Some(value) = file_frames_to {
        frames_to = value;
    }
    if let Some(value) = normalize_string(cli.frames.clone()) {
        (frames_from, frames_to) = parse_frame_range(&value, None)?;
    }
    if let Some(value) = cli.frames_from {
        frames_from = value;
    }
    if let Some(value) = cli.frames_to {
        frames_to = value;
    }

    let explicit_from = cli.increased_from.or(file_increased_from);
    let explicit_to = cli.increased_to.or(file_increased_to);
    let (increased_from, increased_to) = if explicit_from.is_some() || explicit_to.is_some() {
        (explicit_from.unwrap_or(-1), explicit_to.unwrap_or(-1))
    } else if let Some(count) = cli
        .increased_frames
        .or(file_increased_frames)
        .filter(|count| *count > 0)
    {
        (frames_from, frames_from + i64::from(count))
    } else {
        (-1, -1)
    };

    let have_preannotated = !cli.no_preannotated && file_have_preannotated.unwrap_or(true);
    let descend = !cli.no_descend && file_descend.unwrap_or(true);

    let jobs = match cli.jobs.or(file_jobs) {
        Some(0) => {
            return Err(ConfigError::InvalidValue {
                path: config_path,
                field: "jobs",
                value: "0".to_string(),
            });
        }
        Some(value) => Some(value as usize),
        None => None,
    };

    let file_report_path = file_report
        .as_ref()
        .and_then(|cfg| normalize_string(cfg.json.clone()))
        .and_then(|value| resolve_path_from_config(value, config_dir.as_deref()));
    let report_path = cli.json.clone().map(expand_pathbuf).or(file_report_path);
    let pretty = !cli.compact
        && file_report
            .as_ref()
            .and_then(|cfg| cfg.pretty)
            .unwrap_or(true);
    let report = report_path.map(|path| ReportSettings { path, pretty });

    Ok(EffectiveSettings {
        before_dir,
        after_dir,
        rates,
        low_threshold,
        high_threshold,
        frames_from,
        frames_to,
        increased_from,
        increased_to,
        have_preannotated,
        descend,
        strip_tail,
        jobs,
        report,
        config_dir,
    })
}

/// Parses a `"<from>-<to>"` frame range.
///
/// An empty value or any other shape selects every frame; non-numeric bounds
/// are rejected.
pub fn parse_frame_range(value: &str, path: Option<&PathBuf>) -> Result<(i64, i64), ConfigError> {
    let trimmed = value.trim();
    let parts: Vec<&str> = trimmed.split('-').collect();
    if trimmed.is_empty() || parts.len() != 2 {
        return Ok((0, -1));
    }
    let parse_bound = |raw: &str| {
        raw.trim()
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidValue {
                path: path.cloned(),
                field: "frames",
                value: value.to_string(),
            })
    };
    Ok((parse_bound(parts[0])?, parse_bound(parts[1])?))
}

fn layered<T>(cli_value: T, from_cli: bool, file_value: Option<T>) -> T {
    if from_cli {
        cli_value
    } else {
        file_value.unwrap_or(cli_value)
    }
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("rs", "label-audit", "label-audit")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    env::current_dir()
        .ok()
        .map(|dir| dir.join(PROJECT_CONFIG_FILE))
}

fn normalize_string(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn expand_pathbuf(path: PathBuf) -> PathBuf {
    match path.to_str() {
        Some(s) => expand_home_path(s),
        None => path,
    }
}

fn resolve_path_from_config(value: String, base: Option<&Path>) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let expanded = expand_home_path(trimmed);
    match base {
        Some(base) if !expanded.is_absolute() => Some(base.join(expanded)),
        _ => Some(expanded),
    }
}

fn expand_home_path(value: &str) -> PathBuf {
    if value == "~" {
        if let Some(base) = BaseDirs::new() {
            return base.home_dir().to_path_buf();
        }
    } else if let Some(stripped) = value.strip_prefix("~/") {
        if let Some(base) = BaseDirs::new() {
            return base.home_dir().join(stripped);
        }
    }
    PathBuf::from(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::parse_cli_from;

    fn settings_with(
        args: &[&str],
        file: &str,
        yaml: bool,
    ) -> Result<EffectiveSettings, ConfigError> {
        let dir = tempfile::tempdir().unwrap();
        let name = if yaml { "audit.yaml" } else { "audit.toml" };
        let config = dir.path().join(name);
        fs::write(&config, file).unwrap();
        let mut argv = vec!["label-audit".to_string(), "--config".to_string()];
        argv.push(config.display().to_string());
        argv.extend(args.iter().map(|arg| arg.to_string()));
        let (cli, sources) = parse_cli_from(argv).unwrap();
        resolve_settings(&cli, &sources)
    }

    #[test]
    fn frame_range_parsing() {
        assert_eq!(parse_frame_range("3-10", None).unwrap(), (3, 10));
        assert_eq!(parse_frame_range(" 0 - 5 ", None).unwrap(), (0, 5));
        assert_eq!(parse_frame_range("", None).unwrap(), (0, -1));
        assert_eq!(parse_frame_range("1-2-3", None).unwrap(), (0, -1));
        assert!(matches!(
            parse_frame_range("a-3", None),
            Err(ConfigError::InvalidValue { field: "frames", .. })
        ));
    }

    #[test]
    fn file_values_fill_unset_options() {
        let settings = settings_with(
            &[],
            "after_dir = \"reviewed\"\ncost_new_box = 2.5\nbox_change_high_threshold = 0.6\n",
            false,
        )
        .unwrap();
        assert_eq!(settings.rates.cost_new_box, 2.5);
        assert_eq!(settings.rates.cost_diff_box, 0.4);
        assert_eq!(settings.high_threshold, 0.6);
        assert_eq!(settings.low_threshold, 0.1);
        let config_dir = settings.config_dir.clone().unwrap();
        assert_eq!(settings.after_dir, config_dir.join("reviewed"));
        assert!(settings.before_dir.is_none());
        assert!(settings.have_preannotated);
        assert!(settings.descend);
    }

    #[test]
    fn command_line_wins_over_file() {
        let settings = settings_with(
            &["--cost-new-box", "0.9", "--after", "/data/reviewed"],
            "after_dir = \"reviewed\"\ncost_new_box = 2.5\n",
            false,
        )
        .unwrap();
        assert_eq!(settings.rates.cost_new_box, 0.9);
        assert_eq!(settings.after_dir, PathBuf::from("/data/reviewed"));
    }

    #[test]
    fn yaml_config_accepts_legacy_keys() {
        let settings = settings_with(
            &[],
            "initial_labels_dir: /data/before\n\
             final_labels_dir: /data/after\n\
             have_preannotated: false\n\
             frames: \"2-8\"\n",
            true,
        )
        .unwrap();
        assert_eq!(settings.before_dir, Some(PathBuf::from("/data/before")));
        assert_eq!(settings.after_dir, PathBuf::from("/data/after"));
        assert!(!settings.have_preannotated);
        assert_eq!((settings.frames_from, settings.frames_to), (2, 8));
    }

    #[test]
    fn increased_frames_counts_from_range_start() {
        let settings = settings_with(
            &["--frames", "5-20", "--increased-frames", "3"],
            "after_dir = \"reviewed\"\n",
            false,
        )
        .unwrap();
        assert_eq!((settings.increased_from, settings.increased_to), (5, 8));
    }

    #[test]
    fn zero_increased_frames_disables_bonus() {
        let settings = settings_with(
            &[],
            "after_dir = \"reviewed\"\nincreased_frames = 0\n",
            false,
        )
        .unwrap();
        assert_eq!((settings.increased_from, settings.increased_to), (-1, -1));

        let settings = settings_with(
            &["--frames", "5-20", "--increased-frames", "0"],
            "after_dir = \"reviewed\"\n",
            false,
        )
        .unwrap();
        assert_eq!((settings.increased_from, settings.increased_to), (-1, -1));
    }

    #[test]
    fn explicit_bonus_bounds_beat_shorthand() {
        let settings = settings_with(
            &["--increased-from", "1", "--increased-to", "2"],
            "after_dir = \"reviewed\"\nincreased_frames = 10\n",
            false,
        )
        .unwrap();
        assert_eq!((settings.increased_from, settings.increased_to), (1, 2));
    }

    #[test]
    fn bonus_window_disabled_by_default() {
        let settings = settings_with(&[], "after_dir = \"reviewed\"\n", false).unwrap();
        assert_eq!((settings.increased_from, settings.increased_to), (-1, -1));
        assert_eq!((settings.frames_from, settings.frames_to), (0, -1));
    }

    #[test]
    fn missing_after_dir_is_reported() {
        let err = settings_with(&[], "cost_new_box = 1.0\n", false).unwrap_err();
        assert!(matches!(err, ConfigError::MissingValue { field: "after_dir" }));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = settings_with(&[], "after_dir = [", false).unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
    }

    #[test]
    fn report_settings_follow_flags() {
        let settings = settings_with(
            &["--compact"],
            "after_dir = \"reviewed\"\n[report]\njson = \"out/report.json\"\n",
            false,
        )
        .unwrap();
        let report = settings.report.unwrap();
        assert!(!report.pretty);
        assert!(report.path.ends_with("out/report.json"));
    }

    #[test]
    fn missing_override_config_is_not_found() {
        let (cli, sources) = parse_cli_from([
            "label-audit",
            "--config",
            "/nonexistent/label-audit/config.toml",
        ])
        .unwrap();
        let err = resolve_settings(&cli, &sources).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }
}
