use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::pr::{RepoRef, SelectionPolicy, StateFilter, DEFAULT_API_URL};

pub const CONFIG_FILE: &str = ".pr-changelog.toml";
pub const DEFAULT_DAYS_BACK: i64 = 7;
pub const DEFAULT_OUTPUT: &str = "CHANGELOG.md";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("GitHub token not found: set the github-token input, --token or GITHUB_TOKEN")]
    MissingToken,

    #[error("Repository not set: pass --repo owner/name or set GITHUB_REPOSITORY")]
    MissingRepository,

    #[error("Invalid repository '{0}', expected owner/name")]
    InvalidRepository(String),

    #[error("Invalid state '{0}', expected open, closed or all")]
    InvalidState(String),

    #[error("Invalid days-back '{0}', expected a non-negative whole number")]
    InvalidDaysBack(String),

    #[error("Invalid date-range '{0}', expected MM/DD/YYYY-MM/DD/YYYY")]
    InvalidDateRange(String),

    #[error("Invalid date '{0}', expected MM/DD/YYYY")]
    InvalidDate(String),

    #[error("Date '{0}' must use a four-digit year (MM/DD/YYYY)")]
    AmbiguousYear(String),

    #[error("Unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("The start or end of {date} does not exist in timezone {tz}")]
    NonexistentLocalTime { date: NaiveDate, tz: Tz },
}

/// Configuration file contents (.pr-changelog.toml).
/// All fields are optional, the tool can run from inputs and env alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub selection: SelectionConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. Lowest precedence: inputs and GITHUB_TOKEN win.
    pub token: Option<String>,
    pub api_url: Option<String>,
    /// `owner/name`
    pub repository: Option<String>,
    pub branch: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectionConfig {
    pub state: Option<String>,
    pub days_back: Option<u32>,
    /// `MM/DD/YYYY-MM/DD/YYYY`, overrides days_back
    pub date_range: Option<String>,
    /// IANA name used to interpret date_range, e.g. "America/New_York"
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Base name, `.md` is appended
    pub md_output_name: Option<String>,
    /// Used verbatim
    pub file_output_name: Option<String>,
}

/// Values given directly on the command line. These win over everything.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub token: Option<String>,
    pub repository: Option<String>,
    pub api_url: Option<String>,
    pub branch: Option<String>,
    pub state: Option<String>,
    pub days_back: Option<String>,
    pub date_range: Option<String>,
    pub timezone: Option<String>,
    pub md_output_name: Option<String>,
    pub file_output_name: Option<String>,
}

/// Everything a run needs, fully validated.
#[derive(Debug, Clone)]
pub struct Settings {
    pub token: Option<String>,
    pub repo: RepoRef,
    pub api_url: String,
    pub output_path: PathBuf,
    pub policy: SelectionPolicy,
}

impl Settings {
    pub fn require_token(&self) -> Result<&str, ConfigError> {
        self.token.as_deref().ok_or(ConfigError::MissingToken)
    }
}

impl Config {
    /// Load from `path`, or from .pr-changelog.toml in the current directory.
    /// Returns default config if the default file doesn't exist.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Path::new(CONFIG_FILE);
                if path.exists() {
                    Self::load_from(path)
                } else {
                    Ok(Config::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Layer CLI overrides, host inputs (`INPUT_<NAME>`), conventional
    /// environment variables and this file, then validate.
    ///
    /// `env` is the environment lookup, `now` anchors days-back windows.
    pub fn resolve(
        &self,
        overrides: &Overrides,
        env: &dyn Fn(&str) -> Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Settings, ConfigError> {
        let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let input = |name: &str| lookup(&input_key(name));

        let token = overrides
            .token
            .clone()
            .or_else(|| input("github-token"))
            .or_else(|| input("github_token"))
            .or_else(|| lookup("GITHUB_TOKEN"))
            .or_else(|| self.github.token.clone());

        let repository = overrides
            .repository
            .clone()
            .or_else(|| input("repository"))
            .or_else(|| lookup("GITHUB_REPOSITORY"))
            .or_else(|| self.github.repository.clone())
            .ok_or(ConfigError::MissingRepository)?;
        let repo = parse_repository(&repository)?;

        let api_url = overrides
            .api_url
            .clone()
            .or_else(|| lookup("GITHUB_API_URL"))
            .or_else(|| self.github.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let branch = overrides
            .branch
            .clone()
            .or_else(|| input("branch"))
            .or_else(|| self.github.branch.clone());

        let state = match overrides
            .state
            .clone()
            .or_else(|| input("state"))
            .or_else(|| self.selection.state.clone())
        {
            Some(value) => value
                .parse::<StateFilter>()
                .map_err(|_| ConfigError::InvalidState(value))?,
            None => StateFilter::default(),
        };

        let timezone = overrides
            .timezone
            .clone()
            .or_else(|| input("timezone"))
            .or_else(|| self.selection.timezone.clone());
        let tz = match timezone {
            Some(name) => parse_timezone(&name)?,
            None => Tz::UTC,
        };

        let date_range = overrides
            .date_range
            .clone()
            .or_else(|| input("date-range"))
            .or_else(|| self.selection.date_range.clone());
        let (lower_bound, upper_bound) = match date_range {
            Some(range) => {
                let (start, end) = parse_date_range(&range)?;
                (start_of_day(start, tz)?, Some(end_of_day(end, tz)?))
            }
            None => {
                let days_back = match overrides
                    .days_back
                    .clone()
                    .or_else(|| input("days-back"))
                {
                    Some(value) => parse_days_back(&value)?,
                    None => self
                        .selection
                        .days_back
                        .map(i64::from)
                        .unwrap_or(DEFAULT_DAYS_BACK),
                };
                let lower_bound = Duration::try_days(days_back)
                    .and_then(|window| now.checked_sub_signed(window))
                    .ok_or_else(|| ConfigError::InvalidDaysBack(days_back.to_string()))?;
                (lower_bound, None)
            }
        };

        let file_output_name = overrides
            .file_output_name
            .clone()
            .or_else(|| input("file-output-name"))
            .or_else(|| self.output.file_output_name.clone());
        let md_output_name = overrides
            .md_output_name
            .clone()
            .or_else(|| input("md-output-name"))
            .or_else(|| self.output.md_output_name.clone());
        let output_path = match (file_output_name, md_output_name) {
            (Some(file), _) => PathBuf::from(file),
            (None, Some(base)) => PathBuf::from(format!("{base}.md")),
            (None, None) => PathBuf::from(DEFAULT_OUTPUT),
        };

        Ok(Settings {
            token,
            repo,
            api_url,
            output_path,
            policy: SelectionPolicy {
                lower_bound,
                upper_bound,
                state,
                branch,
            },
        })
    }
}

/// Environment key a CI host uses for an action input.
pub fn input_key(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

pub fn parse_repository(value: &str) -> Result<RepoRef, ConfigError> {
    match value.trim().split_once('/') {
        Some((owner, repo))
            if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
        {
            Ok(RepoRef {
                owner: owner.to_string(),
                repo: repo.trim_end_matches(".git").to_string(),
            })
        }
        _ => Err(ConfigError::InvalidRepository(value.to_string())),
    }
}

fn parse_days_back(value: &str) -> Result<i64, ConfigError> {
    value
        .trim()
        .parse::<u32>()
        .map(i64::from)
        .map_err(|_| ConfigError::InvalidDaysBack(value.to_string()))
}

fn parse_timezone(name: &str) -> Result<Tz, ConfigError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ConfigError::UnknownTimezone(name.to_string()))
}

/// Parse `MM/DD/YYYY`. Two-digit (or any non four-digit) years are rejected
/// rather than guessing a century.
pub fn parse_date(value: &str) -> Result<NaiveDate, ConfigError> {
    let trimmed = value.trim();
    let invalid = || ConfigError::InvalidDate(trimmed.to_string());

    let parts: Vec<&str> = trimmed.split('/').collect();
    let [month, day, year] = parts.as_slice() else {
        return Err(invalid());
    };
    if !year.bytes().all(|b| b.is_ascii_digit()) || year.is_empty() {
        return Err(invalid());
    }
    if year.len() != 4 {
        return Err(ConfigError::AmbiguousYear(trimmed.to_string()));
    }

    let number = |s: &str| -> Option<u32> {
        (!s.is_empty() && s.len() <= 2 && s.bytes().all(|b| b.is_ascii_digit()))
            .then(|| s.parse().ok())
            .flatten()
    };
    let month = number(*month).ok_or_else(invalid)?;
    let day = number(*day).ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Parse `MM/DD/YYYY-MM/DD/YYYY` (whitespace around the dash allowed).
/// The order of the two dates is not checked.
pub fn parse_date_range(value: &str) -> Result<(NaiveDate, NaiveDate), ConfigError> {
    let (start, end) = value
        .split_once('-')
        .ok_or_else(|| ConfigError::InvalidDateRange(value.to_string()))?;
    Ok((parse_date(start)?, parse_date(end)?))
}

fn local_midnight(date: NaiveDate, tz: Tz) -> Result<DateTime<Utc>, ConfigError> {
    tz.from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or(ConfigError::NonexistentLocalTime { date, tz })
}

fn start_of_day(date: NaiveDate, tz: Tz) -> Result<DateTime<Utc>, ConfigError> {
    local_midnight(date, tz)
}

/// Last instant of `date` in `tz`, so the whole end day is in range.
fn end_of_day(date: NaiveDate, tz: Tz) -> Result<DateTime<Utc>, ConfigError> {
    let next = date
        .succ_opt()
        .ok_or_else(|| ConfigError::InvalidDate(date.to_string()))?;
    let next_midnight = local_midnight(next, tz)
        .map_err(|_| ConfigError::NonexistentLocalTime { date, tz })?;
    Ok(next_midnight - Duration::nanoseconds(1))
}

/// Environment lookup backed by the real process environment.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
