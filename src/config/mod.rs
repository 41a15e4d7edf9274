//! Configuration loading and validation.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Calendar constants driving unit conversion and week bucketing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Working hours in one day ("1d" in a duration token)
    #[serde(default = "default_hours_per_day")]
    pub hours_per_day: u32,

    /// Working days in one week ("1w")
    #[serde(default = "default_days_per_week")]
    pub days_per_week: u32,

    /// Weeks in one month ("1mo")
    #[serde(default = "default_weeks_per_month")]
    pub weeks_per_month: u32,

    /// First day of the project; week 1 starts here
    #[serde(default = "default_project_start")]
    pub project_start: NaiveDate,

    /// Last day of the project; bounds the week matrix
    #[serde(default = "default_project_end")]
    pub project_end: NaiveDate,
}

fn default_hours_per_day() -> u32 {
    8
}

fn default_days_per_week() -> u32 {
    5
}

fn default_weeks_per_month() -> u32 {
    4
}

fn default_project_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 2, 22).unwrap()
}

fn default_project_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 6, 10).unwrap()
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            hours_per_day: default_hours_per_day(),
            days_per_week: default_days_per_week(),
            weeks_per_month: default_weeks_per_month(),
            project_start: default_project_start(),
            project_end: default_project_end(),
        }
    }
}

impl CalendarConfig {
    /// Validate the calendar constants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hours_per_day == 0 || self.days_per_week == 0 || self.weeks_per_month == 0 {
            return Err(ConfigError::ValidationError(
                "hours_per_day, days_per_week and weeks_per_month must be positive".to_string(),
            ));
        }
        if self.project_end < self.project_start {
            return Err(ConfigError::ValidationError(format!(
                "project_end {} precedes project_start {}",
                self.project_end, self.project_start
            )));
        }
        Ok(())
    }
}

/// Ignore lists, rounding and naming options for report views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Usernames excluded from every aggregation
    #[serde(default)]
    pub ignore_users: Vec<String>,

    /// Milestones excluded from every aggregation
    #[serde(default)]
    pub ignore_milestones: Vec<String>,

    /// Labels excluded from every aggregation
    #[serde(default)]
    pub ignore_labels: Vec<String>,

    /// Drop issues with a zero estimate from the per-issue view
    #[serde(default = "default_ignore_empty_issues")]
    pub ignore_empty_issues: bool,

    /// Decimal places for displayed hour values
    #[serde(default = "default_round_to_decimals")]
    pub round_to_decimals: u32,

    /// Explicit milestone ordering; when empty, first-seen order over the
    /// issues is used
    #[serde(default)]
    pub milestones_in_order: Vec<String>,

    /// Raw username to display name
    #[serde(default)]
    pub username_mapping: HashMap<String, String>,
}

fn default_ignore_empty_issues() -> bool {
    true
}

fn default_round_to_decimals() -> u32 {
    2
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            ignore_users: Vec::new(),
            ignore_milestones: Vec::new(),
            ignore_labels: Vec::new(),
            ignore_empty_issues: default_ignore_empty_issues(),
            round_to_decimals: default_round_to_decimals(),
            milestones_in_order: Vec::new(),
            username_mapping: HashMap::new(),
        }
    }
}

/// Per-issue date expectations for the data-health checks.
///
/// Maps are keyed by issue iid (as a string, the way the checks are written
/// down in the config file). An issue without an entry is not checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Every record of the issue is expected to be logged on this date
    #[serde(default)]
    pub issue_happening_date: HashMap<String, NaiveDate>,

    /// No record of the issue may be dated before this
    #[serde(default)]
    pub issue_minimum_date: HashMap<String, NaiveDate>,

    /// No record of the issue may be dated after this
    #[serde(default)]
    pub issue_maximum_date: HashMap<String, NaiveDate>,

    /// Flag records carrying the zero placeholder date
    #[serde(default = "default_check_zero_dates")]
    pub check_zero_dates: bool,
}

fn default_check_zero_dates() -> bool {
    true
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            issue_happening_date: HashMap::new(),
            issue_minimum_date: HashMap::new(),
            issue_maximum_date: HashMap::new(),
            check_zero_dates: default_check_zero_dates(),
        }
    }
}

/// Top-level configuration as loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub calendar: CalendarConfig,

    #[serde(default)]
    pub filters: FilterConfig,

    #[serde(default)]
    pub health: HealthConfig,
}

impl ReportConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the loaded configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.calendar.validate()
    }
}
