//! Engine configuration.
//!
//! All tunables of a run live in [`EngineConfig`], which is passed
//! explicitly to the engine. Defaults match the department's policy;
//! [`EngineConfig::from_env`] overlays `U_TIMETABLE_*` variables.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Tunables of a scheduling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum exams a student may sit per day.
    pub student_daily_cap: u32,
    /// Maximum invigilations a professor may perform per day.
    pub professor_daily_cap: u32,
    /// Exam length in minutes (informational; slots shorter than this are logged).
    pub exam_duration_minutes: u32,
    /// Wall-clock budget of a run, measured from its start (ms).
    pub time_budget_ms: u64,
    /// Fraction of the budget after which the remainder is placed round-robin.
    pub fallback_threshold: f64,
    /// Soft ceiling of exams per day. `None` = modules / exam days, rounded up.
    pub max_exams_per_day: Option<u32>,
    /// Treat modules of one formation as sharing the formation's students.
    pub couple_formation_modules: bool,
    /// Capacity overruns up to this fraction of the room are minor.
    pub minor_capacity_margin: f64,
    /// Add one assistant invigilator per this many students above it.
    pub assistant_threshold: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            student_daily_cap: 1,
            professor_daily_cap: 3,
            exam_duration_minutes: 90,
            time_budget_ms: 45_000,
            fallback_threshold: 0.8,
            max_exams_per_day: None,
            couple_formation_modules: true,
            minor_capacity_margin: 0.10,
            assistant_threshold: None,
        }
    }
}

impl EngineConfig {
    /// Loads defaults overlaid with `U_TIMETABLE_*` environment variables.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `U_TIMETABLE_STUDENT_DAILY_CAP` | `student_daily_cap` |
    /// | `U_TIMETABLE_PROFESSOR_DAILY_CAP` | `professor_daily_cap` |
    /// | `U_TIMETABLE_EXAM_MINUTES` | `exam_duration_minutes` |
    /// | `U_TIMETABLE_TIME_BUDGET_MS` | `time_budget_ms` |
    /// | `U_TIMETABLE_FALLBACK_THRESHOLD` | `fallback_threshold` |
    /// | `U_TIMETABLE_MAX_EXAMS_PER_DAY` | `max_exams_per_day` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = parse_var("U_TIMETABLE_STUDENT_DAILY_CAP")? {
            config.student_daily_cap = v;
        }
        if let Some(v) = parse_var("U_TIMETABLE_PROFESSOR_DAILY_CAP")? {
            config.professor_daily_cap = v;
        }
        if let Some(v) = parse_var("U_TIMETABLE_EXAM_MINUTES")? {
            config.exam_duration_minutes = v;
        }
        if let Some(v) = parse_var("U_TIMETABLE_TIME_BUDGET_MS")? {
            config.time_budget_ms = v;
        }
        if let Some(v) = parse_var("U_TIMETABLE_FALLBACK_THRESHOLD")? {
            config.fallback_threshold = v;
        }
        if let Some(v) = parse_var("U_TIMETABLE_MAX_EXAMS_PER_DAY")? {
            config.max_exams_per_day = Some(v);
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.student_daily_cap == 0 {
            return Err(ConfigError::OutOfRange {
                field: "student_daily_cap",
                reason: "must be at least 1",
            });
        }
        if self.professor_daily_cap == 0 {
            return Err(ConfigError::OutOfRange {
                field: "professor_daily_cap",
                reason: "must be at least 1",
            });
        }
        if !(0.0..=1.0).contains(&self.fallback_threshold) {
            return Err(ConfigError::OutOfRange {
                field: "fallback_threshold",
                reason: "must be within 0.0..=1.0",
            });
        }
        if self.minor_capacity_margin < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "minor_capacity_margin",
                reason: "must not be negative",
            });
        }
        Ok(())
    }

    /// Full run budget.
    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }

    /// Elapsed time after which the allocator switches to round-robin.
    pub fn fallback_after(&self) -> Duration {
        self.time_budget().mul_f64(self.fallback_threshold)
    }

    /// Sets the allocation budget.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget_ms = u64::try_from(budget.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the professor daily cap.
    pub fn with_professor_daily_cap(mut self, cap: u32) -> Self {
        self.professor_daily_cap = cap;
        self
    }

    /// Sets the student daily cap.
    pub fn with_student_daily_cap(mut self, cap: u32) -> Self {
        self.student_daily_cap = cap;
        self
    }

    /// Sets the exams-per-day ceiling.
    pub fn with_max_exams_per_day(mut self, ceiling: u32) -> Self {
        self.max_exams_per_day = Some(ceiling);
        self
    }

    /// Sets the assistant threshold.
    pub fn with_assistant_threshold(mut self, threshold: u32) -> Self {
        self.assistant_threshold = Some(threshold);
        self
    }

    /// Enables or disables formation coupling.
    pub fn with_formation_coupling(mut self, enabled: bool) -> Self {
        self.couple_formation_modules = enabled;
        self
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        Err(_) => Ok(None),
    }
}

/// Configuration errors.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{name} has an invalid value: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("{field} {reason}")]
    OutOfRange {
        field: &'static str,
        reason: &'static str,
    },
}
