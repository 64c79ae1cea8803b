//! Task configuration: the JSON document and its validated, typed form.
//!
//! The document is intentionally flat. Durations are plain numbers with the
//! unit in the field name; everything except `task_id` and `target_instant`
//! has a default. `surface` is opaque to the core and handed to the driver.

use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::civil::{self, DEFAULT_UTC_OFFSET_MINUTES};
use super::ids::TaskId;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config is not valid JSON for a task: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid `{field}`: {reason}")]
    Field { field: &'static str, reason: String },
}

impl ConfigError {
    fn field(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Field {
            field,
            reason: reason.into(),
        }
    }
}

/// Raw configuration document as supplied on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfigDocument {
    pub task_id: String,

    /// Civil wall-clock time the window opens: `YYYY-MM-DD HH:MM:SS`.
    pub target_instant: String,

    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,

    #[serde(default = "default_lead_offset_secs")]
    pub lead_offset_secs: f64,

    #[serde(default = "default_engage_lead_ms")]
    pub engage_lead_ms: u64,

    #[serde(default)]
    pub flying_bias_secs: f64,

    #[serde(default)]
    pub confirm_final_step: bool,

    #[serde(default = "default_retry_budget_secs")]
    pub retry_budget_secs: f64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    #[serde(default)]
    pub surface: serde_json::Value,
}

fn default_utc_offset_minutes() -> i32 {
    DEFAULT_UTC_OFFSET_MINUTES
}

fn default_lead_offset_secs() -> f64 {
    120.0
}

fn default_engage_lead_ms() -> u64 {
    1_000
}

fn default_retry_budget_secs() -> f64 {
    60.0
}

fn default_max_attempts() -> u32 {
    1_000_000
}

fn default_backoff_ms() -> u64 {
    50
}

/// Immutable, validated task configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskConfig {
    pub task_id: TaskId,
    pub target_instant: DateTime<FixedOffset>,
    /// Setup must be complete this long before the target.
    pub lead_offset: Duration,
    /// How far before the target the engage instant sits.
    pub engage_lead: Duration,
    /// Extra delay after the engage instant before the first attempt.
    pub flying_bias: Duration,
    /// When false the run stops one step short of the irreversible commit.
    pub confirm_final_step: bool,
    pub retry_budget: Duration,
    pub max_attempts: u32,
    pub backoff: Duration,
    pub surface: serde_json::Value,
}

impl TaskConfig {
    /// Config with the document defaults for everything but id and target.
    pub fn new(task_id: TaskId, target_instant: DateTime<FixedOffset>) -> Self {
        Self {
            task_id,
            target_instant,
            lead_offset: Duration::from_secs_f64(default_lead_offset_secs()),
            engage_lead: Duration::from_millis(default_engage_lead_ms()),
            flying_bias: Duration::ZERO,
            confirm_final_step: false,
            retry_budget: Duration::from_secs_f64(default_retry_budget_secs()),
            max_attempts: default_max_attempts(),
            backoff: Duration::from_millis(default_backoff_ms()),
            surface: serde_json::Value::Null,
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let doc: TaskConfigDocument = serde_json::from_str(raw)?;
        doc.validate()
    }

    pub fn with_lead_offset(mut self, lead_offset: Duration) -> Self {
        self.lead_offset = lead_offset;
        self
    }

    pub fn with_engage_lead(mut self, engage_lead: Duration) -> Self {
        self.engage_lead = engage_lead;
        self
    }

    pub fn with_flying_bias(mut self, flying_bias: Duration) -> Self {
        self.flying_bias = flying_bias;
        self
    }

    pub fn with_confirm_final_step(mut self, confirm: bool) -> Self {
        self.confirm_final_step = confirm;
        self
    }

    pub fn with_retry_budget(mut self, retry_budget: Duration) -> Self {
        self.retry_budget = retry_budget;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }
}

impl TaskConfigDocument {
    pub fn validate(self) -> Result<TaskConfig, ConfigError> {
        let task_id =
            TaskId::new(self.task_id).map_err(|e| ConfigError::field("task_id", e.to_string()))?;

        let offset = civil::offset_from_minutes(self.utc_offset_minutes).ok_or_else(|| {
            ConfigError::field("utc_offset_minutes", "must be within (-1440, 1440)")
        })?;
        let target_instant = civil::parse_target(&self.target_instant, offset).map_err(|e| {
            ConfigError::field(
                "target_instant",
                format!("expected \"YYYY-MM-DD HH:MM:SS\": {e}"),
            )
        })?;

        let lead_offset = non_negative_secs("lead_offset_secs", self.lead_offset_secs)?;
        let flying_bias = non_negative_secs("flying_bias_secs", self.flying_bias_secs)?;
        let retry_budget = non_negative_secs("retry_budget_secs", self.retry_budget_secs)?;
        if retry_budget.is_zero() {
            return Err(ConfigError::field("retry_budget_secs", "must be greater than 0"));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::field("max_attempts", "must be at least 1"));
        }

        Ok(TaskConfig {
            task_id,
            target_instant,
            lead_offset,
            engage_lead: Duration::from_millis(self.engage_lead_ms),
            flying_bias,
            confirm_final_step: self.confirm_final_step,
            retry_budget,
            max_attempts: self.max_attempts,
            backoff: Duration::from_millis(self.backoff_ms),
            surface: self.surface,
        })
    }
}

fn non_negative_secs(field: &'static str, secs: f64) -> Result<Duration, ConfigError> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(ConfigError::field(field, "must be a finite number >= 0"));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| ConfigError::field(field, e.to_string()))
}

/// Best-effort extraction of `task_id` from a document that failed to load,
/// so the failure can still be recorded under the right status key.
pub fn recover_task_id(raw: &str) -> Option<TaskId> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    let id = value.get("task_id")?.as_str()?;
    TaskId::new(id).ok()
}

/// Civil offset of a document that failed to load: its `utc_offset_minutes`
/// when readable and in range, otherwise the default.
pub fn recover_utc_offset(raw: &str) -> FixedOffset {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|value| value.get("utc_offset_minutes")?.as_i64())
        .and_then(|minutes| i32::try_from(minutes).ok())
        .and_then(civil::offset_from_minutes)
        .unwrap_or_else(civil::default_offset)
}
