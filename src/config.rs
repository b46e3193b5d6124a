//! Workflow settings for the boundary layer.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use thiserror::Error;

pub const ENV_MAX_CONFLICT_RETRIES: &str = "DEAL_WORKFLOW_MAX_CONFLICT_RETRIES";
pub const ENV_MAX_NOTES_LEN: &str = "DEAL_WORKFLOW_MAX_NOTES_LEN";
pub const ENV_MAX_REASON_LEN: &str = "DEAL_WORKFLOW_MAX_REASON_LEN";
pub const ENV_REQUIRE_CANCEL_REASON: &str = "DEAL_WORKFLOW_REQUIRE_CANCEL_REASON";

/// Limits and policies applied by [`DealService`](crate::boundary::DealService).
///
/// The engine itself takes no configuration; these settings only shape
/// request validation and the optimistic-concurrency loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Reload-and-retry attempts after a version conflict
    pub max_conflict_retries: u32,
    /// Maximum length of free-text notes, in characters
    pub max_notes_len: usize,
    /// Maximum length of a cancellation reason, in characters
    pub max_reason_len: usize,
    pub require_cancel_reason: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: 3,
            max_notes_len: 2000,
            max_reason_len: 500,
            require_cancel_reason: true,
        }
    }
}

impl WorkflowConfig {
    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(ConfigError::Json)
    }

    /// Defaults overridden by any `DEAL_WORKFLOW_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(value) = env_value(ENV_MAX_CONFLICT_RETRIES)? {
            self.max_conflict_retries = value;
        }
        if let Some(value) = env_value(ENV_MAX_NOTES_LEN)? {
            self.max_notes_len = value;
        }
        if let Some(value) = env_value(ENV_MAX_REASON_LEN)? {
            self.max_reason_len = value;
        }
        if let Some(raw) = env_raw(ENV_REQUIRE_CANCEL_REASON) {
            self.require_cancel_reason = parse_flag(&raw).ok_or(ConfigError::InvalidValue {
                key: ENV_REQUIRE_CANCEL_REASON,
                value: raw,
            })?;
        }
        Ok(self)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value '{value}'")]
    InvalidValue { key: &'static str, value: String },

    #[error("invalid workflow configuration: {0}")]
    Json(#[source] serde_json::Error),
}

fn env_raw(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_value<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env_raw(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        None => Ok(None),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
