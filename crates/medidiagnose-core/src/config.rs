//! Client configuration.
//!
//! Resolved once at startup (environment first, defaults otherwise) and passed
//! into the history store, report generator and API client. Nothing below this
//! module reads environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use thiserror::Error;

pub const ENV_API_URL: &str = "MEDIDIAGNOSE_API_URL";
pub const ENV_SYMPTOM_CHECK_URL: &str = "MEDIDIAGNOSE_SYMPTOM_CHECK_URL";
pub const ENV_TIMEOUT_MS: &str = "MEDIDIAGNOSE_TIMEOUT_MS";
pub const ENV_SIMULATED_DELAY_MS: &str = "MEDIDIAGNOSE_SIMULATED_DELAY_MS";
pub const ENV_HISTORY_CAPACITY: &str = "MEDIDIAGNOSE_HISTORY_CAPACITY";
pub const ENV_MAX_UPLOAD_BYTES: &str = "MEDIDIAGNOSE_MAX_UPLOAD_BYTES";
pub const ENV_DB_PATH: &str = "MEDIDIAGNOSE_DB_PATH";
pub const ENV_REPORT_UTC_OFFSET_MINUTES: &str = "MEDIDIAGNOSE_REPORT_UTC_OFFSET_MINUTES";
pub const ENV_REPORT_ZONE: &str = "MEDIDIAGNOSE_REPORT_ZONE";

/// Configuration errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: String, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Runtime configuration for the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the generic API layer
    pub api_base_url: String,
    /// Endpoint accepting multipart symptom checks
    pub symptom_check_url: String,
    pub request_timeout: Duration,
    /// Artificial latency before the offline engine answers
    pub simulated_delay: Duration,
    /// Most recent entries kept by the history store
    pub history_capacity: usize,
    /// Upload ceiling enforced by the intake flow
    pub max_upload_bytes: u64,
    pub database_path: PathBuf,
    /// Offset used for report timestamps, in minutes east of UTC
    pub report_utc_offset_minutes: i32,
    pub report_zone_label: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.medidiagnose.com/v1".into(),
            symptom_check_url: "http://localhost:3000/symptom-check".into(),
            request_timeout: Duration::from_millis(10_000),
            simulated_delay: Duration::from_millis(2_000),
            history_capacity: 10,
            max_upload_bytes: 10 * 1024 * 1024,
            database_path: PathBuf::from("medidiagnose.db"),
            report_utc_offset_minutes: 330,
            report_zone_label: "IST".into(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by any `MEDIDIAGNOSE_*` variables that are set.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL) {
            config.api_base_url = url;
        }
        if let Some(url) = lookup(ENV_SYMPTOM_CHECK_URL) {
            config.symptom_check_url = url;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_TIMEOUT_MS)? {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_SIMULATED_DELAY_MS)? {
            config.simulated_delay = Duration::from_millis(ms);
        }
        if let Some(capacity) = parse_var(&lookup, ENV_HISTORY_CAPACITY)? {
            config.history_capacity = capacity;
        }
        if let Some(bytes) = parse_var(&lookup, ENV_MAX_UPLOAD_BYTES)? {
            config.max_upload_bytes = bytes;
        }
        if let Some(path) = lookup(ENV_DB_PATH) {
            config.database_path = PathBuf::from(path);
        }
        if let Some(minutes) = parse_var::<i32, _>(&lookup, ENV_REPORT_UTC_OFFSET_MINUTES)? {
            if offset_from_minutes(minutes).is_none() {
                return Err(invalid(ENV_REPORT_UTC_OFFSET_MINUTES, minutes.to_string()));
            }
            config.report_utc_offset_minutes = minutes;
        }
        if let Some(label) = lookup(ENV_REPORT_ZONE) {
            config.report_zone_label = label;
        }

        Ok(config)
    }

    /// Fixed offset for report timestamps. Falls back to UTC if out of range.
    pub fn report_offset(&self) -> FixedOffset {
        offset_from_minutes(self.report_utc_offset_minutes).unwrap_or(Utc.fix())
    }
}

fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    minutes.checked_mul(60).and_then(FixedOffset::east_opt)
}

fn parse_var<T, F>(lookup: &F, key: &str) -> ConfigResult<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(key, raw)),
    }
}

fn invalid(key: &str, value: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        value: value.into(),
    }
}
