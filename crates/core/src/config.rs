//! Sampler configuration
//!
//! [`SamplerConfig`] collects every threshold and feature flag the sampler
//! reads. It deserializes from TOML with per-field defaults, so a host only
//! needs to spell out what it changes:
//!
//! ```
//! use slowsql_core::{RecordSql, SamplerConfig};
//!
//! let config = SamplerConfig::from_toml_str(r#"
//!     record_sql = "raw"
//!     explain_enabled = false
//! "#).unwrap();
//!
//! assert_eq!(config.record_sql, RecordSql::Raw);
//! assert!(!config.explain_enabled);
//! assert_eq!(config.max_sql_length, 16384);
//! ```

use crate::normalize::{ELLIPSIS, MAX_SQL_LENGTH};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// How captured SQL text appears in emitted traces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSql {
    /// Text is sent as captured (after truncation)
    Raw,
    /// Literal values are replaced with `?`
    #[default]
    Obfuscated,
    /// Text is withheld and replaced with a fixed marker
    Off,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML could not be parsed into a config
    #[error("config parse error: {0}")]
    Parse(String),

    /// A field holds a value outside its allowed range
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

/// Sampler thresholds and feature flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplerConfig {
    /// Master switch. A disabled sampler never opens transaction buffers.
    pub enabled: bool,
    /// Queries at or below this duration (seconds) are never recorded
    pub min_report_threshold: f64,
    /// How SQL text is recorded
    pub record_sql: RecordSql,
    /// Whether plans are captured for slow reads
    pub explain_enabled: bool,
    /// Only queries slower than this (seconds) are explained
    pub explain_threshold: f64,
    /// Truncation ceiling for captured SQL, in characters
    pub max_sql_length: usize,
    /// Period of the background harvester, in seconds
    pub harvest_interval_secs: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            enabled: true,
            min_report_threshold: 0.0,
            record_sql: RecordSql::Obfuscated,
            explain_enabled: true,
            explain_threshold: 0.5,
            max_sql_length: MAX_SQL_LENGTH,
            harvest_interval_secs: 60,
        }
    }
}

impl SamplerConfig {
    /// A config with sampling switched off
    pub fn disabled() -> Self {
        SamplerConfig {
            enabled: false,
            ..Default::default()
        }
    }

    /// Defaults with raw SQL recording and no plan capture
    pub fn raw_without_plans() -> Self {
        SamplerConfig {
            record_sql: RecordSql::Raw,
            explain_enabled: false,
            ..Default::default()
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: SamplerConfig =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every field is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_seconds("min_report_threshold", self.min_report_threshold)?;
        check_seconds("explain_threshold", self.explain_threshold)?;

        if self.max_sql_length <= ELLIPSIS.len() {
            return Err(ConfigError::Invalid {
                field: "max_sql_length",
                reason: format!("must be greater than {}", ELLIPSIS.len()),
            });
        }
        if self.harvest_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "harvest_interval_secs",
                reason: "must be at least one second".to_string(),
            });
        }
        Ok(())
    }

    /// Harvest period as a [`Duration`]
    pub fn harvest_interval(&self) -> Duration {
        Duration::from_secs(self.harvest_interval_secs)
    }

    /// Whether a query of this duration is recorded at all
    pub fn is_reportable(&self, duration: Duration) -> bool {
        duration.as_secs_f64() > self.min_report_threshold
    }
}

fn check_seconds(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("expected a non-negative number of seconds, got {}", value),
        });
    }
    Ok(())
}
