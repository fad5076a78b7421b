//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use chrono::FixedOffset;
use lms_testkit_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Largest offset accepted for a time zone, in minutes.
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Clock section.
///
/// Offsets are written as `+HH:MM` or `-HH:MM`.
///
/// # Example
///
/// ```
/// use lms_testkit_config::ClockConfig;
///
/// let clock = ClockConfig {
///     default_offset: "+00:00".to_string(),
///     site_offset: "-05:00".to_string(),
/// };
/// assert_eq!(clock.site_fixed_offset().unwrap().local_minus_utc(), -5 * 3600);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClockConfig {
    /// Zone used to render mocked times.
    #[serde(default = "default_offset")]
    pub default_offset: String,

    /// Site zone used for local (non-GMT) answers when unmocked.
    #[serde(default = "default_offset")]
    pub site_offset: String,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            default_offset: default_offset(),
            site_offset: default_offset(),
        }
    }
}

impl ClockConfig {
    /// Parses `default_offset`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the offset is malformed.
    pub fn default_fixed_offset(&self) -> Result<FixedOffset, ConfigError> {
        parse_offset(&self.default_offset)
            .ok_or_else(|| ConfigError::invalid_value("clock.default_offset", offset_reason(&self.default_offset)))
    }

    /// Parses `site_offset`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the offset is malformed.
    pub fn site_fixed_offset(&self) -> Result<FixedOffset, ConfigError> {
        parse_offset(&self.site_offset)
            .ok_or_else(|| ConfigError::invalid_value("clock.site_offset", offset_reason(&self.site_offset)))
    }
}

fn default_offset() -> String {
    "+00:00".to_string()
}

fn offset_reason(value: &str) -> String {
    format!("expected +HH:MM or -HH:MM within 14 hours, got {value:?}")
}

/// Parses `±HH:MM` into an offset.
pub fn parse_offset(value: &str) -> Option<FixedOffset> {
    let (sign, rest) = match value.as_bytes().first()? {
        b'+' => (1, &value[1..]),
        b'-' => (-1, &value[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    let two_digits = |field: &str| field.len() == 2 && field.bytes().all(|b| b.is_ascii_digit());
    if !two_digits(hours) || !two_digits(minutes) {
        return None;
    }

    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if minutes >= 60 {
        return None;
    }

    let total = hours * 60 + minutes;
    if total > MAX_OFFSET_MINUTES {
        return None;
    }
    FixedOffset::east_opt(sign * total * 60)
}

/// Redirect section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RedirectConfig {
    /// Status used when a redirect does not set one.
    #[serde(default = "default_status")]
    pub default_status: u16,

    /// Safe flag used when a redirect does not set one.
    #[serde(default = "default_true")]
    pub default_safe: bool,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            default_status: default_status(),
            default_safe: true,
        }
    }
}

fn default_status() -> u16 {
    302
}

fn default_true() -> bool {
    true
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (CI).
    Json,
    /// Human-readable pretty format (local runs).
    #[default]
    Pretty,
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default)]
    pub enabled: bool,

    /// Filter directives (trace, debug, info, warn, error, or per-target).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LoggingConfig {
    /// Converts to the telemetry crate's settings.
    ///
    /// Output always goes through the test capture.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            json_format: self.format == LogFormat::Json,
            file_line_info: self.include_location,
            include_target: true,
            with_test_writer: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_defaults() {
        let clock = ClockConfig::default();
        assert_eq!(clock.default_offset, "+00:00");
        assert_eq!(clock.default_fixed_offset().unwrap().local_minus_utc(), 0);
    }

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("+05:30").map(|o| o.local_minus_utc()), Some(19_800));
        assert_eq!(parse_offset("-08:00").map(|o| o.local_minus_utc()), Some(-28_800));
        assert_eq!(parse_offset("+14:00").map(|o| o.local_minus_utc()), Some(50_400));
        assert!(parse_offset("+14:01").is_none());
        assert!(parse_offset("05:30").is_none());
        assert!(parse_offset("+5:30").is_none());
        assert!(parse_offset("+05:60").is_none());
        assert!(parse_offset("UTC").is_none());
        assert!(parse_offset("").is_none());
    }

    #[test]
    fn test_parse_offset_rejects_signed_fields() {
        assert!(parse_offset("+-1:00").is_none());
        assert!(parse_offset("-+1:00").is_none());
        assert!(parse_offset("+01:+5").is_none());
        assert!(parse_offset("+01:-5").is_none());
    }

    #[test]
    fn test_invalid_offset_names_field() {
        let clock = ClockConfig {
            site_offset: "nope".to_string(),
            ..Default::default()
        };
        let err = clock.site_fixed_offset().unwrap_err();
        assert!(err.to_string().contains("clock.site_offset"));
    }

    #[test]
    fn test_redirect_defaults() {
        let redirect = RedirectConfig::default();
        assert_eq!(redirect.default_status, 302);
        assert!(redirect.default_safe);
    }

    #[test]
    fn test_log_format_deserialize() {
        let format: LogFormat = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(format, LogFormat::Json);

        let format: LogFormat = serde_json::from_str(r#""pretty""#).unwrap();
        assert_eq!(format, LogFormat::Pretty);
    }

    #[test]
    fn test_to_log_config() {
        let logging = LoggingConfig {
            enabled: true,
            level: "lms_testkit_input=trace".to_string(),
            format: LogFormat::Json,
            include_location: true,
        };
        let config = logging.to_log_config();
        assert!(config.enabled);
        assert!(config.json_format);
        assert!(config.file_line_info);
        assert!(config.with_test_writer);
        assert_eq!(config.level, "lms_testkit_input=trace");
    }
}
