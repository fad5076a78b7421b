//! Harness error types.

use lms_testkit_config::ConfigError;
use lms_testkit_telemetry::TelemetryError;
use thiserror::Error;

/// Errors that can occur while setting up a test.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Configuration failed to load or validate.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logging could not be installed.
    #[error("Logging error: {0}")]
    Telemetry(#[from] TelemetryError),

    /// Request building failed.
    #[error("Request build error: {0}")]
    RequestBuild(String),

    /// Header name or value is invalid.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Body encoding failed.
    #[error("Body encoding error: {0}")]
    BodyEncode(String),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HarnessError::InvalidHeader("bad\nname".to_string());
        assert_eq!(err.to_string(), "Invalid header: bad\nname");

        let err = HarnessError::from(ConfigError::invalid_value("clock.site_offset", "bad"));
        assert!(err.to_string().starts_with("Configuration error:"));
    }
}
