//! Structured logging for test runs.
//!
//! The shim crates emit `tracing` events at their seams: a mock time being
//! set or cleared, an input read as absent or rejected, a redirect being
//! intercepted. This module installs a subscriber that prints them.
//!
//! # Example
//!
//! ```rust,ignore
//! use lms_testkit_telemetry::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::debug!(mock_time = 1_577_836_800, "mock time set");
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::TestWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directives (e.g., "info", "lms_testkit_clock=trace").
    pub level: String,

    /// Whether to output JSON format.
    pub json_format: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include target (module path).
    pub include_target: bool,

    /// Whether to write through the test harness capture instead of stdout.
    pub with_test_writer: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            file_line_info: false,
            include_target: true,
            with_test_writer: false,
        }
    }
}

impl LogConfig {
    /// Human-readable output with debug events, for local runs.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            json_format: false,
            file_line_info: true,
            include_target: true,
            with_test_writer: true,
        }
    }

    /// JSON output at warn level, for CI logs.
    #[must_use]
    pub fn ci() -> Self {
        Self {
            enabled: true,
            level: "warn".to_string(),
            json_format: true,
            file_line_info: false,
            include_target: true,
            with_test_writer: true,
        }
    }
}

/// Initializes the logging subsystem.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidFilter` if the level does not parse, and
/// `TelemetryError::LoggingInit` if a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;
    let writer = if config.with_test_writer {
        BoxMakeWriter::new(TestWriter::new())
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };

    if config.json_format {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(writer)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    }

    Ok(())
}

/// Installs test logging once per process.
///
/// Uses `RUST_LOG` when set, otherwise the development preset. Later calls
/// are no-ops. Returns true if this call installed the subscriber.
pub fn try_init_for_tests() -> bool {
    let mut config = LogConfig::development();
    if let Ok(directives) = std::env::var("RUST_LOG") {
        config.level = directives;
    }
    init_logging(&config).is_ok()
}

/// Creates an env filter from a directive string.
///
/// # Errors
///
/// Returns error if the filter string is invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter).map_err(|e| TelemetryError::InvalidFilter(format!("{filter}: {e}")))
}

/// Standard log field names used by the shim crates.
pub mod fields {
    /// Mocked timestamp field name.
    pub const MOCK_TIME: &str = "mock_time";

    /// Input source field name.
    pub const SOURCE: &str = "source";

    /// Input name field name.
    pub const INPUT: &str = "input";

    /// Filter name field name.
    pub const FILTER: &str = "filter";

    /// Redirect location field name.
    pub const LOCATION: &str = "location";

    /// Redirect status field name.
    pub const STATUS: &str = "status";

    /// Safe-redirect flag field name.
    pub const SAFE: &str = "safe";
}
