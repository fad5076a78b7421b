//! Structured logging for LMS plugin test runs.
//!
//! The clock, input and redirect shims log through `tracing`. This crate
//! wires those events to a `tracing-subscriber` formatter, JSON for CI and
//! pretty output for local debugging, filtered by `EnvFilter` directives.
//!
//! # Example
//!
//! ```rust
//! use lms_testkit_telemetry::{init_logging, LogConfig};
//!
//! let config = LogConfig {
//!     enabled: false,
//!     ..LogConfig::development()
//! };
//! init_logging(&config).expect("disabled logging never fails");
//! ```

#![doc(html_root_url = "https://docs.rs/lms-testkit-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, try_init_for_tests, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
