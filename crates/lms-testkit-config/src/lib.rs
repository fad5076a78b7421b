//! Layered configuration for the LMS plugin test kit.
//!
//! A test suite can pin its clock zones, its default redirect status and its
//! log output in one file instead of repeating them in every test:
//!
//! - [`ClockConfig`] - zone used to render mocked times, and the site zone
//! - [`RedirectConfig`] - defaults merged into intercepted redirects
//! - [`LoggingConfig`] - test log output
//!
//! # Example
//!
//! ```no_run
//! use lms_testkit_config::ConfigLoader;
//!
//! # fn main() -> Result<(), lms_testkit_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("testkit.toml")?
//!     .with_dotenv()?
//!     .with_default_env()
//!     .load()?;
//!
//! println!("mocked times render in {}", config.clock.default_offset);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [clock]
//! default_offset = "+00:00"
//! site_offset = "-05:00"
//!
//! [redirect]
//! default_status = 302
//! default_safe = true
//!
//! [logging]
//! enabled = true
//! level = "lms_testkit_clock=debug,warn"
//! format = "pretty"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with `PREFIX__SECTION__KEY`, for example:
//!
//! - `LMS_TESTKIT__CLOCK__SITE_OFFSET=+02:00`
//! - `LMS_TESTKIT__REDIRECT__DEFAULT_STATUS=303`
//! - `LMS_TESTKIT__LOGGING__FORMAT=json`

#![doc(html_root_url = "https://docs.rs/lms-testkit-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{TestkitConfig, TestkitConfigBuilder};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::{parse_offset, ClockConfig, LogFormat, LoggingConfig, RedirectConfig};
