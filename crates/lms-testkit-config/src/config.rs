//! Main configuration types.
//!
//! This module provides the top-level [`TestkitConfig`] struct and its builder.

use serde::{Deserialize, Serialize};

use crate::{ClockConfig, ConfigError, LogFormat, LoggingConfig, RedirectConfig};

/// Complete test-kit configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use lms_testkit_config::TestkitConfig;
///
/// let config = TestkitConfig::default();
/// assert_eq!(config.redirect.default_status, 302);
/// assert_eq!(config.clock.default_offset, "+00:00");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct TestkitConfig {
    /// Mock clock settings.
    #[serde(default)]
    pub clock: ClockConfig,

    /// Redirect interceptor defaults.
    #[serde(default)]
    pub redirect: RedirectConfig,

    /// Test logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TestkitConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> TestkitConfigBuilder {
        TestkitConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - An offset is not `±HH:MM` within 14 hours
    /// - The default redirect status is not in 300..=399
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.clock.default_fixed_offset()?;
        self.clock.site_fixed_offset()?;

        if !(300..=399).contains(&self.redirect.default_status) {
            return Err(ConfigError::invalid_value(
                "redirect.default_status",
                format!("must be a 3xx status, got {}", self.redirect.default_status),
            ));
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value("logging.level", "must not be empty"));
        }

        Ok(())
    }

    /// Local preset: pretty debug logs with file and line.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.logging.enabled = true;
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.include_location = true;

        config
    }

    /// CI preset: JSON warn-level logs.
    #[must_use]
    pub fn ci() -> Self {
        let mut config = Self::default();

        config.logging.enabled = true;
        config.logging.level = "warn".to_string();
        config.logging.format = LogFormat::Json;

        config
    }
}

/// Builder for [`TestkitConfig`].
#[derive(Debug, Default)]
pub struct TestkitConfigBuilder {
    clock: Option<ClockConfig>,
    redirect: Option<RedirectConfig>,
    logging: Option<LoggingConfig>,
}

impl TestkitConfigBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the clock section.
    #[must_use]
    pub fn clock(mut self, clock: ClockConfig) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set the redirect section.
    #[must_use]
    pub fn redirect(mut self, redirect: RedirectConfig) -> Self {
        self.redirect = Some(redirect);
        self
    }

    /// Set the logging section.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Build the configuration. Unset sections use defaults.
    #[must_use]
    pub fn build(self) -> TestkitConfig {
        TestkitConfig {
            clock: self.clock.unwrap_or_default(),
            redirect: self.redirect.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<TestkitConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
