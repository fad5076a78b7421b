//! Per-test fixture.

use crate::error::HarnessError;
use crate::request::MockRequest;
use lms_testkit_clock::{MockTime, TestClock};
use lms_testkit_config::{ConfigLoader, TestkitConfig};
use lms_testkit_input::{InputSource, RequestData};
use lms_testkit_redirect::{RedirectOptions, RedirectSignal};
use lms_testkit_telemetry::{init_logging, TelemetryError};
use serde_json::Value;
use std::convert::Infallible;
use std::sync::Arc;

/// Name of the optional configuration file read by [`TestHarness::from_env`].
pub const CONFIG_FILE: &str = "lms-testkit.toml";

/// One test's clock, request data and redirect defaults.
///
/// Each test owns its harness, so parallel tests never share mock state.
/// Dropping the harness clears the mocked time.
///
/// # Example
///
/// ```
/// use lms_testkit_clock::{Clock, TimeKind};
/// use lms_testkit_harness::{expect_redirect, TestHarness};
/// use lms_testkit_input::{Filter, InputSource};
/// use lms_testkit_redirect::RedirectOptions;
///
/// let mut harness = TestHarness::new();
/// harness.mock_current_time("2024-03-01 09:30:00");
/// harness.mock_get_request([("course", "12")]);
///
/// let clock = harness.shared_clock();
/// assert_eq!(clock.current_time(&TimeKind::Mysql, false).to_string(), "2024-03-01 09:30:00");
///
/// let course = harness.input().filter_input(InputSource::Get, "course", &Filter::default());
/// assert_eq!(course.as_str(), Some("12"));
///
/// expect_redirect(harness.redirect_and_exit("/courses/12", RedirectOptions::new()))
///     .assert_status_code(302);
/// ```
#[derive(Debug)]
pub struct TestHarness {
    clock: Arc<TestClock>,
    input: RequestData,
    redirect_defaults: RedirectOptions,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    /// Creates a harness with default settings: UTC clock, 302 safe
    /// redirects, no logging.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clock: Arc::new(TestClock::new()),
            input: RequestData::new(),
            redirect_defaults: RedirectOptions::new(),
        }
    }

    /// Creates a harness from a loaded configuration.
    ///
    /// Installs logging when the configuration enables it. A subscriber
    /// that is already installed is kept.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError` if the configuration is invalid or the log
    /// filter does not parse.
    pub fn from_config(config: &TestkitConfig) -> Result<Self, HarnessError> {
        config.validate()?;

        match init_logging(&config.logging.to_log_config()) {
            Ok(()) | Err(TelemetryError::LoggingInit(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let clock = TestClock::with_offsets(
            config.clock.default_fixed_offset()?,
            config.clock.site_fixed_offset()?,
        );

        tracing::debug!(
            default_offset = %config.clock.default_offset,
            site_offset = %config.clock.site_offset,
            default_status = config.redirect.default_status,
            default_safe = config.redirect.default_safe,
            "test harness configured"
        );

        Ok(Self {
            clock: Arc::new(clock),
            input: RequestData::new(),
            redirect_defaults: RedirectOptions::new()
                .status(config.redirect.default_status)
                .safe(config.redirect.default_safe),
        })
    }

    /// Creates a harness from [`CONFIG_FILE`] (if present), `.env` and
    /// `LMS_TESTKIT__*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError` if any layer fails to load or validate.
    pub fn from_env() -> Result<Self, HarnessError> {
        let config = ConfigLoader::new()
            .with_optional_file(CONFIG_FILE)?
            .with_dotenv()?
            .with_default_env()
            .load()?;
        Self::from_config(&config)
    }

    /// Returns the clock.
    #[must_use]
    pub fn clock(&self) -> &TestClock {
        &self.clock
    }

    /// Returns a handle to the clock for code under test.
    #[must_use]
    pub fn shared_clock(&self) -> Arc<TestClock> {
        Arc::clone(&self.clock)
    }

    /// Returns the request data.
    #[must_use]
    pub fn input(&self) -> &RequestData {
        &self.input
    }

    /// Returns the request data mutably.
    pub fn input_mut(&mut self) -> &mut RequestData {
        &mut self.input
    }

    /// Pins the clock. See [`TestClock::set_mock`].
    pub fn mock_current_time(&self, time: impl Into<MockTime>) {
        self.clock.set_mock(time);
    }

    /// Unpins the clock.
    pub fn reset_current_time(&self) {
        self.clock.reset();
    }

    /// Replaces the query string inputs and marks the request as GET.
    pub fn mock_get_request<I, K, V>(&mut self, entries: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.mock_method_request(InputSource::Get, "GET", entries)
    }

    /// Replaces the form inputs and marks the request as POST.
    pub fn mock_post_request<I, K, V>(&mut self, entries: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.mock_method_request(InputSource::Post, "POST", entries)
    }

    fn mock_method_request<I, K, V>(&mut self, source: InputSource, method: &str, entries: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.input.set_source(source, map);
        self.input.insert(InputSource::Server, "REQUEST_METHOD", method);
        self
    }

    /// Replaces the cookies.
    pub fn mock_cookies<I, K, V>(&mut self, entries: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.input.set_source(InputSource::Cookie, map);
        self
    }

    /// Replaces the request data with one built from `request`.
    ///
    /// The environment map is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built.
    pub fn mock_request(&mut self, request: MockRequest) -> Result<&mut Self, HarnessError> {
        let mut data = request.into_request_data()?;
        let env = std::mem::take(self.input.source_mut(InputSource::Env));
        data.set_source(InputSource::Env, env);
        self.input = data;
        Ok(self)
    }

    /// Intercepts a redirect, filling unset options from the configured
    /// defaults.
    ///
    /// # Errors
    ///
    /// Always returns the signal.
    pub fn redirect_and_exit(
        &self,
        location: impl Into<String>,
        options: RedirectOptions,
    ) -> Result<Infallible, RedirectSignal> {
        lms_testkit_redirect::redirect_and_exit(location, options.or(self.redirect_defaults))
    }

    /// Returns the configured redirect defaults.
    #[must_use]
    pub fn redirect_defaults(&self) -> RedirectOptions {
        self.redirect_defaults
    }

    /// Clears the mocked time and all request data.
    pub fn reset(&mut self) {
        self.clock.reset();
        self.input.clear_all();
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        if self.clock.is_mocked() {
            tracing::debug!("clearing mocked time on teardown");
        }
        self.clock.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lms_testkit_clock::{Clock, CurrentTime, TimeKind};
    use lms_testkit_config::{ClockConfig, RedirectConfig};
    use lms_testkit_input::Filter;
    use serde_json::json;

    #[test]
    fn test_new_defaults() {
        let harness = TestHarness::new();
        assert!(!harness.clock().is_mocked());
        assert_eq!(harness.input(), &RequestData::new());
        assert_eq!(harness.redirect_defaults(), RedirectOptions::new());
    }

    #[test]
    fn test_mock_and_reset_time() {
        let harness = TestHarness::new();
        harness.mock_current_time(1_577_836_800);
        assert_eq!(
            harness.clock().current_time(&TimeKind::Timestamp, true),
            CurrentTime::Timestamp(1_577_836_800)
        );

        harness.reset_current_time();
        assert!(!harness.clock().is_mocked());
    }

    #[test]
    fn test_drop_resets_shared_clock() {
        let harness = TestHarness::new();
        let clock = harness.shared_clock();
        harness.mock_current_time(42);
        assert!(clock.is_mocked());

        drop(harness);
        assert!(!clock.is_mocked());
    }

    #[test]
    fn test_mock_get_request_replaces_and_sets_method() {
        let mut harness = TestHarness::new();
        harness.mock_get_request([("a", "1"), ("b", "2")]);
        harness.mock_get_request([("c", "3")]);

        let get = harness.input().source(InputSource::Get);
        assert_eq!(get.len(), 1);
        assert_eq!(get.get("c"), Some(&json!("3")));
        assert_eq!(harness.input().get(InputSource::Server, "REQUEST_METHOD"), Some(&json!("GET")));
    }

    #[test]
    fn test_mock_post_request_and_cookies() {
        let mut harness = TestHarness::new();
        harness
            .mock_post_request([("nonce", "abc")])
            .mock_cookies([("lms_session", "s1")]);

        let raw = Filter::default();
        assert_eq!(
            harness.input().filter_input(InputSource::Post, "nonce", &raw).as_str(),
            Some("abc")
        );
        assert_eq!(
            harness.input().filter_input(InputSource::Cookie, "lms_session", &raw).as_str(),
            Some("s1")
        );
        assert_eq!(harness.input().get(InputSource::Server, "REQUEST_METHOD"), Some(&json!("POST")));
    }

    #[test]
    fn test_mock_request_keeps_env() {
        let mut harness = TestHarness::new();
        harness.input_mut().insert(InputSource::Env, "LMS_MODE", "test");
        harness.mock_get_request([("stale", "1")]);

        harness
            .mock_request(MockRequest::get("/courses?page=3").cookie("a", "b"))
            .unwrap();

        let input = harness.input();
        assert_eq!(input.get(InputSource::Env, "LMS_MODE"), Some(&json!("test")));
        assert_eq!(input.get(InputSource::Get, "page"), Some(&json!("3")));
        assert!(input.get(InputSource::Get, "stale").is_none());
        assert_eq!(input.get(InputSource::Cookie, "a"), Some(&json!("b")));
    }

    #[test]
    fn test_from_config_applies_offsets_and_defaults() {
        let config = TestkitConfig::builder()
            .clock(ClockConfig {
                default_offset: "+02:00".to_string(),
                ..Default::default()
            })
            .redirect(RedirectConfig {
                default_status: 303,
                default_safe: false,
            })
            .build();
        let harness = TestHarness::from_config(&config).unwrap();

        harness.mock_current_time(1_577_836_800);
        assert_eq!(
            harness.clock().current_time(&TimeKind::Mysql, false).to_string(),
            "2020-01-01 02:00:00"
        );

        let signal = harness
            .redirect_and_exit("/done", RedirectOptions::new())
            .unwrap_err();
        assert_eq!(signal.status_code(), 303);
        assert!(!signal.is_safe());

        let signal = harness
            .redirect_and_exit("/done", RedirectOptions::new().status(301))
            .unwrap_err();
        assert_eq!(signal.status_code(), 301);
        assert!(!signal.is_safe());
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let config = TestkitConfig::builder()
            .redirect(RedirectConfig {
                default_status: 500,
                default_safe: true,
            })
            .build();
        assert!(matches!(TestHarness::from_config(&config), Err(HarnessError::Config(_))));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut harness = TestHarness::new();
        harness.mock_current_time(5);
        harness.mock_post_request([("x", "1")]);

        harness.reset();
        assert!(!harness.clock().is_mocked());
        assert_eq!(harness.input(), &RequestData::new());
    }
}
