//! Clock capability and its real and mockable implementations.

use crate::format::{format_php, MYSQL_FORMAT};
use crate::parse::parse_datetime;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// What kind of answer a time query wants.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimeKind {
    /// Unix timestamp in seconds.
    Timestamp,
    /// `Y-m-d H:i:s`, the layout the host stores dates in.
    Mysql,
    /// Any other PHP `date()` pattern.
    Format(String),
}

impl TimeKind {
    /// Interprets the host's `type` argument.
    ///
    /// `"timestamp"` and `"mysql"` are keywords, anything else is a pattern.
    pub fn parse(kind: &str) -> Self {
        match kind {
            "timestamp" => Self::Timestamp,
            "mysql" => Self::Mysql,
            pattern => Self::Format(pattern.to_string()),
        }
    }
}

impl From<&str> for TimeKind {
    fn from(kind: &str) -> Self {
        Self::parse(kind)
    }
}

/// Answer to a time query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrentTime {
    /// Seconds since the Unix epoch.
    Timestamp(i64),
    /// A rendered date string.
    Formatted(String),
}

impl CurrentTime {
    /// Returns the timestamp, if this is one.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<i64> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            Self::Formatted(_) => None,
        }
    }

    /// Returns the rendered string, if this is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Timestamp(_) => None,
            Self::Formatted(s) => Some(s),
        }
    }
}

impl fmt::Display for CurrentTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timestamp(ts) => write!(f, "{ts}"),
            Self::Formatted(s) => f.write_str(s),
        }
    }
}

/// Source of the current time.
///
/// Host code takes a `Clock` instead of reading the system time directly so
/// tests can substitute a [`TestClock`].
pub trait Clock: Send + Sync {
    /// Returns the current time as `kind`, in GMT when `gmt` is set.
    fn current_time(&self, kind: &TimeKind, gmt: bool) -> CurrentTime;

    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn current_time(&self, kind: &TimeKind, gmt: bool) -> CurrentTime {
        (**self).current_time(kind, gmt)
    }

    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Real clock backed by the operating system.
///
/// Non-GMT answers are shifted into the site's UTC offset, the way the host
/// platform reports local time. That includes `Timestamp`, which becomes the
/// epoch seconds plus the offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    site_offset: FixedOffset,
}

impl SystemClock {
    /// Creates a system clock reporting local time in `site_offset`.
    #[must_use]
    pub fn new(site_offset: FixedOffset) -> Self {
        Self { site_offset }
    }

    /// Creates a system clock whose site runs on UTC.
    #[must_use]
    pub fn utc() -> Self {
        Self::new(utc_offset())
    }

    /// Returns the site offset.
    #[must_use]
    pub fn site_offset(&self) -> FixedOffset {
        self.site_offset
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::utc()
    }
}

impl Clock for SystemClock {
    fn current_time(&self, kind: &TimeKind, gmt: bool) -> CurrentTime {
        let now = Utc::now();
        let offset = if gmt { utc_offset() } else { self.site_offset };

        match kind {
            TimeKind::Timestamp if gmt => CurrentTime::Timestamp(now.timestamp()),
            TimeKind::Timestamp => CurrentTime::Timestamp(
                now.timestamp() + i64::from(self.site_offset.local_minus_utc()),
            ),
            other => render(&now.with_timezone(&offset), other),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Value accepted by [`TestClock::set_mock`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockTime {
    /// Unix timestamp, stored as-is.
    Timestamp(i64),
    /// Date/time text parsed on the way in.
    Text(String),
}

impl From<i64> for MockTime {
    fn from(ts: i64) -> Self {
        Self::Timestamp(ts)
    }
}

impl From<i32> for MockTime {
    fn from(ts: i32) -> Self {
        Self::Timestamp(i64::from(ts))
    }
}

impl From<u32> for MockTime {
    fn from(ts: u32) -> Self {
        Self::Timestamp(i64::from(ts))
    }
}

impl<Tz: chrono::TimeZone> From<DateTime<Tz>> for MockTime {
    fn from(dt: DateTime<Tz>) -> Self {
        Self::Timestamp(dt.timestamp())
    }
}

impl From<&str> for MockTime {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for MockTime {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Clock whose answer can be pinned by a test.
///
/// While a mock timestamp is set every query is answered from it and the
/// `gmt` argument is ignored; mocked values are rendered in the clock's
/// default offset. Without a mock the clock delegates to its
/// [`SystemClock`].
///
/// The mock lives in this value, not in process state, so each test owns
/// its own clock.
///
/// # Example
///
/// ```
/// use lms_testkit_clock::{Clock, CurrentTime, TestClock, TimeKind};
///
/// let clock = TestClock::new();
/// clock.set_mock("2020-01-01 00:00:00");
///
/// assert_eq!(
///     clock.current_time(&TimeKind::Timestamp, false),
///     CurrentTime::Timestamp(1_577_836_800)
/// );
/// assert_eq!(
///     clock.current_time(&TimeKind::Mysql, true),
///     CurrentTime::Formatted("2020-01-01 00:00:00".to_string())
/// );
///
/// clock.reset();
/// assert!(!clock.is_mocked());
/// ```
#[derive(Debug)]
pub struct TestClock {
    fallback: SystemClock,
    default_offset: FixedOffset,
    mock: RwLock<Option<i64>>,
}

impl TestClock {
    /// Creates an unmocked clock running on UTC.
    #[must_use]
    pub fn new() -> Self {
        Self::with_offsets(utc_offset(), utc_offset())
    }

    /// Creates an unmocked clock.
    ///
    /// `default_offset` is the zone mocked values are rendered and parsed
    /// in; `site_offset` configures the real fallback clock.
    #[must_use]
    pub fn with_offsets(default_offset: FixedOffset, site_offset: FixedOffset) -> Self {
        Self {
            fallback: SystemClock::new(site_offset),
            default_offset,
            mock: RwLock::new(None),
        }
    }

    /// Pins the clock to `value`.
    ///
    /// Timestamps and numeric strings are stored as-is. Other text goes
    /// through [`parse_datetime`] relative to the real current time; text
    /// that cannot be parsed leaves the clock without an active mock.
    pub fn set_mock(&self, value: impl Into<MockTime>) {
        let resolved = match value.into() {
            MockTime::Timestamp(ts) => Some(ts),
            MockTime::Text(text) => {
                let parsed = parse_numeric(&text).or_else(|| {
                    parse_datetime(&text, self.fallback.now().timestamp(), self.default_offset)
                });
                if parsed.is_none() {
                    tracing::warn!(mock_time = %text, "unparseable mock time, clock left unmocked");
                }
                parsed
            }
        };

        tracing::debug!(mock_time = ?resolved, "mock current time set");
        *self.mock.write() = resolved;
    }

    /// Clears any mock so the clock follows real time again.
    pub fn reset(&self) {
        tracing::debug!("mock current time reset");
        *self.mock.write() = None;
    }

    /// Returns the active mock timestamp.
    #[must_use]
    pub fn mock(&self) -> Option<i64> {
        *self.mock.read()
    }

    /// Returns true while a mock is active.
    #[must_use]
    pub fn is_mocked(&self) -> bool {
        self.mock().is_some()
    }

    /// Returns the zone mocked values are rendered in.
    #[must_use]
    pub fn default_offset(&self) -> FixedOffset {
        self.default_offset
    }

    /// Returns the real clock used when no mock is active.
    #[must_use]
    pub fn fallback(&self) -> &SystemClock {
        &self.fallback
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TestClock {
    fn current_time(&self, kind: &TimeKind, gmt: bool) -> CurrentTime {
        let Some(ts) = self.mock() else {
            return self.fallback.current_time(kind, gmt);
        };

        match kind {
            TimeKind::Timestamp => CurrentTime::Timestamp(ts),
            other => match DateTime::from_timestamp(ts, 0) {
                Some(dt) => render(&dt.with_timezone(&self.default_offset), other),
                // Out of chrono's range; nothing sensible to render.
                None => CurrentTime::Formatted(String::new()),
            },
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.mock()
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .unwrap_or_else(|| self.fallback.now())
    }
}

fn render(dt: &DateTime<FixedOffset>, kind: &TimeKind) -> CurrentTime {
    match kind {
        TimeKind::Timestamp => CurrentTime::Timestamp(dt.timestamp()),
        TimeKind::Mysql => CurrentTime::Formatted(format_php(dt, MYSQL_FORMAT)),
        TimeKind::Format(pattern) => CurrentTime::Formatted(format_php(dt, pattern)),
    }
}

fn parse_numeric(text: &str) -> Option<i64> {
    let text = text.trim();
    text.parse::<i64>().ok().or_else(|| {
        text.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64)
    })
}

pub(crate) fn utc_offset() -> FixedOffset {
    Utc.fix()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEW_YEAR_2020: i64 = 1_577_836_800;

    #[test]
    fn test_time_kind_parse() {
        assert_eq!(TimeKind::parse("timestamp"), TimeKind::Timestamp);
        assert_eq!(TimeKind::parse("mysql"), TimeKind::Mysql);
        assert_eq!(TimeKind::parse("Y-m-d"), TimeKind::Format("Y-m-d".into()));
        assert_eq!(TimeKind::from("U"), TimeKind::Format("U".into()));
    }

    #[test]
    fn test_mock_timestamp_is_returned_verbatim() {
        let clock = TestClock::new();
        clock.set_mock(NEW_YEAR_2020);

        assert_eq!(
            clock.current_time(&TimeKind::Timestamp, false),
            CurrentTime::Timestamp(NEW_YEAR_2020)
        );
        assert_eq!(
            clock.current_time(&TimeKind::Timestamp, true),
            CurrentTime::Timestamp(NEW_YEAR_2020)
        );
    }

    #[test]
    fn test_mock_ignores_gmt_flag() {
        let plus_five = FixedOffset::east_opt(5 * 3_600).unwrap();
        let clock = TestClock::with_offsets(plus_five, plus_five);
        clock.set_mock(NEW_YEAR_2020);

        let local = clock.current_time(&TimeKind::Mysql, false);
        let gmt = clock.current_time(&TimeKind::Mysql, true);

        assert_eq!(local, gmt);
        assert_eq!(local.as_str(), Some("2020-01-01 05:00:00"));
    }

    #[test]
    fn test_mock_format_pattern() {
        let clock = TestClock::new();
        clock.set_mock(NEW_YEAR_2020);

        assert_eq!(
            clock.current_time(&TimeKind::parse("D, d M Y"), false),
            CurrentTime::Formatted("Wed, 01 Jan 2020".into())
        );
    }

    #[test]
    fn test_string_and_timestamp_are_equivalent() {
        let from_text = TestClock::new();
        from_text.set_mock("2020-01-01 00:00:00");

        let from_number = TestClock::new();
        from_number.set_mock(NEW_YEAR_2020);

        assert_eq!(from_text.mock(), from_number.mock());
    }

    #[test]
    fn test_numeric_text_is_a_timestamp() {
        let clock = TestClock::new();
        clock.set_mock("1577836800");
        assert_eq!(clock.mock(), Some(NEW_YEAR_2020));

        clock.set_mock("1577836800.75");
        assert_eq!(clock.mock(), Some(NEW_YEAR_2020));
    }

    #[test]
    fn test_zero_is_a_valid_mock() {
        let clock = TestClock::new();
        clock.set_mock(0);
        assert_eq!(clock.current_time(&TimeKind::Timestamp, false), CurrentTime::Timestamp(0));
        assert_eq!(
            clock.current_time(&TimeKind::Mysql, false).as_str(),
            Some("1970-01-01 00:00:00")
        );
    }

    #[test]
    fn test_unparseable_text_leaves_clock_unmocked() {
        let clock = TestClock::new();
        clock.set_mock(NEW_YEAR_2020);
        clock.set_mock("the day after never");

        assert!(!clock.is_mocked());
    }

    #[test]
    fn test_reset_restores_real_time() {
        let clock = TestClock::new();
        clock.set_mock(NEW_YEAR_2020);
        clock.reset();

        let before = Utc::now().timestamp();
        let reported = clock
            .current_time(&TimeKind::Timestamp, true)
            .as_timestamp()
            .unwrap();
        let after = Utc::now().timestamp();

        assert!((before..=after).contains(&reported));
    }

    #[test]
    fn test_reset_is_unconditional() {
        let clock = TestClock::new();
        clock.reset();
        clock.reset();
        assert_eq!(clock.mock(), None);
    }

    #[test]
    fn test_now_follows_mock() {
        let clock = TestClock::new();
        clock.set_mock(NEW_YEAR_2020);
        assert_eq!(clock.now().timestamp(), NEW_YEAR_2020);
    }

    #[test]
    fn test_system_clock_local_timestamp_includes_offset() {
        let clock = SystemClock::new(FixedOffset::east_opt(3_600).unwrap());

        let gmt = clock.current_time(&TimeKind::Timestamp, true).as_timestamp().unwrap();
        let local = clock.current_time(&TimeKind::Timestamp, false).as_timestamp().unwrap();

        let drift = local - gmt - 3_600;
        assert!((0..=1).contains(&drift), "unexpected drift {drift}");
    }

    #[test]
    fn test_system_clock_mysql_shape() {
        let clock = SystemClock::utc();
        let rendered = clock.current_time(&TimeKind::Mysql, true).to_string();

        assert_eq!(rendered.len(), 19);
        assert_eq!(&rendered[4..5], "-");
        assert_eq!(&rendered[10..11], " ");
        assert_eq!(&rendered[13..14], ":");
    }

    #[test]
    fn test_clock_through_arc_dyn() {
        let clock = Arc::new(TestClock::new());
        clock.set_mock(NEW_YEAR_2020);

        let shared: Arc<dyn Clock> = clock.clone();
        assert_eq!(
            shared.current_time(&TimeKind::Timestamp, false),
            CurrentTime::Timestamp(NEW_YEAR_2020)
        );
    }
}
