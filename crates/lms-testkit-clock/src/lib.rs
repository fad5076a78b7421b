//! # LMS Testkit Clock
//!
//! Mockable clock capability for plugin tests.
//!
//! Host code asks a [`Clock`] for the current time instead of reading the
//! system clock. Production wiring passes a [`SystemClock`]; tests pass a
//! [`TestClock`] and pin it to a known instant.
//!
//! | Kind | Mocked answer |
//! |------|---------------|
//! | [`TimeKind::Timestamp`] | the mock timestamp, unchanged |
//! | [`TimeKind::Mysql`] | `Y-m-d H:i:s` in the clock's default offset |
//! | [`TimeKind::Format`] | the PHP `date()` pattern applied to the mock |
//!
//! ## Example
//!
//! ```
//! use lms_testkit_clock::{Clock, TestClock, TimeKind};
//!
//! fn enrollment_date(clock: &dyn Clock) -> String {
//!     clock.current_time(&TimeKind::Mysql, false).to_string()
//! }
//!
//! let clock = TestClock::new();
//! clock.set_mock(1_577_836_800);
//! assert_eq!(enrollment_date(&clock), "2020-01-01 00:00:00");
//!
//! clock.set_mock("2020-01-01 00:00:00 +1 week");
//! assert_eq!(enrollment_date(&clock), "2020-01-08 00:00:00");
//! ```

#![doc(html_root_url = "https://docs.rs/lms-testkit-clock/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod clock;
mod format;
mod parse;

pub use clock::{Clock, CurrentTime, MockTime, SystemClock, TestClock, TimeKind};
pub use format::{format_php, MYSQL_FORMAT};
pub use parse::parse_datetime;
