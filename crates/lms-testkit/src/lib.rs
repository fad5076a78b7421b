//! # LMS Testkit
//!
//! **Test shims for LMS plugins**
//!
//! Plugin code that reads the clock, request input or redirects the browser
//! is hard to test against the real host. This crate replaces those three
//! touch points with in-process fakes:
//!
//! - **Mockable Clock** - [`clock::TestClock`] answers "what time is it" from
//!   a pinned value when one is set, and from the system otherwise
//! - **Filtered Input** - [`input::RequestData`] answers `filter_input`
//!   lookups from in-memory maps, with the host's validate and sanitize filters
//! - **Redirect Interception** - [`redirect::redirect_and_exit`] returns a
//!   [`redirect::RedirectSignal`] instead of ending the process
//!
//! ## Quick Start
//!
//! ```
//! use lms_testkit::prelude::*;
//!
//! fn lesson_gate(clock: &dyn Clock, input: &dyn InputReader) -> Result<String, RedirectSignal> {
//!     let lesson = input.filter_input(InputSource::Get, "lesson", &Filter::new(FilterKind::ValidateInt));
//!     let Some(id) = lesson.as_i64() else {
//!         match redirect_and_exit("/courses", RedirectOptions::new())? {}
//!     };
//!     Ok(format!("lesson {id} opened {}", clock.current_time(&TimeKind::Mysql, false)))
//! }
//!
//! let mut harness = TestHarness::new();
//! harness.mock_current_time("2024-09-02 08:15:00");
//! harness.mock_get_request([("lesson", "4")]);
//!
//! let clock = harness.shared_clock();
//! assert_eq!(
//!     lesson_gate(&clock, harness.input()).unwrap(),
//!     "lesson 4 opened 2024-09-02 08:15:00"
//! );
//!
//! harness.mock_get_request([("lesson", "four")]);
//! expect_redirect(lesson_gate(&clock, harness.input())).assert_location("/courses");
//! ```
//!
//! ## Crates
//!
//! | Module        | Crate                   | Provides                              |
//! |---------------|-------------------------|---------------------------------------|
//! | [`clock`]     | `lms-testkit-clock`     | `Clock`, `TestClock`, time parsing    |
//! | [`input`]     | `lms-testkit-input`     | `RequestData`, `Filter`, outcomes     |
//! | [`redirect`]  | `lms-testkit-redirect`  | `RedirectSignal`, `AsRedirect`        |
//! | [`config`]    | `lms-testkit-config`    | layered `TestkitConfig` loading       |
//! | [`telemetry`] | `lms-testkit-telemetry` | test log subscriber                   |
//! | [`harness`]   | `lms-testkit-harness`   | `TestHarness`, assertions             |

#![doc(html_root_url = "https://docs.rs/lms-testkit/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export clock types
pub use lms_testkit_clock as clock;

// Re-export input types
pub use lms_testkit_input as input;

// Re-export redirect types
pub use lms_testkit_redirect as redirect;

// Re-export configuration
pub use lms_testkit_config as config;

// Re-export logging setup
pub use lms_testkit_telemetry as telemetry;

// Re-export the per-test fixture
pub use lms_testkit_harness as harness;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use lms_testkit::prelude::*;
///
/// let clock = TestClock::new();
/// clock.set_mock(0);
/// assert_eq!(clock.current_time(&TimeKind::Timestamp, true), CurrentTime::Timestamp(0));
/// ```
pub mod prelude {
    pub use lms_testkit_clock::{Clock, CurrentTime, MockTime, SystemClock, TestClock, TimeKind};

    pub use lms_testkit_input::{
        Filter, FilterFlags, FilterKind, FilterOutcome, InputReader, InputSource, RequestData,
    };

    pub use lms_testkit_redirect::{redirect_and_exit, AsRedirect, RedirectOptions, RedirectSignal};

    pub use lms_testkit_config::{ConfigLoader, TestkitConfig};

    pub use lms_testkit_telemetry::{init_logging, try_init_for_tests, LogConfig};

    pub use lms_testkit_harness::{
        assert_no_redirect, expect_redirect, HarnessError, MockRequest, TestHarness,
    };
}
