//! # LMS Testkit Harness
//!
//! Per-test fixture tying the mock clock, the request data and the redirect
//! interceptor together.
//!
//! ## Key Features
//!
//! - **Owned State**: every test builds its own [`TestHarness`], so tests can
//!   run in parallel without leaking mocks into each other
//! - **Request Builder**: [`MockRequest`] turns a fluent HTTP request into
//!   request data
//! - **Redirect Assertions**: [`expect_redirect`] and [`assert_no_redirect`]
//! - **Teardown**: dropping the harness clears the mocked time
//!
//! ## Example
//!
//! ```
//! use lms_testkit_harness::{expect_redirect, MockRequest, TestHarness};
//! use lms_testkit_input::{Filter, FilterKind, InputReader, InputSource};
//! use lms_testkit_redirect::{RedirectOptions, RedirectSignal};
//!
//! fn complete_lesson(input: &dyn InputReader) -> Result<(), RedirectSignal> {
//!     let lesson = input.filter_input(InputSource::Post, "lesson_id", &Filter::new(FilterKind::ValidateInt));
//!     match lesson.as_i64() {
//!         Some(id) => lms_testkit_redirect::redirect_and_exit(format!("/lesson/{id}"), RedirectOptions::new())
//!             .map(|never| match never {}),
//!         None => Ok(()),
//!     }
//! }
//!
//! let mut harness = TestHarness::new();
//! harness
//!     .mock_request(MockRequest::post("/complete").form(&[("lesson_id", "9")]))
//!     .unwrap();
//!
//! expect_redirect(complete_lesson(harness.input())).assert_location("/lesson/9");
//! ```

#![doc(html_root_url = "https://docs.rs/lms-testkit-harness/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod assert;
mod error;
mod harness;
mod request;

pub use assert::{assert_no_redirect, expect_redirect, RedirectAssertion};
pub use error::HarnessError;
pub use harness::{TestHarness, CONFIG_FILE};
pub use request::MockRequest;
