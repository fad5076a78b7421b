//! # LMS Testkit Input
//!
//! Injectable request data with `filter_var`-style filters.
//!
//! Plugin code reads request inputs through an [`InputReader`] instead of
//! global request state. Tests construct a [`RequestData`] holding exactly
//! the query, form, server, environment and cookie values they need.
//!
//! Every read returns a [`FilterOutcome`]:
//!
//! | Outcome | Meaning |
//! |---------|---------|
//! | [`FilterOutcome::Absent`] | the name was not sent |
//! | [`FilterOutcome::Invalid`] | the value was sent but rejected |
//! | [`FilterOutcome::Value`] | the value passed, possibly sanitized |
//!
//! ## Example
//!
//! ```
//! use lms_testkit_input::{Filter, FilterFlags, FilterKind, InputSource, RequestData};
//!
//! let data = RequestData::new()
//!     .with_post([("email", "student@example.com"), ("notify", "yes")]);
//!
//! let email = Filter::new(FilterKind::ValidateEmail);
//! assert_eq!(
//!     data.filter_input(InputSource::Post, "email", &email).as_str(),
//!     Some("student@example.com"),
//! );
//!
//! let notify = Filter::new(FilterKind::ValidateBool).flags(FilterFlags::NULL_ON_FAILURE);
//! assert_eq!(data.filter_input(InputSource::Post, "notify", &notify).as_bool(), Some(true));
//! ```

#![doc(html_root_url = "https://docs.rs/lms-testkit-input/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod filter;
mod outcome;
mod request;
mod sanitize;
mod source;
mod validate;

pub use filter::{filter_value, Filter, FilterCallback, FilterFlags, FilterKind, FilterOptions};
pub use outcome::FilterOutcome;
pub use request::{InputMap, InputReader, RequestData};
pub use source::InputSource;
