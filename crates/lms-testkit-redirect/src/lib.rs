//! # LMS Testkit Redirect
//!
//! Redirect interception for plugin tests.
//!
//! In production a redirect sends a `Location` header and ends the request.
//! Here [`redirect_and_exit`] returns a [`RedirectSignal`] in the error
//! position instead. Handlers propagate it with `?`; the harness catches it
//! and asserts on the target, the status and the safe flag.
//!
//! ## Example
//!
//! ```rust
//! use lms_testkit_redirect::{redirect_and_exit, AsRedirect, RedirectOptions};
//!
//! fn unenroll(student_id: u64) -> anyhow::Result<()> {
//!     if student_id == 0 {
//!         redirect_and_exit("/courses", RedirectOptions::new().status(303))?;
//!     }
//!     Ok(())
//! }
//!
//! let err = unenroll(0).unwrap_err();
//! let signal = err.as_redirect().expect("redirect expected");
//! assert_eq!(signal.location(), "/courses");
//! assert_eq!(signal.status_code(), 303);
//! ```

#![doc(html_root_url = "https://docs.rs/lms-testkit-redirect/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod catch;
mod signal;

pub use catch::AsRedirect;
pub use signal::{redirect_and_exit, RedirectOptions, RedirectSignal, DEFAULT_SAFE, DEFAULT_STATUS};
