//! The redirect signal and its options.

use bytes::Bytes;
use http::{header, HeaderValue, Response, StatusCode};
use std::convert::Infallible;

/// Status used when none is given.
pub const DEFAULT_STATUS: StatusCode = StatusCode::FOUND;

/// Safe-redirect flag used when none is given.
pub const DEFAULT_SAFE: bool = true;

/// Overrides for a redirect. Unset fields fall back to the defaults.
///
/// # Example
///
/// ```rust
/// use lms_testkit_redirect::RedirectOptions;
///
/// let options = RedirectOptions::new().status(301);
/// assert_eq!(options.status_code(), Some(301));
/// assert_eq!(options.safe_flag(), None);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedirectOptions {
    status: Option<u16>,
    safe: Option<bool>,
}

impl RedirectOptions {
    /// Creates options with nothing overridden.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            status: None,
            safe: None,
        }
    }

    /// Overrides the HTTP status.
    #[must_use]
    pub const fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Overrides the safe-redirect flag.
    #[must_use]
    pub const fn safe(mut self, safe: bool) -> Self {
        self.safe = Some(safe);
        self
    }

    /// Returns the status override, if any.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        self.status
    }

    /// Returns the safe override, if any.
    #[must_use]
    pub const fn safe_flag(&self) -> Option<bool> {
        self.safe
    }

    /// Fills unset fields from `fallback`.
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        Self {
            status: self.status.or(fallback.status),
            safe: self.safe.or(fallback.safe),
        }
    }
}

impl From<StatusCode> for RedirectOptions {
    fn from(status: StatusCode) -> Self {
        Self::new().status(status.as_u16())
    }
}

/// A redirect that would have been sent before terminating the request.
///
/// Returned in the error position of [`redirect_and_exit`]. It marks a
/// transfer of control, not a failure: handlers propagate it with `?` and
/// the test harness catches it at the top.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("redirect to {location} (status {status})")]
pub struct RedirectSignal {
    location: String,
    status: u16,
    safe: bool,
}

impl RedirectSignal {
    /// Resolves options against the defaults.
    ///
    /// The requested status is kept as given, even when it is not a 3xx or
    /// not a valid HTTP status at all.
    #[must_use]
    pub fn new(location: impl Into<String>, options: RedirectOptions) -> Self {
        let location = location.into();
        let status = options.status.unwrap_or(DEFAULT_STATUS.as_u16());
        if !(300..=399).contains(&status) {
            tracing::debug!(status, %location, "redirect signal with non-3xx status");
        }

        Self {
            location,
            status,
            safe: options.safe.unwrap_or(DEFAULT_SAFE),
        }
    }

    /// Returns the redirect target.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Returns the requested status code.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status
    }

    /// Returns the requested status as an HTTP status, or `None` if the code
    /// is outside 100..=999.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        StatusCode::from_u16(self.status).ok()
    }

    /// Returns true if the target must pass the host's allowed-host check.
    #[must_use]
    pub fn is_safe(&self) -> bool {
        self.safe
    }

    /// Returns true for 301 and 308.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        matches!(self.status, 301 | 308)
    }

    /// Builds the response the host would have sent.
    ///
    /// A location that is not a valid header value is left out. A status
    /// code that HTTP cannot carry is sent as [`DEFAULT_STATUS`].
    #[must_use]
    pub fn into_response(self) -> Response<Bytes> {
        let mut response = Response::new(Bytes::new());
        *response.status_mut() = self.status().unwrap_or_else(|| {
            tracing::warn!(status = self.status, "invalid redirect status, responding with 302");
            DEFAULT_STATUS
        });

        match HeaderValue::from_str(&self.location) {
            Ok(value) => {
                response.headers_mut().insert(header::LOCATION, value);
            }
            Err(_) => {
                tracing::warn!(location = %self.location, "redirect location is not a valid header value");
            }
        }
        response
    }
}

/// Signals a redirect instead of sending it and terminating.
///
/// Options are merged over the defaults `{status: 302, safe: true}`. The
/// `Ok` type is uninhabited, so this never returns normally and callers
/// propagate the signal with `?`. Nothing is sent and nothing exits.
///
/// # Example
///
/// ```rust
/// use http::StatusCode;
/// use lms_testkit_redirect::{redirect_and_exit, RedirectOptions, RedirectSignal};
///
/// fn finish_checkout(paid: bool) -> Result<&'static str, RedirectSignal> {
///     if !paid {
///         redirect_and_exit("https://example.com/cart", RedirectOptions::new())?;
///     }
///     Ok("receipt")
/// }
///
/// let signal = finish_checkout(false).unwrap_err();
/// assert_eq!(signal.location(), "https://example.com/cart");
/// assert_eq!(signal.status(), Some(StatusCode::FOUND));
/// assert!(signal.is_safe());
/// assert_eq!(finish_checkout(true), Ok("receipt"));
/// ```
pub fn redirect_and_exit(
    location: impl Into<String>,
    options: RedirectOptions,
) -> Result<Infallible, RedirectSignal> {
    let signal = RedirectSignal::new(location, options);
    tracing::debug!(
        location = %signal.location,
        status = signal.status,
        safe = signal.safe,
        "redirect intercepted"
    );
    Err(signal)
}
