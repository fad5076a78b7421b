//! Redirect assertions.

use http::StatusCode;
use lms_testkit_redirect::{AsRedirect, RedirectSignal};
use std::fmt;

/// A caught redirect with chainable assertions.
///
/// # Example
///
/// ```
/// use lms_testkit_harness::expect_redirect;
/// use lms_testkit_redirect::{redirect_and_exit, RedirectOptions};
///
/// expect_redirect(redirect_and_exit("/login", RedirectOptions::new()))
///     .assert_location("/login")
///     .assert_status_code(302)
///     .assert_safe();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectAssertion {
    signal: RedirectSignal,
}

impl RedirectAssertion {
    /// Returns the caught signal.
    #[must_use]
    pub fn signal(&self) -> &RedirectSignal {
        &self.signal
    }

    /// Consumes the assertion and returns the signal.
    #[must_use]
    pub fn into_signal(self) -> RedirectSignal {
        self.signal
    }

    /// Asserts the redirect target.
    ///
    /// # Panics
    ///
    /// Panics if the location doesn't match.
    #[track_caller]
    pub fn assert_location(&self, expected: impl AsRef<str>) -> &Self {
        let expected = expected.as_ref();
        assert_eq!(
            self.signal.location(),
            expected,
            "Expected redirect to {expected}, got {}",
            self.signal.location()
        );
        self
    }

    /// Asserts the status code.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    #[track_caller]
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.signal.status_code(),
            expected.as_u16(),
            "Expected redirect status {expected}, got {}",
            self.signal.status_code()
        );
        self
    }

    /// Asserts the status code as a u16.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    #[track_caller]
    pub fn assert_status_code(&self, expected: u16) -> &Self {
        assert_eq!(
            self.signal.status_code(),
            expected,
            "Expected redirect status {expected}, got {}",
            self.signal.status_code()
        );
        self
    }

    /// Asserts the redirect goes through the safe-redirect check.
    ///
    /// # Panics
    ///
    /// Panics if the redirect is unsafe.
    #[track_caller]
    pub fn assert_safe(&self) -> &Self {
        assert!(self.signal.is_safe(), "Expected a safe redirect to {}", self.signal.location());
        self
    }

    /// Asserts the redirect skips the safe-redirect check.
    ///
    /// # Panics
    ///
    /// Panics if the redirect is safe.
    #[track_caller]
    pub fn assert_unsafe(&self) -> &Self {
        assert!(!self.signal.is_safe(), "Expected an unsafe redirect to {}", self.signal.location());
        self
    }
}

/// Catches the redirect a call was expected to raise.
///
/// The signal may be wrapped in any error type implementing
/// [`AsRedirect`].
///
/// # Panics
///
/// Panics if the result is `Ok`, or if the error carries no redirect.
#[track_caller]
pub fn expect_redirect<T, E>(result: Result<T, E>) -> RedirectAssertion
where
    T: fmt::Debug,
    E: AsRedirect + fmt::Debug,
{
    match result {
        Ok(value) => panic!("Expected a redirect, but the call returned Ok({value:?})"),
        Err(err) => match err.as_redirect() {
            Some(signal) => RedirectAssertion {
                signal: signal.clone(),
            },
            None => panic!("Expected a redirect, but the call failed with {err:?}"),
        },
    }
}

/// Asserts that a call did not redirect, and hands the result back.
///
/// # Panics
///
/// Panics if the error carries a redirect, naming its location and status.
#[track_caller]
pub fn assert_no_redirect<T, E: AsRedirect>(result: Result<T, E>) -> Result<T, E> {
    if let Some(signal) = result.as_redirect() {
        panic!(
            "Unexpected redirect to {} (status {})",
            signal.location(),
            signal.status_code()
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use lms_testkit_redirect::{redirect_and_exit, RedirectOptions};

    fn redirect(options: RedirectOptions) -> Result<(), RedirectSignal> {
        redirect_and_exit("https://example.com/x", options)?;
        Ok(())
    }

    #[test]
    fn test_expect_redirect_chain() {
        expect_redirect(redirect(RedirectOptions::new()))
            .assert_location("https://example.com/x")
            .assert_status(StatusCode::FOUND)
            .assert_status_code(302)
            .assert_safe();
    }

    #[test]
    fn test_expect_unsafe_permanent() {
        let assertion = expect_redirect(redirect(RedirectOptions::new().status(301).safe(false)));
        assertion.assert_status_code(301).assert_unsafe();
        assert!(assertion.signal().is_permanent());
    }

    #[test]
    fn test_invalid_status_is_observable() {
        expect_redirect(redirect(RedirectOptions::new().status(0))).assert_status_code(0);
    }

    #[test]
    #[should_panic(expected = "Expected redirect status 302 Found, got 0")]
    fn test_invalid_status_does_not_pass_as_found() {
        expect_redirect(redirect(RedirectOptions::new().status(0))).assert_status(StatusCode::FOUND);
    }

    #[test]
    #[should_panic(expected = "Expected a redirect, but the call returned Ok")]
    fn test_expect_redirect_panics_on_ok() {
        let _ = expect_redirect::<u8, RedirectSignal>(Ok(1));
    }

    #[test]
    #[should_panic(expected = "Expected redirect to /y")]
    fn test_wrong_location_panics() {
        expect_redirect(redirect(RedirectOptions::new())).assert_location("/y");
    }

    #[test]
    #[should_panic(expected = "Unexpected redirect to https://example.com/x (status 302)")]
    fn test_assert_no_redirect_panics() {
        let _ = assert_no_redirect(redirect(RedirectOptions::new()));
    }

    #[test]
    fn test_assert_no_redirect_passes_through() {
        assert_eq!(assert_no_redirect(Ok::<_, RedirectSignal>(5)).unwrap(), 5);

        let failure: Result<(), Box<dyn std::error::Error>> = Err("db down".into());
        assert!(assert_no_redirect(failure).is_err());
    }
}
