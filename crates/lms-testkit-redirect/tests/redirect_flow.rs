//! Redirects raised deep inside handler code.

use http::StatusCode;
use lms_testkit_redirect::{redirect_and_exit, AsRedirect, RedirectOptions, RedirectSignal};
use proptest::prelude::*;
use std::cell::Cell;

#[derive(Debug, thiserror::Error)]
enum CheckoutError {
    #[error("payment declined")]
    Declined,
    #[error(transparent)]
    Redirect(#[from] RedirectSignal),
}

fn require_login(logged_in: bool) -> Result<(), RedirectSignal> {
    if !logged_in {
        redirect_and_exit("https://example.com/login", RedirectOptions::new())?;
    }
    Ok(())
}

fn checkout(logged_in: bool, card_ok: bool, charged: &Cell<bool>) -> Result<(), CheckoutError> {
    require_login(logged_in)?;
    if !card_ok {
        return Err(CheckoutError::Declined);
    }
    charged.set(true);
    match redirect_and_exit("https://example.com/thanks", RedirectOptions::new().status(303))? {}
}

#[test]
fn test_code_after_redirect_does_not_run() {
    let charged = Cell::new(false);
    let err = checkout(false, true, &charged).unwrap_err();

    let signal = err.as_redirect_signal().expect("login redirect");
    assert_eq!(signal.location(), "https://example.com/login");
    assert_eq!(signal.status(), Some(StatusCode::FOUND));
    assert!(!charged.get());
}

#[test]
fn test_success_path_redirects_with_see_other() {
    let charged = Cell::new(false);
    let err = checkout(true, true, &charged).unwrap_err();

    let signal = err.as_redirect_signal().expect("thanks redirect");
    assert_eq!(signal.location(), "https://example.com/thanks");
    assert_eq!(signal.status(), Some(StatusCode::SEE_OTHER));
    assert!(charged.get());
}

#[test]
fn test_real_failures_are_not_redirects() {
    let charged = Cell::new(false);
    let err = checkout(true, false, &charged).unwrap_err();
    assert!(err.as_redirect_signal().is_none());
}

#[test]
fn test_boxed_error_chain() {
    fn handler() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        redirect_and_exit("/home", RedirectOptions::new().safe(false))?;
        Ok(())
    }

    let err = handler().unwrap_err();
    let signal = err.as_redirect().expect("redirect in box");
    assert_eq!(signal.location(), "/home");
    assert!(!signal.is_safe());
}

impl CheckoutError {
    fn as_redirect_signal(&self) -> Option<&RedirectSignal> {
        match self {
            Self::Redirect(signal) => Some(signal),
            Self::Declined => None,
        }
    }
}

proptest! {
    #[test]
    fn prop_never_returns_ok(location in "[a-z/:.]{0,40}", status in proptest::option::of(any::<u16>()), safe in proptest::option::of(any::<bool>())) {
        let mut options = RedirectOptions::new();
        if let Some(status) = status {
            options = options.status(status);
        }
        if let Some(safe) = safe {
            options = options.safe(safe);
        }

        let signal = redirect_and_exit(location.clone(), options).unwrap_err();
        prop_assert_eq!(signal.location(), location.as_str());
        prop_assert_eq!(signal.status_code(), status.unwrap_or(302));
        prop_assert_eq!(signal.is_safe(), safe.unwrap_or(true));
    }
}
