//! Finding a redirect signal inside wrapped errors.

use crate::signal::RedirectSignal;
use std::error::Error;

/// Locates a [`RedirectSignal`] inside an error value.
///
/// Handlers often convert the signal into their own error type on the way
/// up. Harness code uses this to catch it anyway, by walking the source
/// chain.
pub trait AsRedirect {
    /// Returns the signal carried by `self`, if any.
    fn as_redirect(&self) -> Option<&RedirectSignal>;
}

impl AsRedirect for RedirectSignal {
    fn as_redirect(&self) -> Option<&RedirectSignal> {
        Some(self)
    }
}

impl AsRedirect for dyn Error + 'static {
    fn as_redirect(&self) -> Option<&RedirectSignal> {
        find_in_chain(self)
    }
}

impl AsRedirect for dyn Error + Send + Sync + 'static {
    fn as_redirect(&self) -> Option<&RedirectSignal> {
        find_in_chain(self)
    }
}

impl<E: AsRedirect + ?Sized> AsRedirect for Box<E> {
    fn as_redirect(&self) -> Option<&RedirectSignal> {
        (**self).as_redirect()
    }
}

impl AsRedirect for anyhow::Error {
    fn as_redirect(&self) -> Option<&RedirectSignal> {
        self.chain().find_map(|e| e.downcast_ref::<RedirectSignal>())
    }
}

impl<T, E: AsRedirect> AsRedirect for Result<T, E> {
    fn as_redirect(&self) -> Option<&RedirectSignal> {
        self.as_ref().err().and_then(AsRedirect::as_redirect)
    }
}

fn find_in_chain<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a RedirectSignal> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(signal) = e.downcast_ref::<RedirectSignal>() {
            return Some(signal);
        }
        current = e.source();
    }
    None
}
