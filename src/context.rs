//! Process-wide platform setup and teardown.

use crate::error::{Error, Result};
use crate::sys;

/// Token that brackets any platform-level socket subsystem initialization.
///
/// Some operating systems require setup before any socket or poller use; at
/// this time only Windows does (`WSAStartup`/`WSACleanup`), and the Unix
/// implementation is a no-op. The token exists on every platform so callers
/// stay portable.
///
/// Only the [`Socket`](crate::Socket) and [`Poller`](crate::Poller) types
/// need a live context; the address types work without one. While one
/// context per process suffices, multiple instances may coexist safely: the
/// underlying setup is reference counted where it exists at all.
pub struct Context {
    _priv: (),
}

impl Context {
    /// Performs the platform setup, if any.
    ///
    /// # Errors
    ///
    /// [`Error::Startup`] if the platform's socket subsystem could not be
    /// initialized.
    pub fn new() -> Result<Self> {
        sys::sys_startup().map_err(Error::Startup)?;
        Ok(Self { _priv: () })
    }
}

impl Drop for Context {
    /// Performs the mirrored platform teardown, if any.
    fn drop(&mut self) {
        sys::sys_cleanup();
    }
}
