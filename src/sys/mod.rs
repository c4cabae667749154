//! Platform-specific socket and polling primitives.
//!
//! This module is the single seam between the platform-agnostic core and the
//! operating system. It covers three concerns:
//!
//! - descriptor lifecycle (create, configure, close),
//! - the native address codec (encode/decode of `sockaddr`-style buffers),
//! - the blocking wait-for-readiness primitive.
//!
//! The concrete implementation is selected at compile time depending on the
//! target operating system. Both implementations expose identical item names
//! and semantics; everything above this module must not assume a particular
//! backend.

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub(crate) use unix::*;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub(crate) use windows::*;
