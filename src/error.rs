//! Crate-wide error types.
//!
//! Hard failures carry the failing operation plus the platform-reported
//! diagnostic. Soft outcomes (would-block, nothing pending, peer closed) are
//! never represented here; they surface as ordinary statuses on the
//! operations that produce them.

use std::io;

use thiserror::Error;

/// Convenience alias used by every fallible operation in the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by address encoding/decoding, socket operations, polling,
/// and platform setup.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The host string was not a valid numeric address for its family.
    #[error("malformed {family} address host: {host:?}")]
    AddressFormat {
        /// Family the host was parsed as (`"ipv4"` or `"ipv6"`).
        family: &'static str,
        /// The offending host string.
        host: String,
    },

    /// A file-domain address was built from an empty path.
    #[error("file address path is empty")]
    EmptyPath,

    /// A file-domain path does not fit the native buffer's path capacity.
    #[error("file address path is too long: {length} bytes exceeds {capacity}")]
    PathTooLong { length: usize, capacity: usize },

    /// A raw byte buffer exceeds the native address buffer's total capacity.
    #[error("raw address data is too large: {size} bytes exceeds {capacity}")]
    OversizedBuffer { size: usize, capacity: usize },

    /// The native buffer carries a family tag this crate does not support,
    /// or no family at all (the null state).
    #[error("unsupported address family: {family}")]
    UnsupportedFamily { family: u16 },

    /// The native buffer's length is inconsistent with its family tag, or
    /// its contents could not be decoded.
    #[error("malformed raw address data")]
    MalformedAddress,

    #[error("failed to open socket: {0}")]
    Open(#[source] io::Error),

    #[error("failed to set socket option for address reuse: {0}")]
    Option(#[source] io::Error),

    #[error("failed to shut down socket: {0}")]
    Shutdown(#[source] io::Error),

    #[error("failed to bind socket: {0}")]
    Bind(#[source] io::Error),

    #[error("failed to listen on socket: {0}")]
    Listen(#[source] io::Error),

    #[error("failed to connect socket: {0}")]
    Connect(#[source] io::Error),

    #[error("failed to accept on socket: {0}")]
    Accept(#[source] io::Error),

    #[error("failed to transfer on socket: {0}")]
    Transfer(#[source] io::Error),

    #[error("failed to get socket name: {0}")]
    Name(#[source] io::Error),

    #[error("failed to poll sockets: {0}")]
    Poll(#[source] io::Error),

    #[error("failed to initialize socket subsystem: {0}")]
    Startup(#[source] io::Error),
}
