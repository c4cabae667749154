//! Non-blocking stream sockets.
//!
//! A [`Socket`] owns at most one OS descriptor and exposes the full
//! lifecycle: open/close, option setting, bind/listen, connect/accept,
//! shutdown, and the send/recv transfer operations.
//!
//! Sockets are always created in non-blocking mode, so no operation ever
//! waits on I/O: would-block conditions surface as ordinary statuses
//! ([`ConnectStatus::Pending`], an accept of `None`,
//! [`TransferStatus::Blocked`]) rather than errors. Readiness is observed
//! separately through the [`Poller`](crate::Poller).
//!
//! The handle is move-only: moving transfers descriptor ownership, and drop
//! closes whatever descriptor is held. A single `Socket` must be confined to
//! one thread or synchronized externally.

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::raw_address::RawAddress;
use crate::sys;

/// OS-level socket identifier.
#[cfg(unix)]
pub type SocketId = std::os::fd::RawFd;

/// OS-level socket identifier.
#[cfg(windows)]
pub type SocketId = std::os::windows::io::RawSocket;

/// Sentinel identifier of a socket that owns no descriptor.
#[cfg(unix)]
pub const INVALID_SOCKET_ID: SocketId = -1;

/// Sentinel identifier of a socket that owns no descriptor.
#[cfg(windows)]
pub const INVALID_SOCKET_ID: SocketId = SocketId::MAX;

/// Supported socket address families.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SocketDomain {
    Ipv4,
    Ipv6,
    File,
}

/// Supported socket types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SocketType {
    Stream,
}

/// Which side of an established connection to shut down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownKind {
    Read,
    Write,
    ReadWrite,
}

/// Outcome of a connection attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectStatus {
    /// The OS completed the connection synchronously.
    Connected,
    /// The connection is in progress; completion must be confirmed through
    /// a [`PollInterest::Connect`](crate::PollInterest::Connect) readiness
    /// event.
    Pending,
}

/// Outcome of a send or recv operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferStatus {
    /// Zero or more bytes were transferred. Partial transfers are expected;
    /// callers must loop.
    Success,
    /// The operation would block; no bytes were transferred.
    Blocked,
    /// The peer closed the connection; no bytes were transferred.
    Disconnected,
}

/// An owning handle over one OS socket descriptor.
#[derive(Debug)]
pub struct Socket {
    id: SocketId,
}

impl Default for Socket {
    fn default() -> Self {
        Self {
            id: INVALID_SOCKET_ID,
        }
    }
}

impl Socket {
    /// Creates a socket in the invalid state, owning no descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the OS-level identifier, or [`INVALID_SOCKET_ID`] if the
    /// socket owns no descriptor.
    pub fn id(&self) -> SocketId {
        self.id
    }

    /// Returns true if the socket currently owns a descriptor.
    pub fn is_open(&self) -> bool {
        self.id != INVALID_SOCKET_ID
    }

    /// Opens a new descriptor for the given domain and type.
    ///
    /// Any previously owned descriptor is closed first. The new descriptor
    /// is unconditionally switched to non-blocking mode; if that fails, the
    /// half-created descriptor is released before the error is returned.
    pub fn open(&mut self, domain: SocketDomain, ty: SocketType) -> Result<()> {
        self.close();

        let family = match domain {
            SocketDomain::Ipv4 => sys::FAMILY_IPV4,
            SocketDomain::Ipv6 => sys::FAMILY_IPV6,
            SocketDomain::File => sys::FAMILY_FILE,
        };
        let SocketType::Stream = ty;

        self.id = sys::sys_socket(family).map_err(Error::Open)?;
        trace!("opened socket {}", self.id);

        Ok(())
    }

    /// Releases the descriptor, if any, and resets to the invalid state.
    ///
    /// Idempotent and best-effort: no failure is surfaced.
    pub fn close(&mut self) {
        if self.id != INVALID_SOCKET_ID {
            trace!("closing socket {}", self.id);
            sys::sys_close(self.id);
            self.id = INVALID_SOCKET_ID;
        }
    }

    /// Enables or disables the socket-level address-reuse option.
    pub fn set_reuse_address_option(&self, value: bool) -> Result<()> {
        debug_assert!(self.is_open());

        sys::sys_set_reuse_address(self.id, value).map_err(Error::Option)
    }

    /// Shuts down one or both directions of an established connection.
    pub fn shutdown(&self, kind: ShutdownKind) -> Result<()> {
        debug_assert!(self.is_open());

        sys::sys_shutdown(self.id, kind).map_err(Error::Shutdown)
    }

    /// Binds the socket to an address.
    pub fn bind(&self, addr: &RawAddress) -> Result<()> {
        debug_assert!(self.is_open());

        sys::sys_bind(self.id, addr.data()).map_err(Error::Bind)
    }

    /// Starts listening for incoming connections.
    pub fn listen(&self, backlog: i32) -> Result<()> {
        debug_assert!(self.is_open());

        sys::sys_listen(self.id, backlog).map_err(Error::Listen)
    }

    /// Connects the socket to an address.
    ///
    /// Returns [`ConnectStatus::Connected`] if the OS completed the
    /// connection synchronously, or [`ConnectStatus::Pending`] if it is in
    /// progress and must be confirmed later through the poller. Any other
    /// failure is a hard error.
    pub fn connect(&self, addr: &RawAddress) -> Result<ConnectStatus> {
        debug_assert!(self.is_open());

        match sys::sys_connect(self.id, addr.data()) {
            Ok(()) => Ok(ConnectStatus::Connected),
            Err(err) if sys::is_would_block(&err) => Ok(ConnectStatus::Pending),
            Err(err) => Err(Error::Connect(err)),
        }
    }

    /// Accepts a pending incoming connection.
    ///
    /// Returns the new connected socket and the peer's raw address, or
    /// `None` when no connection is currently pending (would-block is a
    /// normal outcome, not an error). The returned socket is non-blocking.
    pub fn accept(&self) -> Result<Option<(Socket, RawAddress)>> {
        debug_assert!(self.is_open());

        match sys::sys_accept(self.id) {
            Ok((id, storage, len)) => {
                // Take ownership of the descriptor before decoding the peer
                // address, so a decode failure still closes it on drop.
                let socket = Socket { id };
                let addr = RawAddress::from_bytes(&sys::storage_as_bytes(&storage)[..len])?;
                debug!("accepted socket {id} on {}", self.id);
                Ok(Some((socket, addr)))
            }
            Err(err) if sys::is_would_block(&err) => Ok(None),
            Err(err) => Err(Error::Accept(err)),
        }
    }

    /// Attempts to send a chunk of data.
    ///
    /// Returns the transfer status plus the number of bytes sent from the
    /// front of `data`. An empty input short-circuits to
    /// `(Success, 0)` without touching the OS.
    pub fn send(&self, data: &[u8]) -> Result<(TransferStatus, usize)> {
        if data.is_empty() {
            return Ok((TransferStatus::Success, 0));
        }

        debug_assert!(self.is_open());

        match sys::sys_send(self.id, data) {
            Ok(0) => Ok((TransferStatus::Disconnected, 0)),
            Ok(count) => Ok((TransferStatus::Success, count)),
            Err(err) if sys::is_would_block(&err) => Ok((TransferStatus::Blocked, 0)),
            Err(err) => Err(Error::Transfer(err)),
        }
    }

    /// Attempts to receive a chunk of data.
    ///
    /// Returns the transfer status plus the number of bytes written into the
    /// front of `data`. An empty output buffer short-circuits to
    /// `(Success, 0)` without touching the OS.
    pub fn recv(&self, data: &mut [u8]) -> Result<(TransferStatus, usize)> {
        if data.is_empty() {
            return Ok((TransferStatus::Success, 0));
        }

        debug_assert!(self.is_open());

        match sys::sys_recv(self.id, data) {
            Ok(0) => Ok((TransferStatus::Disconnected, 0)),
            Ok(count) => Ok((TransferStatus::Success, count)),
            Err(err) if sys::is_would_block(&err) => Ok((TransferStatus::Blocked, 0)),
            Err(err) => Err(Error::Transfer(err)),
        }
    }

    /// Returns the address the socket is locally bound to.
    ///
    /// Useful after binding to port 0 to discover the assigned port.
    pub fn local_address(&self) -> Result<RawAddress> {
        debug_assert!(self.is_open());

        let (storage, len) = sys::sys_local_address(self.id).map_err(Error::Name)?;
        RawAddress::from_bytes(&sys::storage_as_bytes(&storage)[..len])
    }
}

impl Drop for Socket {
    /// Closes the owned descriptor, if any.
    fn drop(&mut self) {
        self.close();
    }
}
