//! Readiness multiplexing over a set of sockets.
//!
//! A [`Poller`] maintains an interest set of `(descriptor, PollInterest)`
//! pairs and translates the OS readiness primitive into socket-semantic
//! statuses. The set is semantically unordered: removal swaps with the last
//! entry, so order across entries is not preserved and carries no meaning.
//!
//! `poll` is the only blocking operation in the crate. The batch it returns
//! borrows from the poller and is cleared and repopulated on every call, so
//! it cannot be retained past the next invocation.

use std::time::Duration;

use log::debug;

use crate::error::{Error, Result};
use crate::socket::SocketId;
use crate::sys;

/// What condition to watch a socket for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollInterest {
    /// Watch for connection completion. Produces
    /// [`PollStatus::ConnectionSucceeded`] or
    /// [`PollStatus::ConnectionFailed`].
    Connect,
    /// Watch for read availability. Produces [`PollStatus::ReadyToRead`].
    Read,
    /// Watch for both read and write availability. Produces
    /// [`PollStatus::ReadyToRead`] and/or [`PollStatus::ReadyToWrite`],
    /// possibly both in the same batch.
    ReadWrite,
}

/// A readiness status observed for a socket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollStatus {
    /// A pending connection attempt completed successfully.
    ConnectionSucceeded,
    /// A pending connection attempt failed (e.g. refused).
    ConnectionFailed,
    /// Data is available to be read from the socket.
    ReadyToRead,
    /// The socket can accept more data for writing.
    ReadyToWrite,
}

/// One readiness observation of a [`poll`](Poller::poll) batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollEvent {
    pub id: SocketId,
    pub status: PollStatus,
}

/// An interest set over sockets with a blocking readiness wait.
///
/// Each descriptor should appear at most once; duplicates are neither
/// detected nor rejected, so callers must not double-add. A `Poller` must be
/// confined to one thread or synchronized externally.
#[derive(Default)]
pub struct Poller {
    entries: Vec<sys::PollEntry>,
    interests: Vec<PollInterest>,
    results: Vec<PollEvent>,
}

impl Poller {
    /// Creates a poller with an empty interest set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a socket to the interest set.
    ///
    /// The caller must not add a descriptor that is already present; use
    /// [`update_socket`](Self::update_socket) to change its interest.
    pub fn add_socket(&mut self, id: SocketId, interest: PollInterest) {
        self.entries.push(sys::poll_entry(id, interest));
        self.interests.push(interest);
    }

    /// Replaces the interest of the first entry matching `id`.
    ///
    /// No-op if the descriptor is not in the set.
    pub fn update_socket(&mut self, id: SocketId, interest: PollInterest) {
        if let Some(ix) = self.position(id) {
            sys::entry_set_interest(&mut self.entries[ix], interest);
            self.interests[ix] = interest;
        }
    }

    /// Removes the entry matching `id` from the interest set.
    ///
    /// No-op if the descriptor is not in the set.
    pub fn remove_socket(&mut self, id: SocketId) {
        if let Some(ix) = self.position(id) {
            // Order is not meaningful, so swapping with the last entry keeps
            // removal cheap.
            self.entries.swap_remove(ix);
            self.interests.swap_remove(ix);
        }
    }

    fn position(&self, id: SocketId) -> Option<usize> {
        self.entries.iter().position(|e| sys::entry_id(e) == id)
    }

    /// Blocks up to `timeout` waiting for any interest to become ready.
    ///
    /// Returns as soon as at least one event is observed, or an empty batch
    /// once the timeout elapses. The timeout is truncated to whole
    /// milliseconds for the native wait primitive.
    ///
    /// The returned batch is a view owned by the poller; it is invalidated
    /// by the next `poll` call.
    pub fn poll(&mut self, timeout: Duration) -> Result<&[PollEvent]> {
        self.results.clear();

        let timeout_ms = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        sys::sys_poll(&mut self.entries, timeout_ms).map_err(Error::Poll)?;

        for (entry, interest) in self.entries.iter().zip(&self.interests) {
            let id = sys::entry_id(entry);

            match interest {
                PollInterest::Connect => {
                    if sys::entry_writable(entry) || sys::entry_failed(entry) {
                        // Write readiness alone cannot distinguish a
                        // completed connection from a refused one; the
                        // pending socket error settles it.
                        let status = match sys::sys_take_socket_error(id) {
                            Ok(()) if sys::entry_writable(entry) => {
                                PollStatus::ConnectionSucceeded
                            }
                            Ok(()) => PollStatus::ConnectionFailed,
                            Err(err) => {
                                debug!("connection failed on socket {id}: {err}");
                                PollStatus::ConnectionFailed
                            }
                        };
                        self.results.push(PollEvent { id, status });
                    }
                }

                PollInterest::Read => {
                    if sys::entry_readable(entry) {
                        self.results.push(PollEvent {
                            id,
                            status: PollStatus::ReadyToRead,
                        });
                    }
                }

                PollInterest::ReadWrite => {
                    if sys::entry_writable(entry) {
                        self.results.push(PollEvent {
                            id,
                            status: PollStatus::ReadyToWrite,
                        });
                    }
                    if sys::entry_readable(entry) {
                        self.results.push(PollEvent {
                            id,
                            status: PollStatus::ReadyToRead,
                        });
                    }
                }
            }
        }

        Ok(&self.results)
    }
}
