//! # Sockwire
//!
//! **Sockwire** is a thin, cross-platform abstraction over OS-level stream
//! sockets and readiness-based I/O multiplexing.
//!
//! It lets a caller open, bind, connect, accept, and transfer on non-blocking
//! sockets, and wait for readiness across a set of sockets, without touching
//! platform socket APIs directly. The crate is the substrate of a classic
//! single-threaded reactor loop:
//!
//! - build [`Address`] values and bridge them to native buffers with
//!   [`RawAddress`],
//! - drive [`Socket`] handles through their lifecycle,
//! - register descriptors with a [`Poller`] and dispatch on the
//!   `(descriptor, status)` events each `poll` call returns.
//!
//! All socket operations are non-blocking by construction and report
//! would-block conditions as ordinary statuses rather than errors; `poll` is
//! the only call that blocks, bounded by its timeout.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use sockwire::{
//!     Address, Context, Ipv4Address, PollInterest, PollStatus, Poller, RawAddress, Socket,
//!     SocketDomain, SocketType,
//! };
//!
//! fn main() -> sockwire::Result<()> {
//!     let _ctx = Context::new()?;
//!
//!     let addr = Address::Ipv4(Ipv4Address { host: "127.0.0.1".into(), port: 5555 });
//!     let raw = RawAddress::from_address(&addr)?;
//!
//!     let mut server = Socket::new();
//!     server.open(SocketDomain::Ipv4, SocketType::Stream)?;
//!     server.set_reuse_address_option(true)?;
//!     server.bind(&raw)?;
//!     server.listen(16)?;
//!
//!     let mut poller = Poller::new();
//!     poller.add_socket(server.id(), PollInterest::Read);
//!
//!     loop {
//!         for event in poller.poll(Duration::from_millis(150))? {
//!             if event.id == server.id() && event.status == PollStatus::ReadyToRead {
//!                 if let Some((_client, peer)) = server.accept()? {
//!                     println!("accepted {}", peer.to_text()?);
//!                 }
//!             }
//!         }
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`address`] — generic, platform-independent address values
//! - [`raw_address`] — bridge to the OS-native address buffer
//! - [`socket`] — non-blocking socket lifecycle and transfers
//! - [`poller`] — readiness multiplexing over a set of sockets
//! - [`context`] — process-wide platform setup and teardown

mod sys;

pub mod address;
pub mod context;
pub mod error;
pub mod poller;
pub mod raw_address;
pub mod socket;

pub use address::{Address, AddressType, FileAddress, Ipv4Address, Ipv6Address};
pub use context::Context;
pub use error::{Error, Result};
pub use poller::{PollEvent, PollInterest, PollStatus, Poller};
pub use raw_address::RawAddress;
pub use socket::{
    ConnectStatus, INVALID_SOCKET_ID, ShutdownKind, Socket, SocketDomain, SocketId, SocketType,
    TransferStatus,
};
