//! Unix platform layer.
//!
//! Thin wrappers over the `libc` socket and `poll(2)` primitives used by the
//! rest of the crate. Every function keeps the raw call plus its error
//! capture in one place so the core stays free of `unsafe`.

use std::io;
use std::mem;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::ptr;

use libc::{
    AF_INET, AF_INET6, AF_UNIX, F_GETFL, F_SETFL, O_NONBLOCK, POLLERR, POLLHUP, POLLIN, POLLOUT,
    SHUT_RD, SHUT_RDWR, SHUT_WR, SO_ERROR, SO_REUSEADDR, SOCK_STREAM, SOL_SOCKET, c_int, c_short,
    nfds_t, pollfd, sockaddr, sockaddr_in, sockaddr_in6, sockaddr_storage, sockaddr_un, socklen_t,
};

use crate::poller::PollInterest;
use crate::socket::{ShutdownKind, SocketId};

/// Native address buffer type.
pub(crate) type AddrStorage = sockaddr_storage;

/// Total capacity of the native address buffer in bytes.
pub(crate) const STORAGE_CAPACITY: usize = mem::size_of::<sockaddr_storage>();

pub(crate) const FAMILY_IPV4: u16 = AF_INET as u16;
pub(crate) const FAMILY_IPV6: u16 = AF_INET6 as u16;
pub(crate) const FAMILY_FILE: u16 = AF_UNIX as u16;

/// Exact native structure length for each supported family.
pub(crate) const IPV4_ADDR_LEN: usize = mem::size_of::<sockaddr_in>();
pub(crate) const IPV6_ADDR_LEN: usize = mem::size_of::<sockaddr_in6>();
pub(crate) const FILE_ADDR_LEN: usize = mem::size_of::<sockaddr_un>();

/// Size of the `sun_path` field: everything after the leading length/family
/// bytes of `sockaddr_un`.
pub(crate) const PATH_CAPACITY: usize = mem::size_of::<sockaddr_un>() - 2;

pub(crate) fn storage_family(storage: &AddrStorage) -> u16 {
    storage.ss_family as u16
}

/// Views the full native buffer as bytes.
pub(crate) fn storage_as_bytes(storage: &AddrStorage) -> &[u8] {
    unsafe { std::slice::from_raw_parts(storage as *const _ as *const u8, STORAGE_CAPACITY) }
}

/// Builds a zero-padded native buffer from raw bytes.
///
/// `data` must not exceed [`STORAGE_CAPACITY`]; the caller validates this.
pub(crate) fn storage_from_bytes(data: &[u8]) -> AddrStorage {
    debug_assert!(data.len() <= STORAGE_CAPACITY);

    let mut storage: AddrStorage = unsafe { mem::zeroed() };
    unsafe {
        ptr::copy_nonoverlapping(data.as_ptr(), &mut storage as *mut _ as *mut u8, data.len());
    }
    storage
}

pub(crate) fn encode_ipv4(host: Ipv4Addr, port: u16) -> AddrStorage {
    let mut storage: AddrStorage = unsafe { mem::zeroed() };
    let sa = unsafe { &mut *(&mut storage as *mut _ as *mut sockaddr_in) };
    sa.sin_family = FAMILY_IPV4 as _;
    sa.sin_port = port.to_be();
    sa.sin_addr.s_addr = u32::from(host).to_be();
    storage
}

pub(crate) fn encode_ipv6(host: Ipv6Addr, port: u16) -> AddrStorage {
    let mut storage: AddrStorage = unsafe { mem::zeroed() };
    let sa = unsafe { &mut *(&mut storage as *mut _ as *mut sockaddr_in6) };
    sa.sin6_family = FAMILY_IPV6 as _;
    sa.sin6_port = port.to_be();
    sa.sin6_addr.s6_addr = host.octets();
    storage
}

/// Encodes a file-domain path.
///
/// The caller guarantees `path` fits `PATH_CAPACITY - 1` bytes; the zeroed
/// tail of the buffer provides the terminator.
pub(crate) fn encode_path(path: &str) -> AddrStorage {
    debug_assert!(path.len() < PATH_CAPACITY);

    let mut storage: AddrStorage = unsafe { mem::zeroed() };
    let sa = unsafe { &mut *(&mut storage as *mut _ as *mut sockaddr_un) };
    sa.sun_family = FAMILY_FILE as _;
    unsafe {
        ptr::copy_nonoverlapping(
            path.as_ptr(),
            sa.sun_path.as_mut_ptr() as *mut u8,
            path.len(),
        );
    }
    storage
}

pub(crate) fn decode_ipv4(storage: &AddrStorage) -> (Ipv4Addr, u16) {
    let sa = unsafe { &*(storage as *const _ as *const sockaddr_in) };
    (
        Ipv4Addr::from(u32::from_be(sa.sin_addr.s_addr)),
        u16::from_be(sa.sin_port),
    )
}

pub(crate) fn decode_ipv6(storage: &AddrStorage) -> (Ipv6Addr, u16) {
    let sa = unsafe { &*(storage as *const _ as *const sockaddr_in6) };
    (
        Ipv6Addr::from(sa.sin6_addr.s6_addr),
        u16::from_be(sa.sin6_port),
    )
}

/// Returns the path bytes of a file-domain buffer, up to the terminator.
pub(crate) fn decode_path(storage: &AddrStorage) -> Vec<u8> {
    let sa = unsafe { &*(storage as *const _ as *const sockaddr_un) };
    let bytes: &[u8] =
        unsafe { std::slice::from_raw_parts(sa.sun_path.as_ptr() as *const u8, sa.sun_path.len()) };
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    bytes[..end].to_vec()
}

/// Creates a non-blocking stream socket in the given family.
///
/// If non-blocking mode cannot be set, the half-created descriptor is closed
/// before the error is returned.
pub(crate) fn sys_socket(family: u16) -> io::Result<SocketId> {
    let fd = unsafe { libc::socket(family as c_int, SOCK_STREAM, 0) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }

    if let Err(e) = sys_set_nonblocking(fd) {
        unsafe { libc::close(fd) };
        return Err(e);
    }

    Ok(fd)
}

pub(crate) fn sys_close(id: SocketId) {
    unsafe { libc::close(id) };
}

/// Switches a descriptor to non-blocking mode.
pub(crate) fn sys_set_nonblocking(id: SocketId) -> io::Result<()> {
    let flags = unsafe { libc::fcntl(id, F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }

    let rc = unsafe { libc::fcntl(id, F_SETFL, flags | O_NONBLOCK) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

pub(crate) fn sys_set_reuse_address(id: SocketId, value: bool) -> io::Result<()> {
    let opt: c_int = if value { 1 } else { 0 };
    let rc = unsafe {
        libc::setsockopt(
            id,
            SOL_SOCKET,
            SO_REUSEADDR,
            &opt as *const _ as *const _,
            mem::size_of::<c_int>() as socklen_t,
        )
    };

    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

pub(crate) fn sys_shutdown(id: SocketId, kind: ShutdownKind) -> io::Result<()> {
    let how = match kind {
        ShutdownKind::Read => SHUT_RD,
        ShutdownKind::Write => SHUT_WR,
        ShutdownKind::ReadWrite => SHUT_RDWR,
    };

    let rc = unsafe { libc::shutdown(id, how) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Binds a socket to an encoded address; `addr` is the exact-length byte
/// view of a native buffer.
pub(crate) fn sys_bind(id: SocketId, addr: &[u8]) -> io::Result<()> {
    let rc = unsafe { libc::bind(id, addr.as_ptr() as *const sockaddr, addr.len() as socklen_t) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

pub(crate) fn sys_listen(id: SocketId, backlog: i32) -> io::Result<()> {
    let rc = unsafe { libc::listen(id, backlog) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

pub(crate) fn sys_connect(id: SocketId, addr: &[u8]) -> io::Result<()> {
    let rc =
        unsafe { libc::connect(id, addr.as_ptr() as *const sockaddr, addr.len() as socklen_t) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Accepts a pending connection, returning the new descriptor and the native
/// peer-address buffer the OS populated.
///
/// The returned descriptor is switched to non-blocking mode; on failure it is
/// closed before the error is returned.
pub(crate) fn sys_accept(id: SocketId) -> io::Result<(SocketId, AddrStorage, usize)> {
    let mut storage: AddrStorage = unsafe { mem::zeroed() };
    let mut len = STORAGE_CAPACITY as socklen_t;

    let client = unsafe { libc::accept(id, &mut storage as *mut _ as *mut sockaddr, &mut len) };
    if client < 0 {
        return Err(io::Error::last_os_error());
    }

    if let Err(e) = sys_set_nonblocking(client) {
        unsafe { libc::close(client) };
        return Err(e);
    }

    Ok((client, storage, len as usize))
}

pub(crate) fn sys_send(id: SocketId, data: &[u8]) -> io::Result<usize> {
    let count = unsafe { libc::send(id, data.as_ptr() as *const _, data.len(), 0) };
    if count < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(count as usize)
    }
}

pub(crate) fn sys_recv(id: SocketId, data: &mut [u8]) -> io::Result<usize> {
    let count = unsafe { libc::recv(id, data.as_mut_ptr() as *mut _, data.len(), 0) };
    if count < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(count as usize)
    }
}

/// Returns the locally bound address of a socket.
pub(crate) fn sys_local_address(id: SocketId) -> io::Result<(AddrStorage, usize)> {
    let mut storage: AddrStorage = unsafe { mem::zeroed() };
    let mut len = STORAGE_CAPACITY as socklen_t;

    let rc = unsafe { libc::getsockname(id, &mut storage as *mut _ as *mut sockaddr, &mut len) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok((storage, len as usize))
    }
}

/// Retrieves and clears the pending socket error via `SO_ERROR`.
///
/// Returns `Ok(())` if no error is pending, or the pending error otherwise.
pub(crate) fn sys_take_socket_error(id: SocketId) -> io::Result<()> {
    let mut err: c_int = 0;
    let mut len = mem::size_of::<c_int>() as socklen_t;

    let rc = unsafe {
        libc::getsockopt(
            id,
            SOL_SOCKET,
            SO_ERROR,
            &mut err as *mut _ as *mut _,
            &mut len,
        )
    };

    if rc < 0 {
        Err(io::Error::last_os_error())
    } else if err != 0 {
        Err(io::Error::from_raw_os_error(err))
    } else {
        Ok(())
    }
}

/// Classifies an error as the expected non-blocking would-block outcome.
pub(crate) fn is_would_block(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock || err.raw_os_error() == Some(libc::EINPROGRESS)
}

/// One slot of the readiness wait set.
pub(crate) type PollEntry = pollfd;

fn interest_events(interest: PollInterest) -> c_short {
    match interest {
        PollInterest::Connect => POLLOUT,
        PollInterest::Read => POLLIN,
        PollInterest::ReadWrite => POLLIN | POLLOUT,
    }
}

pub(crate) fn poll_entry(id: SocketId, interest: PollInterest) -> PollEntry {
    pollfd {
        fd: id,
        events: interest_events(interest),
        revents: 0,
    }
}

pub(crate) fn entry_id(entry: &PollEntry) -> SocketId {
    entry.fd
}

pub(crate) fn entry_set_interest(entry: &mut PollEntry, interest: PollInterest) {
    entry.events = interest_events(interest);
}

pub(crate) fn entry_readable(entry: &PollEntry) -> bool {
    entry.revents & POLLIN != 0
}

pub(crate) fn entry_writable(entry: &PollEntry) -> bool {
    entry.revents & POLLOUT != 0
}

/// True when the descriptor reported an error or hang-up condition.
pub(crate) fn entry_failed(entry: &PollEntry) -> bool {
    entry.revents & (POLLERR | POLLHUP) != 0
}

/// Blocks up to `timeout_ms` waiting for readiness on any entry.
pub(crate) fn sys_poll(entries: &mut [PollEntry], timeout_ms: i32) -> io::Result<()> {
    let rc = unsafe { libc::poll(entries.as_mut_ptr(), entries.len() as nfds_t, timeout_ms) };
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// No socket subsystem setup is required on Unix platforms.
pub(crate) fn sys_startup() -> io::Result<()> {
    Ok(())
}

pub(crate) fn sys_cleanup() {}
