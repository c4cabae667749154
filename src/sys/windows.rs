//! Windows platform layer.
//!
//! Mirrors the Unix layer over WinSock: identical item names and semantics,
//! with `WSAPoll` standing in for `poll(2)`. The process-wide subsystem
//! setup (`WSAStartup`/`WSACleanup`) that WinSock requires is exposed through
//! [`sys_startup`]/[`sys_cleanup`] and driven by the public `Context` token.

use std::io;
use std::mem;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::ptr;
use std::time::Duration;

use windows_sys::Win32::Networking::WinSock::{
    AF_INET, AF_INET6, AF_UNIX, FIONBIO, INVALID_SOCKET, POLLERR, POLLHUP, POLLIN, POLLOUT,
    SD_BOTH, SD_RECEIVE, SD_SEND, SO_ERROR, SO_REUSEADDR, SOCK_STREAM, SOCKADDR, SOCKADDR_IN,
    SOCKADDR_IN6, SOCKADDR_STORAGE, SOCKADDR_UN, SOCKET, SOCKET_ERROR, SOL_SOCKET, WSACleanup,
    WSADATA, WSAEINPROGRESS, WSAPOLLFD, WSAPoll, WSAStartup, accept, bind, closesocket, connect,
    getsockname, getsockopt, ioctlsocket, listen, recv, send, setsockopt, shutdown, socket,
};

use crate::poller::PollInterest;
use crate::socket::{ShutdownKind, SocketId};

/// Native address buffer type.
pub(crate) type AddrStorage = SOCKADDR_STORAGE;

/// Total capacity of the native address buffer in bytes.
pub(crate) const STORAGE_CAPACITY: usize = mem::size_of::<SOCKADDR_STORAGE>();

pub(crate) const FAMILY_IPV4: u16 = AF_INET;
pub(crate) const FAMILY_IPV6: u16 = AF_INET6;
pub(crate) const FAMILY_FILE: u16 = AF_UNIX;

/// Exact native structure length for each supported family.
pub(crate) const IPV4_ADDR_LEN: usize = mem::size_of::<SOCKADDR_IN>();
pub(crate) const IPV6_ADDR_LEN: usize = mem::size_of::<SOCKADDR_IN6>();
pub(crate) const FILE_ADDR_LEN: usize = mem::size_of::<SOCKADDR_UN>();

/// Size of the `sun_path` field of `SOCKADDR_UN`.
pub(crate) const PATH_CAPACITY: usize = mem::size_of::<SOCKADDR_UN>() - 2;

pub(crate) fn storage_family(storage: &AddrStorage) -> u16 {
    storage.ss_family
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
    let sa = unsafe { &mut *(&mut storage as *mut _ as *mut SOCKADDR_IN) };
    sa.sin_family = FAMILY_IPV4;
    sa.sin_port = port.to_be();
    sa.sin_addr.S_un.S_addr = u32::from(host).to_be();
    storage
}

pub(crate) fn encode_ipv6(host: Ipv6Addr, port: u16) -> AddrStorage {
    let mut storage: AddrStorage = unsafe { mem::zeroed() };
    let sa = unsafe { &mut *(&mut storage as *mut _ as *mut SOCKADDR_IN6) };
    sa.sin6_family = FAMILY_IPV6;
    sa.sin6_port = port.to_be();
    sa.sin6_addr.u.Byte = host.octets();
    storage
}

/// Encodes a file-domain path.
///
/// The caller guarantees `path` fits `PATH_CAPACITY - 1` bytes; the zeroed
/// tail of the buffer provides the terminator.
pub(crate) fn encode_path(path: &str) -> AddrStorage {
    debug_assert!(path.len() < PATH_CAPACITY);

    let mut storage: AddrStorage = unsafe { mem::zeroed() };
    let sa = unsafe { &mut *(&mut storage as *mut _ as *mut SOCKADDR_UN) };
    sa.sun_family = FAMILY_FILE;
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
    let sa = unsafe { &*(storage as *const _ as *const SOCKADDR_IN) };
    (
        Ipv4Addr::from(u32::from_be(unsafe { sa.sin_addr.S_un.S_addr })),
        u16::from_be(sa.sin_port),
    )
}

pub(crate) fn decode_ipv6(storage: &AddrStorage) -> (Ipv6Addr, u16) {
    let sa = unsafe { &*(storage as *const _ as *const SOCKADDR_IN6) };
    (
        Ipv6Addr::from(unsafe { sa.sin6_addr.u.Byte }),
        u16::from_be(sa.sin6_port),
    )
}

/// Returns the path bytes of a file-domain buffer, up to the terminator.
pub(crate) fn decode_path(storage: &AddrStorage) -> Vec<u8> {
    let sa = unsafe { &*(storage as *const _ as *const SOCKADDR_UN) };
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
    let sock = unsafe { socket(family as i32, SOCK_STREAM, 0) };
    if sock == INVALID_SOCKET {
        return Err(io::Error::last_os_error());
    }

    if let Err(e) = sys_set_nonblocking(sock as SocketId) {
        unsafe { closesocket(sock) };
        return Err(e);
    }

    Ok(sock as SocketId)
}

pub(crate) fn sys_close(id: SocketId) {
    unsafe { closesocket(id as SOCKET) };
}

/// Switches a socket to non-blocking mode.
pub(crate) fn sys_set_nonblocking(id: SocketId) -> io::Result<()> {
    let mut nonblocking: u32 = 1;
    let rc = unsafe { ioctlsocket(id as SOCKET, FIONBIO, &mut nonblocking) };
    if rc != 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

pub(crate) fn sys_set_reuse_address(id: SocketId, value: bool) -> io::Result<()> {
    let opt: i32 = if value { 1 } else { 0 };
    let rc = unsafe {
        setsockopt(
            id as SOCKET,
            SOL_SOCKET,
            SO_REUSEADDR,
            &opt as *const _ as *const u8,
            mem::size_of::<i32>() as i32,
        )
    };

    if rc != 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

pub(crate) fn sys_shutdown(id: SocketId, kind: ShutdownKind) -> io::Result<()> {
    let how = match kind {
        ShutdownKind::Read => SD_RECEIVE,
        ShutdownKind::Write => SD_SEND,
        ShutdownKind::ReadWrite => SD_BOTH,
    };

    let rc = unsafe { shutdown(id as SOCKET, how) };
    if rc != 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Binds a socket to an encoded address; `addr` is the exact-length byte
/// view of a native buffer.
pub(crate) fn sys_bind(id: SocketId, addr: &[u8]) -> io::Result<()> {
    let rc = unsafe {
        bind(
            id as SOCKET,
            addr.as_ptr() as *const SOCKADDR,
            addr.len() as i32,
        )
    };

    if rc != 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

pub(crate) fn sys_listen(id: SocketId, backlog: i32) -> io::Result<()> {
    let rc = unsafe { listen(id as SOCKET, backlog) };
    if rc != 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

pub(crate) fn sys_connect(id: SocketId, addr: &[u8]) -> io::Result<()> {
    let rc = unsafe {
        connect(
            id as SOCKET,
            addr.as_ptr() as *const SOCKADDR,
            addr.len() as i32,
        )
    };

    if rc != 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Accepts a pending connection, returning the new socket and the native
/// peer-address buffer the OS populated.
///
/// The returned socket is switched to non-blocking mode; on failure it is
/// closed before the error is returned.
pub(crate) fn sys_accept(id: SocketId) -> io::Result<(SocketId, AddrStorage, usize)> {
    let mut storage: AddrStorage = unsafe { mem::zeroed() };
    let mut len = STORAGE_CAPACITY as i32;

    let client = unsafe {
        accept(
            id as SOCKET,
            &mut storage as *mut _ as *mut SOCKADDR,
            &mut len,
        )
    };
    if client == INVALID_SOCKET {
        return Err(io::Error::last_os_error());
    }

    if let Err(e) = sys_set_nonblocking(client as SocketId) {
        unsafe { closesocket(client) };
        return Err(e);
    }

    Ok((client as SocketId, storage, len as usize))
}

pub(crate) fn sys_send(id: SocketId, data: &[u8]) -> io::Result<usize> {
    let count = unsafe { send(id as SOCKET, data.as_ptr(), data.len() as i32, 0) };
    if count == SOCKET_ERROR {
        Err(io::Error::last_os_error())
    } else {
        Ok(count as usize)
    }
}

pub(crate) fn sys_recv(id: SocketId, data: &mut [u8]) -> io::Result<usize> {
    let count = unsafe { recv(id as SOCKET, data.as_mut_ptr(), data.len() as i32, 0) };
    if count == SOCKET_ERROR {
        Err(io::Error::last_os_error())
    } else {
        Ok(count as usize)
    }
}

/// Returns the locally bound address of a socket.
pub(crate) fn sys_local_address(id: SocketId) -> io::Result<(AddrStorage, usize)> {
    let mut storage: AddrStorage = unsafe { mem::zeroed() };
    let mut len = STORAGE_CAPACITY as i32;

    let rc = unsafe {
        getsockname(
            id as SOCKET,
            &mut storage as *mut _ as *mut SOCKADDR,
            &mut len,
        )
    };

    if rc != 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok((storage, len as usize))
    }
}

/// Retrieves and clears the pending socket error via `SO_ERROR`.
///
/// Returns `Ok(())` if no error is pending, or the pending error otherwise.
pub(crate) fn sys_take_socket_error(id: SocketId) -> io::Result<()> {
    let mut err: i32 = 0;
    let mut len = mem::size_of::<i32>() as i32;

    let rc = unsafe {
        getsockopt(
            id as SOCKET,
            SOL_SOCKET,
            SO_ERROR,
            &mut err as *mut _ as *mut u8,
            &mut len,
        )
    };

    if rc != 0 {
        Err(io::Error::last_os_error())
    } else if err != 0 {
        Err(io::Error::from_raw_os_error(err))
    } else {
        Ok(())
    }
}

/// Classifies an error as the expected non-blocking would-block outcome.
pub(crate) fn is_would_block(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock || err.raw_os_error() == Some(WSAEINPROGRESS)
}

/// One slot of the readiness wait set.
pub(crate) type PollEntry = WSAPOLLFD;

fn interest_events(interest: PollInterest) -> i16 {
    match interest {
        PollInterest::Connect => POLLOUT,
        PollInterest::Read => POLLIN,
        PollInterest::ReadWrite => POLLIN | POLLOUT,
    }
}

pub(crate) fn poll_entry(id: SocketId, interest: PollInterest) -> PollEntry {
    WSAPOLLFD {
        fd: id as SOCKET,
        events: interest_events(interest),
        revents: 0,
    }
}

pub(crate) fn entry_id(entry: &PollEntry) -> SocketId {
    entry.fd as SocketId
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

/// True when the socket reported an error or hang-up condition.
pub(crate) fn entry_failed(entry: &PollEntry) -> bool {
    entry.revents & (POLLERR | POLLHUP) != 0
}

/// Blocks up to `timeout_ms` waiting for readiness on any entry.
///
/// `WSAPoll` rejects an empty set, so that case degrades to a plain sleep to
/// preserve the bounded-wait contract.
pub(crate) fn sys_poll(entries: &mut [PollEntry], timeout_ms: i32) -> io::Result<()> {
    if entries.is_empty() {
        if timeout_ms > 0 {
            std::thread::sleep(Duration::from_millis(timeout_ms as u64));
        }
        return Ok(());
    }

    let rc = unsafe { WSAPoll(entries.as_mut_ptr(), entries.len() as u32, timeout_ms) };
    if rc == SOCKET_ERROR {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Creates a MAKEWORD value for the requested Winsock version.
#[inline]
const fn makeword(low: u8, high: u8) -> u16 {
    ((high as u16) << 8) | (low as u16)
}

/// Initializes Winsock.
///
/// `WSAStartup` is reference counted by the OS, so every `Context` may call
/// this and pair it with [`sys_cleanup`] on drop.
pub(crate) fn sys_startup() -> io::Result<()> {
    let mut data: WSADATA = unsafe { mem::zeroed() };
    let rc = unsafe { WSAStartup(makeword(2, 2), &mut data) };
    if rc != 0 {
        Err(io::Error::from_raw_os_error(rc))
    } else {
        Ok(())
    }
}

pub(crate) fn sys_cleanup() {
    unsafe { WSACleanup() };
}
