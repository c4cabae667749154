//! End-to-end scenarios against live OS sockets.
//!
//! Every listener binds 127.0.0.1 port 0 and recovers the assigned port via
//! `local_address`, so the tests are safe to run in parallel.

use std::time::{Duration, Instant};

use sockwire::{
    Address, ConnectStatus, Context, Error, FileAddress, Ipv4Address, PollInterest, PollStatus,
    Poller, RawAddress, Socket, SocketDomain, SocketType, TransferStatus,
};

const POLL_SLICE: Duration = Duration::from_millis(150);
const DEADLINE: Duration = Duration::from_secs(5);

fn loopback(port: u16) -> RawAddress {
    RawAddress::from_address(&Address::Ipv4(Ipv4Address {
        host: "127.0.0.1".into(),
        port,
    }))
    .expect("failed to encode loopback address")
}

/// Opens a listening IPv4 socket on an OS-assigned loopback port.
fn listening_server() -> (Socket, RawAddress) {
    let mut server = Socket::new();
    server
        .open(SocketDomain::Ipv4, SocketType::Stream)
        .expect("failed to open server socket");
    server
        .set_reuse_address_option(true)
        .expect("failed to set address reuse");
    server.bind(&loopback(0)).expect("failed to bind server");
    server.listen(1).expect("failed to listen");

    let bound = server
        .local_address()
        .expect("failed to get bound address");

    (server, bound)
}

/// Drives a full connect/accept handshake and returns
/// `(server, accepted, client)`. The client is left registered for `Read`
/// in the returned poller.
fn connect_pair() -> (Socket, Socket, Socket, Poller) {
    let (server, bound) = listening_server();

    let mut client = Socket::new();
    client
        .open(SocketDomain::Ipv4, SocketType::Stream)
        .expect("failed to open client socket");
    let status = client.connect(&bound).expect("failed to start connect");

    let mut poller = Poller::new();
    poller.add_socket(server.id(), PollInterest::Read);
    poller.add_socket(client.id(), PollInterest::Connect);

    let mut connected = status == ConnectStatus::Connected;
    let mut accepted: Option<Socket> = None;

    let deadline = Instant::now() + DEADLINE;
    while (!connected || accepted.is_none()) && Instant::now() < deadline {
        for event in poller.poll(POLL_SLICE).expect("poll failed") {
            if event.id == server.id() && event.status == PollStatus::ReadyToRead {
                if let Some((sock, _peer)) = server.accept().expect("accept failed") {
                    accepted = Some(sock);
                }
            } else if event.id == client.id() && event.status == PollStatus::ConnectionSucceeded {
                connected = true;
            }
        }
    }

    assert!(connected, "client never observed connection success");
    let accepted = accepted.expect("server never accepted a connection");

    poller.remove_socket(server.id());
    poller.update_socket(client.id(), PollInterest::Read);

    (server, accepted, client, poller)
}

#[test]
fn test_connection_succeeds() {
    let _ctx = Context::new().expect("failed to create context");

    let (server, accepted, client, _poller) = connect_pair();
    assert!(server.is_open());
    assert!(accepted.is_open());
    assert!(client.is_open());

    // The accepted connection's local endpoint lives on loopback.
    let local = accepted
        .local_address()
        .expect("failed to get accepted socket address")
        .address()
        .expect("failed to decode accepted socket address");
    match local {
        Address::Ipv4(a) => assert_eq!(a.host, "127.0.0.1"),
        other => panic!("unexpected accepted socket address: {other}"),
    }
}

#[test]
fn test_transfer() {
    let _ctx = Context::new().expect("failed to create context");

    let (_server, accepted, client, mut poller) = connect_pair();

    let message = b"hello from the server";
    let mut sent = 0;
    while sent < message.len() {
        let (status, count) = accepted.send(&message[sent..]).expect("send failed");
        assert_ne!(status, TransferStatus::Disconnected);
        sent += count;
    }

    let mut buffer = [0u8; 64];
    let mut received = 0;
    let deadline = Instant::now() + DEADLINE;
    while received < message.len() && Instant::now() < deadline {
        let mut readable = false;
        for event in poller.poll(POLL_SLICE).expect("poll failed") {
            if event.id == client.id() && event.status == PollStatus::ReadyToRead {
                readable = true;
            }
        }
        if !readable {
            continue;
        }

        let (status, count) = client.recv(&mut buffer[received..]).expect("recv failed");
        assert_eq!(status, TransferStatus::Success);
        received += count;
    }

    assert_eq!(received, message.len());
    assert_eq!(&buffer[..received], message);
}

#[test]
fn test_connection_refused_never_succeeds() {
    let _ctx = Context::new().expect("failed to create context");

    // A bound but never-listening socket reserves a port that refuses
    // connections for the duration of the test.
    let mut reserved = Socket::new();
    reserved
        .open(SocketDomain::Ipv4, SocketType::Stream)
        .expect("failed to open socket");
    reserved.bind(&loopback(0)).expect("failed to bind");
    let dead_addr = reserved.local_address().expect("failed to get address");

    let mut client = Socket::new();
    client
        .open(SocketDomain::Ipv4, SocketType::Stream)
        .expect("failed to open client socket");

    match client.connect(&dead_addr) {
        // Refused synchronously; equally a non-success.
        Err(Error::Connect(_)) => return,
        Ok(_) => {}
        Err(err) => panic!("unexpected connect error: {err}"),
    }

    let mut poller = Poller::new();
    poller.add_socket(client.id(), PollInterest::Connect);

    let mut failed = false;
    let deadline = Instant::now() + DEADLINE;
    while !failed && Instant::now() < deadline {
        for event in poller.poll(POLL_SLICE).expect("poll failed") {
            assert_ne!(
                event.status,
                PollStatus::ConnectionSucceeded,
                "connect to a non-listening port reported success"
            );
            if event.status == PollStatus::ConnectionFailed {
                failed = true;
            }
        }
    }

    assert!(failed, "refused connect never reported ConnectionFailed");
}

#[test]
fn test_accept_with_nothing_pending() {
    let _ctx = Context::new().expect("failed to create context");

    let (server, _bound) = listening_server();
    assert!(server.accept().expect("accept failed").is_none());
}

#[test]
fn test_empty_transfer_short_circuits() {
    // Empty buffers succeed with zero bytes without touching the OS, even
    // on a socket that owns no descriptor.
    let sock = Socket::new();
    assert!(!sock.is_open());

    assert_eq!(sock.send(&[]).unwrap(), (TransferStatus::Success, 0));

    let mut empty: [u8; 0] = [];
    assert_eq!(sock.recv(&mut empty).unwrap(), (TransferStatus::Success, 0));
}

#[test]
fn test_recv_would_block() {
    let _ctx = Context::new().expect("failed to create context");

    let (_server, _accepted, client, _poller) = connect_pair();

    let mut buffer = [0u8; 16];
    let (status, count) = client.recv(&mut buffer).expect("recv failed");
    assert_eq!(status, TransferStatus::Blocked);
    assert_eq!(count, 0);
}

#[test]
fn test_shutdown_disconnects_peer() {
    let _ctx = Context::new().expect("failed to create context");

    let (_server, accepted, client, mut poller) = connect_pair();

    accepted
        .shutdown(sockwire::ShutdownKind::Write)
        .expect("shutdown failed");

    let mut buffer = [0u8; 16];
    let deadline = Instant::now() + DEADLINE;
    loop {
        assert!(Instant::now() < deadline, "never observed disconnect");

        let mut readable = false;
        for event in poller.poll(POLL_SLICE).expect("poll failed") {
            if event.id == client.id() && event.status == PollStatus::ReadyToRead {
                readable = true;
            }
        }
        if !readable {
            continue;
        }

        let (status, count) = client.recv(&mut buffer).expect("recv failed");
        assert_eq!(status, TransferStatus::Disconnected);
        assert_eq!(count, 0);
        break;
    }
}

#[test]
fn test_interest_update_changes_evaluation() {
    let _ctx = Context::new().expect("failed to create context");

    // connect_pair already flips the client from Connect to Read; once data
    // arrives, only ReadyToRead may be reported for it.
    let (_server, accepted, client, mut poller) = connect_pair();

    let (status, count) = accepted.send(b"x").expect("send failed");
    assert_eq!(status, TransferStatus::Success);
    assert_eq!(count, 1);

    let deadline = Instant::now() + DEADLINE;
    let mut saw_read = false;
    while !saw_read && Instant::now() < deadline {
        for event in poller.poll(POLL_SLICE).expect("poll failed") {
            assert_eq!(event.id, client.id());
            assert_eq!(event.status, PollStatus::ReadyToRead);
            saw_read = true;
        }
    }

    assert!(saw_read, "updated interest never produced ReadyToRead");
}

#[test]
fn test_poll_timeout_on_empty_set() {
    let _ctx = Context::new().expect("failed to create context");

    let mut poller = Poller::new();
    let start = Instant::now();
    let events = poller.poll(Duration::from_millis(100)).expect("poll failed");
    assert!(events.is_empty());
    assert!(Instant::now() - start >= Duration::from_millis(90));
}

/// Encodes a per-test file-domain address under the temp directory, clearing
/// any stale socket file first.
#[cfg(unix)]
fn file_socket_address(tag: &str) -> (RawAddress, std::path::PathBuf) {
    let path = std::env::temp_dir().join(format!("sockwire-{tag}-{}.sock", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let raw = RawAddress::from_address(&Address::File(FileAddress {
        path: path.to_str().expect("temp path is not text").into(),
    }))
    .expect("failed to encode file address");

    (raw, path)
}

#[cfg(unix)]
#[test]
fn test_file_domain_accept() {
    let _ctx = Context::new().expect("failed to create context");
    let (addr, path) = file_socket_address("accept");

    let mut server = Socket::new();
    server
        .open(SocketDomain::File, SocketType::Stream)
        .expect("failed to open server socket");
    server.bind(&addr).expect("failed to bind file socket");
    server.listen(1).expect("failed to listen");

    let mut client = Socket::new();
    client
        .open(SocketDomain::File, SocketType::Stream)
        .expect("failed to open client socket");
    client.connect(&addr).expect("failed to connect");

    let mut poller = Poller::new();
    poller.add_socket(server.id(), PollInterest::Read);

    let mut accepted = None;
    let deadline = Instant::now() + DEADLINE;
    while accepted.is_none() && Instant::now() < deadline {
        for event in poller.poll(POLL_SLICE).expect("poll failed") {
            if event.id == server.id() && event.status == PollStatus::ReadyToRead {
                accepted = server.accept().expect("accept failed");
            }
        }
    }

    let (sock, peer) = accepted.expect("server never accepted the connection");
    assert!(sock.is_open());

    // The unbound connecting side is an unnamed peer: a file address whose
    // path is empty.
    match peer.address().expect("failed to decode peer address") {
        Address::File(f) => assert!(f.path.is_empty()),
        other => panic!("unexpected peer address family: {other}"),
    }

    let _ = std::fs::remove_file(&path);
}

#[cfg(target_os = "linux")]
fn open_descriptor_count() -> usize {
    std::fs::read_dir("/proc/self/fd")
        .expect("failed to read descriptor table")
        .count()
}

#[cfg(target_os = "linux")]
#[test]
fn test_accept_does_not_leak_descriptors() {
    let _ctx = Context::new().expect("failed to create context");
    let (addr, path) = file_socket_address("leak");

    let mut server = Socket::new();
    server
        .open(SocketDomain::File, SocketType::Stream)
        .expect("failed to open server socket");
    server.bind(&addr).expect("failed to bind file socket");
    server.listen(4).expect("failed to listen");

    let mut poller = Poller::new();
    poller.add_socket(server.id(), PollInterest::Read);

    const CYCLES: usize = 16;
    let before = open_descriptor_count();

    for _ in 0..CYCLES {
        let mut client = Socket::new();
        client
            .open(SocketDomain::File, SocketType::Stream)
            .expect("failed to open client socket");
        client.connect(&addr).expect("failed to connect");

        let mut accepted = None;
        let deadline = Instant::now() + DEADLINE;
        while accepted.is_none() && Instant::now() < deadline {
            for event in poller.poll(POLL_SLICE).expect("poll failed") {
                if event.id == server.id() && event.status == PollStatus::ReadyToRead {
                    accepted = server.accept().expect("accept failed");
                }
            }
        }
        assert!(accepted.is_some(), "server never accepted the connection");
        // client and the accepted socket drop here, releasing their
        // descriptors before the next cycle.
    }

    let after = open_descriptor_count();
    // Concurrent tests may hold a few descriptors of their own, but a leak
    // in the accept path would grow the table by one per cycle.
    assert!(
        after < before + CYCLES,
        "descriptor table grew from {before} to {after} over {CYCLES} accepts"
    );

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_remove_socket_is_idempotent() {
    let _ctx = Context::new().expect("failed to create context");

    let (server, _bound) = listening_server();

    let mut poller = Poller::new();
    poller.add_socket(server.id(), PollInterest::Read);
    poller.remove_socket(server.id());
    poller.remove_socket(server.id());

    let events = poller.poll(Duration::from_millis(10)).expect("poll failed");
    assert!(events.is_empty());
}
