//! Client for the reactor echo server.
//!
//! Run the `echo_server` example first, then
//! `cargo run --example echo_client`.

use std::time::Duration;

use sockwire::{
    Address, Context, Ipv4Address, PollInterest, PollStatus, Poller, RawAddress, Socket,
    SocketDomain, SocketType, TransferStatus,
};

fn main() -> sockwire::Result<()> {
    env_logger::init();

    let _ctx = Context::new()?;

    let addr = Address::Ipv4(Ipv4Address {
        host: "127.0.0.1".into(),
        port: 7777,
    });
    let raw = RawAddress::from_address(&addr)?;

    let mut client = Socket::new();
    client.open(SocketDomain::Ipv4, SocketType::Stream)?;
    client.connect(&raw)?;

    let mut poller = Poller::new();
    poller.add_socket(client.id(), PollInterest::Connect);

    'connecting: loop {
        for event in poller.poll(Duration::from_millis(250))? {
            match event.status {
                PollStatus::ConnectionSucceeded => break 'connecting,
                PollStatus::ConnectionFailed => {
                    eprintln!("connection refused; is the echo server running?");
                    return Ok(());
                }
                _ => {}
            }
        }
    }
    poller.update_socket(client.id(), PollInterest::Read);

    let message = b"hello, sockwire";
    let mut sent = 0;
    while sent < message.len() {
        let (status, count) = client.send(&message[sent..])?;
        if status == TransferStatus::Disconnected {
            eprintln!("server went away");
            return Ok(());
        }
        sent += count;
    }

    let mut buffer = [0u8; 1024];
    loop {
        for event in poller.poll(Duration::from_millis(250))? {
            if event.status != PollStatus::ReadyToRead {
                continue;
            }

            let (status, count) = client.recv(&mut buffer)?;
            if status == TransferStatus::Success {
                println!("echoed: {}", String::from_utf8_lossy(&buffer[..count]));
                return Ok(());
            }
        }
    }
}
