//! Single-threaded reactor echo server.
//!
//! Run with `cargo run --example echo_server`, then connect with the
//! `echo_client` example (or `nc 127.0.0.1 7777`).

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

    let mut server = Socket::new();
    server.open(SocketDomain::Ipv4, SocketType::Stream)?;
    server.set_reuse_address_option(true)?;
    server.bind(&raw)?;
    server.listen(16)?;
    println!("echo server listening on {}", raw.to_text()?);

    let mut poller = Poller::new();
    poller.add_socket(server.id(), PollInterest::Read);

    let mut clients: Vec<Socket> = Vec::new();
    let mut buffer = [0u8; 1024];

    loop {
        // The batch borrows the poller, so copy it out before mutating the
        // interest set below.
        let events: Vec<_> = poller.poll(Duration::from_millis(250))?.to_vec();

        for event in events {
            if event.id == server.id() {
                if event.status == PollStatus::ReadyToRead {
                    while let Some((client, peer)) = server.accept()? {
                        println!("accepted {}", peer.to_text()?);
                        poller.add_socket(client.id(), PollInterest::Read);
                        clients.push(client);
                    }
                }
                continue;
            }

            if event.status != PollStatus::ReadyToRead {
                continue;
            }
            let Some(ix) = clients.iter().position(|c| c.id() == event.id) else {
                continue;
            };

            match clients[ix].recv(&mut buffer)? {
                (TransferStatus::Success, count) => {
                    // Echo back; a demo-sized payload will not block.
                    let mut sent = 0;
                    while sent < count {
                        let (status, n) = clients[ix].send(&buffer[sent..count])?;
                        if status != TransferStatus::Success {
                            break;
                        }
                        sent += n;
                    }
                }
                (TransferStatus::Blocked, _) => {}
                (TransferStatus::Disconnected, _) => {
                    println!("client disconnected");
                    poller.remove_socket(event.id);
                    clients.swap_remove(ix);
                }
            }
        }
    }
}
