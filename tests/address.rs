use sockwire::{Address, AddressType, FileAddress, Ipv4Address, Ipv6Address};

#[test]
fn test_plain_rendering() {
    let ipv4 = Ipv4Address {
        host: "127.0.0.1".into(),
        port: 5555,
    };
    assert_eq!(ipv4.to_string(), "127.0.0.1:5555");

    let ipv6 = Ipv6Address {
        host: "::1".into(),
        port: 5555,
    };
    assert_eq!(ipv6.to_string(), "::1:5555");

    let file = FileAddress {
        path: "./s.sock".into(),
    };
    assert_eq!(file.to_string(), "./s.sock");
}

#[test]
fn test_scheme_rendering() {
    let ipv4 = Address::Ipv4(Ipv4Address {
        host: "127.0.0.1".into(),
        port: 5555,
    });
    assert_eq!(ipv4.to_string(), "ipv4://127.0.0.1:5555");

    let ipv6 = Address::Ipv6(Ipv6Address {
        host: "::1".into(),
        port: 5555,
    });
    assert_eq!(ipv6.to_string(), "ipv6://::1:5555");

    let file = Address::File(FileAddress {
        path: "./s.sock".into(),
    });
    assert_eq!(file.to_string(), "file://./s.sock");
}

#[test]
fn test_address_type() {
    let ipv4: Address = Ipv4Address {
        host: "10.0.0.1".into(),
        port: 80,
    }
    .into();
    assert_eq!(ipv4.address_type(), AddressType::Ipv4);

    let ipv6: Address = Ipv6Address {
        host: "fe80::1".into(),
        port: 80,
    }
    .into();
    assert_eq!(ipv6.address_type(), AddressType::Ipv6);

    let file: Address = FileAddress {
        path: "/tmp/x.sock".into(),
    }
    .into();
    assert_eq!(file.address_type(), AddressType::File);
}

#[test]
fn test_structural_equality() {
    let a = Address::Ipv4(Ipv4Address {
        host: "127.0.0.1".into(),
        port: 5555,
    });
    let b = Address::Ipv4(Ipv4Address {
        host: "127.0.0.1".into(),
        port: 5555,
    });
    assert_eq!(a, b);

    let c = Address::Ipv4(Ipv4Address {
        host: "127.0.0.1".into(),
        port: 5556,
    });
    assert_ne!(a, c);

    let d = Address::Ipv6(Ipv6Address {
        host: "127.0.0.1".into(),
        port: 5555,
    });
    assert_ne!(a, d);

    // No validation happens at this layer; a nonsense host is still a value.
    let e = Address::Ipv4(Ipv4Address {
        host: "not an address".into(),
        port: 0,
    });
    assert_eq!(e.to_string(), "ipv4://not an address:0");
}
