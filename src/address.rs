//! Generic, platform-independent address values.
//!
//! Addresses are plain value types: structurally comparable, cheaply
//! clonable, and carrying no validation of their own. Whether a host string
//! is actually a well-formed numeric address is decided when the value is
//! encoded into a native buffer by [`RawAddress`](crate::RawAddress).
//!
//! Two renderings exist:
//! - the per-variant `Display` prints the plain form (`host:port`, or the
//!   bare path for file addresses),
//! - the [`Address`] union's `Display` prefixes the scheme
//!   (`ipv4://`, `ipv6://`, `file://`).

use std::fmt;

/// A host/port pair for an IPv4 endpoint.
///
/// `host` must be a textual numeric address (e.g. `"127.0.0.1"`), not a
/// hostname; no resolution is ever performed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ipv4Address {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for Ipv4Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A host/port pair for an IPv6 endpoint.
///
/// `host` must be a textual numeric address (e.g. `"::1"`), not a hostname.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ipv6Address {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for Ipv6Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A filesystem path for a local-domain (UNIX domain) endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FileAddress {
    pub path: String,
}

impl fmt::Display for FileAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Any of the supported address variants.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Address {
    Ipv4(Ipv4Address),
    Ipv6(Ipv6Address),
    File(FileAddress),
}

/// Discriminant of an [`Address`] value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressType {
    Ipv4,
    Ipv6,
    File,
}

impl Address {
    /// Returns which variant is active.
    pub fn address_type(&self) -> AddressType {
        match self {
            Address::Ipv4(_) => AddressType::Ipv4,
            Address::Ipv6(_) => AddressType::Ipv6,
            Address::File(_) => AddressType::File,
        }
    }
}

impl fmt::Display for Address {
    /// Renders the scheme-prefixed form: `ipv4://host:port`,
    /// `ipv6://host:port`, or `file://path`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Ipv4(addr) => write!(f, "ipv4://{addr}"),
            Address::Ipv6(addr) => write!(f, "ipv6://{addr}"),
            Address::File(addr) => write!(f, "file://{addr}"),
        }
    }
}

impl From<Ipv4Address> for Address {
    fn from(addr: Ipv4Address) -> Self {
        Address::Ipv4(addr)
    }
}

impl From<Ipv6Address> for Address {
    fn from(addr: Ipv6Address) -> Self {
        Address::Ipv6(addr)
    }
}

impl From<FileAddress> for Address {
    fn from(addr: FileAddress) -> Self {
        Address::File(addr)
    }
}
