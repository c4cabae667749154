//! Bridge between generic address values and native address buffers.
//!
//! A [`RawAddress`] owns the fixed-capacity, family-tagged buffer the OS uses
//! to represent a socket endpoint, plus the logical length of the structure
//! stored in it. It is the only place where textual addresses are validated:
//! encoding parses hosts as numeric addresses and enforces the path capacity
//! of the file domain, and decoding checks the family tag and structure
//! length before trusting the bytes.
//!
//! A default-constructed value is in the "null" state: an all-zero buffer
//! with no valid family. Decoding or rendering a null raw address fails.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::address::{Address, FileAddress, Ipv4Address, Ipv6Address};
use crate::error::{Error, Result};
use crate::sys;

/// An OS-native rendition of a socket address.
///
/// Serves as the input to [`Socket::bind`](crate::Socket::bind) and
/// [`Socket::connect`](crate::Socket::connect), and as the output of
/// [`Socket::accept`](crate::Socket::accept) and
/// [`Socket::local_address`](crate::Socket::local_address).
#[derive(Clone, Copy)]
pub struct RawAddress {
    storage: sys::AddrStorage,
    len: usize,
}

impl Default for RawAddress {
    /// Constructs the null raw address: an all-zero buffer with no family.
    fn default() -> Self {
        Self {
            storage: sys::storage_from_bytes(&[]),
            len: 0,
        }
    }
}

impl RawAddress {
    /// Constructs the null raw address.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes a generic address into a native buffer.
    ///
    /// # Errors
    ///
    /// - [`Error::AddressFormat`] if an IPv4/IPv6 host is not a valid numeric
    ///   address for its family,
    /// - [`Error::EmptyPath`] if a file path is empty,
    /// - [`Error::PathTooLong`] if a file path exceeds the native path
    ///   capacity minus the terminator.
    pub fn from_address(addr: &Address) -> Result<Self> {
        match addr {
            Address::Ipv4(a) => {
                let host: Ipv4Addr = a.host.parse().map_err(|_| Error::AddressFormat {
                    family: "ipv4",
                    host: a.host.clone(),
                })?;

                Ok(Self {
                    storage: sys::encode_ipv4(host, a.port),
                    len: sys::IPV4_ADDR_LEN,
                })
            }

            Address::Ipv6(a) => {
                let host: Ipv6Addr = a.host.parse().map_err(|_| Error::AddressFormat {
                    family: "ipv6",
                    host: a.host.clone(),
                })?;

                Ok(Self {
                    storage: sys::encode_ipv6(host, a.port),
                    len: sys::IPV6_ADDR_LEN,
                })
            }

            Address::File(f) => {
                if f.path.is_empty() {
                    return Err(Error::EmptyPath);
                }

                // One byte of the path field is reserved for the terminator.
                let capacity = sys::PATH_CAPACITY - 1;
                if f.path.len() > capacity {
                    return Err(Error::PathTooLong {
                        length: f.path.len(),
                        capacity,
                    });
                }

                Ok(Self {
                    storage: sys::encode_path(&f.path),
                    len: sys::FILE_ADDR_LEN,
                })
            }
        }
    }

    /// Constructs a raw address from bytes of unknown provenance, as written
    /// by the OS on accept.
    ///
    /// # Errors
    ///
    /// - [`Error::OversizedBuffer`] if `data` exceeds the buffer capacity,
    /// - [`Error::UnsupportedFamily`] if the embedded family tag is unknown,
    /// - [`Error::MalformedAddress`] if the length does not equal the exact
    ///   native structure size for the embedded family. File-domain buffers
    ///   are the exception: the OS reports a peer with only as much of the
    ///   structure as is populated (an unnamed peer is just the family tag),
    ///   so any truncated length is accepted and the zero-padded tail
    ///   restores the full structure.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() > sys::STORAGE_CAPACITY {
            return Err(Error::OversizedBuffer {
                size: data.len(),
                capacity: sys::STORAGE_CAPACITY,
            });
        }

        const FAMILY_TAG_LEN: usize = 2;

        let storage = sys::storage_from_bytes(data);
        let len = match sys::storage_family(&storage) {
            sys::FAMILY_IPV4 if data.len() == sys::IPV4_ADDR_LEN => sys::IPV4_ADDR_LEN,
            sys::FAMILY_IPV6 if data.len() == sys::IPV6_ADDR_LEN => sys::IPV6_ADDR_LEN,
            sys::FAMILY_FILE
                if (FAMILY_TAG_LEN..=sys::FILE_ADDR_LEN).contains(&data.len()) =>
            {
                sys::FILE_ADDR_LEN
            }
            sys::FAMILY_IPV4 | sys::FAMILY_IPV6 | sys::FAMILY_FILE => {
                return Err(Error::MalformedAddress);
            }
            family => return Err(Error::UnsupportedFamily { family }),
        };

        Ok(Self { storage, len })
    }

    /// Returns the logical byte span of the stored structure.
    ///
    /// The slice covers exactly the recorded length, not the full buffer
    /// capacity; it is what gets handed to the OS on bind/connect.
    pub fn data(&self) -> &[u8] {
        &sys::storage_as_bytes(&self.storage)[..self.len]
    }

    /// Decodes the buffer back into a generic address.
    ///
    /// This is the structural inverse of [`from_address`](Self::from_address)
    /// for every valid address.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedFamily`] if the family is unset or unknown (the
    /// null state), [`Error::MalformedAddress`] if a file path is not valid
    /// text.
    pub fn address(&self) -> Result<Address> {
        match sys::storage_family(&self.storage) {
            sys::FAMILY_IPV4 => {
                let (host, port) = sys::decode_ipv4(&self.storage);
                Ok(Address::Ipv4(Ipv4Address {
                    host: host.to_string(),
                    port,
                }))
            }

            sys::FAMILY_IPV6 => {
                let (host, port) = sys::decode_ipv6(&self.storage);
                Ok(Address::Ipv6(Ipv6Address {
                    host: host.to_string(),
                    port,
                }))
            }

            sys::FAMILY_FILE => {
                let path =
                    String::from_utf8(sys::decode_path(&self.storage)).map_err(|_| Error::MalformedAddress)?;
                Ok(Address::File(FileAddress { path }))
            }

            family => Err(Error::UnsupportedFamily { family }),
        }
    }

    /// Renders the scheme-prefixed form of the decoded address.
    ///
    /// # Errors
    ///
    /// Fails whenever [`address`](Self::address) does.
    pub fn to_text(&self) -> Result<String> {
        Ok(self.address()?.to_string())
    }
}

impl fmt::Debug for RawAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawAddress")
            .field("family", &sys::storage_family(&self.storage))
            .field("len", &self.len)
            .finish()
    }
}
