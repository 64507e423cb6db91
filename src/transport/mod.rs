//! Transports that carry `crypto_user` requests to the kernel.

use std::io;

#[cfg(target_os = "linux")]
mod netlink;
#[cfg(not(target_os = "linux"))]
#[path = "unsupported.rs"]
mod netlink;

pub use netlink::NetlinkTransport;

/// Netlink protocol number of the kernel crypto API.
pub const NETLINK_CRYPTO: i32 = 21;

/// Request type that reports one or all registered algorithms.
pub const CRYPTO_MSG_GETALG: u16 = 0x13;

// Netlink control message types
pub const NLMSG_NOOP: u16 = 1;
pub const NLMSG_ERROR: u16 = 2;
pub const NLMSG_DONE: u16 = 3;
pub const NLMSG_OVERRUN: u16 = 4;

/// Types below this value are reserved for netlink control messages.
pub const NLMSG_MIN_TYPE: u16 = 0x10;

/// Size of `struct nlmsghdr`.
pub const NLMSG_HDRLEN: usize = 16;

// Netlink message header flags
pub mod flags {
    pub const REQUEST: u16 = 0x1;
    pub const MULTI: u16 = 0x2;
    pub const ACK: u16 = 0x4;
    pub const ROOT: u16 = 0x100;
    pub const MATCH: u16 = 0x200;
    pub const DUMP: u16 = ROOT | MATCH;
}

/// A single request sent to the kernel. The transport fills in the length,
/// sequence number and port ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub message_type: u16,
    pub flags: u16,
    pub payload: Vec<u8>,
}

impl Request {
    /// Dump request for every algorithm registered with the kernel.
    pub fn dump_algorithms() -> Self {
        Self {
            message_type: CRYPTO_MSG_GETALG,
            flags: flags::REQUEST | flags::ACK | flags::DUMP,
            payload: Vec::new(),
        }
    }
}

/// A connection able to perform one request/reply exchange at a time.
pub trait Transport {
    /// Sends `request` and collects the payload of every reply message, in
    /// the order the kernel sent them.
    fn execute(&mut self, request: &Request) -> io::Result<Vec<Vec<u8>>>;

    /// Releases the connection.
    fn close(&mut self) -> io::Result<()>;
}
