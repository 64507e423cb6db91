use tracing::debug;

use crate::algorithm::Algorithm;
use crate::decoder::parse_algorithm;
use crate::error::Error;
use crate::transport::{NetlinkTransport, Request, Transport};

/// A connection to the Linux kernel crypto API's netlink interface.
pub struct Conn<T: Transport = NetlinkTransport> {
    transport: T,
}

impl Conn<NetlinkTransport> {
    /// Dials a new netlink connection to the kernel crypto API.
    pub fn dial() -> Result<Self, Error> {
        NetlinkTransport::dial().map(Self::new).map_err(Error::Transport)
    }
}

impl<T: Transport> Conn<T> {
    /// Wraps an already established transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Retrieves all algorithms registered with the kernel, in the order the
    /// kernel reports them.
    ///
    /// Fails without returning any algorithms if any single reply cannot be
    /// decoded; a malformed reply means the stream can no longer be trusted.
    pub fn algorithms(&mut self) -> Result<Vec<Algorithm>, Error> {
        let msgs = self
            .transport
            .execute(&Request::dump_algorithms())
            .map_err(Error::Transport)?;

        debug!(messages = msgs.len(), "received crypto algorithm dump");

        msgs.iter()
            .enumerate()
            .map(|(index, m)| parse_algorithm(m).map_err(|source| Error::Decode { index, source }))
            .collect()
    }

    /// Closes the underlying transport.
    pub fn close(&mut self) -> Result<(), Error> {
        self.transport.close().map_err(Error::Transport)
    }
}
