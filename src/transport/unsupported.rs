use std::io;

use super::{Request, Transport};

/// Stand-in for platforms without netlink; every operation but `close`
/// fails.
pub struct NetlinkTransport {
    _private: (),
}

impl NetlinkTransport {
    pub fn dial() -> io::Result<Self> {
        Err(unsupported())
    }
}

impl Transport for NetlinkTransport {
    fn execute(&mut self, _request: &Request) -> io::Result<Vec<Vec<u8>>> {
        Err(unsupported())
    }

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn unsupported() -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!(
            "netlink crypto API not implemented on {}/{}",
            std::env::consts::OS,
            std::env::consts::ARCH
        ),
    )
}
