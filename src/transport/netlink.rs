use std::io;
use std::mem;
use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd};

use tracing::debug;

use super::{
    NETLINK_CRYPTO, NLMSG_DONE, NLMSG_ERROR, NLMSG_HDRLEN, NLMSG_MIN_TYPE, NLMSG_NOOP, Request,
    Transport, flags,
};
use crate::decoder::binary_utils::DataReader;

// Large enough for any single dump datagram; the kernel caps its dump
// allocation below 64 KiB.
const RECV_BUFFER_SIZE: usize = 64 * 1024;

const fn nlmsg_align(len: usize) -> usize {
    (len + 3) & !3
}

/// A `NETLINK_CRYPTO` socket.
///
/// [`close`](Transport::close) is idempotent: closing an already closed
/// transport does nothing and returns `Ok(())`. Dropping the transport also
/// closes the socket.
pub struct NetlinkTransport {
    fd: Option<OwnedFd>,
    pid: u32,
    seq: u32,
}

impl NetlinkTransport {
    /// Opens and binds a socket to the kernel crypto API.
    pub fn dial() -> io::Result<Self> {
        // SAFETY: socket(2) takes no pointers; the result is checked below.
        let raw = unsafe {
            libc::socket(libc::AF_NETLINK, libc::SOCK_RAW | libc::SOCK_CLOEXEC, NETLINK_CRYPTO)
        };
        if raw < 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: raw is a freshly opened descriptor that nothing else owns.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        let mut addr = sockaddr_nl(0);
        let mut addr_len = mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t;
        // SAFETY: addr is a valid sockaddr_nl and addr_len is its exact size.
        let rc = unsafe {
            libc::bind(
                fd.as_raw_fd(),
                (&raw const addr).cast::<libc::sockaddr>(),
                addr_len,
            )
        };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }

        // Learn the port ID the kernel assigned to us.
        // SAFETY: addr and addr_len are valid for writes of a sockaddr_nl.
        let rc = unsafe {
            libc::getsockname(
                fd.as_raw_fd(),
                (&raw mut addr).cast::<libc::sockaddr>(),
                &mut addr_len,
            )
        };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }

        debug!(pid = addr.nl_pid, "dialed netlink crypto socket");

        Ok(Self {
            fd: Some(fd),
            pid: addr.nl_pid,
            seq: 0,
        })
    }

    fn raw_fd(&self) -> io::Result<i32> {
        self.fd
            .as_ref()
            .map(AsRawFd::as_raw_fd)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "netlink transport is closed"))
    }

    fn send(&mut self, request: &Request) -> io::Result<u32> {
        let fd = self.raw_fd()?;
        self.seq = self.seq.wrapping_add(1);

        let len = NLMSG_HDRLEN + request.payload.len();
        let nlmsg_len = u32::try_from(len)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "netlink request too large"))?;

        let mut buf = Vec::with_capacity(nlmsg_align(len));
        buf.extend_from_slice(&nlmsg_len.to_ne_bytes());
        buf.extend_from_slice(&request.message_type.to_ne_bytes());
        buf.extend_from_slice(&request.flags.to_ne_bytes());
        buf.extend_from_slice(&self.seq.to_ne_bytes());
        buf.extend_from_slice(&self.pid.to_ne_bytes());
        buf.extend_from_slice(&request.payload);
        buf.resize(nlmsg_align(len), 0);

        // Port ID 0 addresses the kernel.
        let dest = sockaddr_nl(0);
        loop {
            // SAFETY: buf and dest outlive the call and their lengths are exact.
            let n = unsafe {
                libc::sendto(
                    fd,
                    buf.as_ptr().cast::<libc::c_void>(),
                    buf.len(),
                    0,
                    (&raw const dest).cast::<libc::sockaddr>(),
                    mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t,
                )
            };
            if n >= 0 {
                break;
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }

        debug!(seq = self.seq, message_type = request.message_type, "sent netlink request");
        Ok(self.seq)
    }

    fn receive(&self, buf: &mut [u8]) -> io::Result<usize> {
        let fd = self.raw_fd()?;
        loop {
            // SAFETY: buf is valid for writes of buf.len() bytes.
            let n = unsafe {
                libc::recv(
                    fd,
                    buf.as_mut_ptr().cast::<libc::c_void>(),
                    buf.len(),
                    libc::MSG_TRUNC,
                )
            };
            if n >= 0 {
                // With MSG_TRUNC the real datagram length is returned.
                let n = n as usize;
                if n > buf.len() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("netlink datagram of {n} bytes exceeds receive buffer"),
                    ));
                }
                return Ok(n);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }
}

impl Transport for NetlinkTransport {
    fn execute(&mut self, request: &Request) -> io::Result<Vec<Vec<u8>>> {
        let seq = self.send(request)?;

        let mut buf = vec![0u8; RECV_BUFFER_SIZE];
        let mut replies = Vec::new();
        loop {
            let n = self.receive(&mut buf)?;
            if parse_messages(&buf[..n], seq, &mut replies)? {
                break;
            }
        }

        debug!(seq, replies = replies.len(), "netlink exchange complete");
        Ok(replies)
    }

    fn close(&mut self) -> io::Result<()> {
        let Some(fd) = self.fd.take() else {
            return Ok(());
        };

        // SAFETY: the descriptor was released from its OwnedFd and is closed
        // exactly once here.
        if unsafe { libc::close(fd.into_raw_fd()) } < 0 {
            return Err(io::Error::last_os_error());
        }

        debug!(pid = self.pid, "closed netlink crypto socket");
        Ok(())
    }
}

fn sockaddr_nl(pid: u32) -> libc::sockaddr_nl {
    // SAFETY: sockaddr_nl is plain old data; all zeroes is a valid value.
    let mut addr: libc::sockaddr_nl = unsafe { mem::zeroed() };
    addr.nl_family = libc::AF_NETLINK as libc::sa_family_t;
    addr.nl_pid = pid;
    addr
}

fn invalid_data(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

/// Splits one datagram into netlink messages, appending the payload of each
/// data message to `replies`. Returns `true` once the exchange is over.
fn parse_messages(buf: &[u8], seq: u32, replies: &mut Vec<Vec<u8>>) -> io::Result<bool> {
    let mut offset = 0;
    while offset < buf.len() {
        let mut reader = DataReader::new(buf, offset);
        let (Some(len), Some(msg_type), Some(msg_flags), Some(msg_seq), Some(_pid)) = (
            reader.read_u32(),
            reader.read_u16(),
            reader.read_u16(),
            reader.read_u32(),
            reader.read_u32(),
        ) else {
            return Err(invalid_data(format!("truncated netlink message header at offset {offset}")));
        };

        let len = len as usize;
        if len < NLMSG_HDRLEN || len > buf.len() - offset {
            return Err(invalid_data(format!("invalid netlink message length {len} at offset {offset}")));
        }
        if msg_seq != seq {
            return Err(invalid_data(format!(
                "mismatched netlink sequence number, want: {seq}, got: {msg_seq}"
            )));
        }

        let payload = &buf[offset + NLMSG_HDRLEN..offset + len];
        match msg_type {
            NLMSG_NOOP => {}
            // An error code of zero is an acknowledgement.
            NLMSG_DONE | NLMSG_ERROR => {
                check_errno(payload)?;
                return Ok(true);
            }
            control if control < NLMSG_MIN_TYPE => {
                return Err(invalid_data(format!(
                    "unexpected netlink control message type {control} at offset {offset}"
                )));
            }
            _ => {
                replies.push(payload.to_vec());
                if msg_flags & flags::MULTI == 0 {
                    return Ok(true);
                }
            }
        }

        offset = (offset + nlmsg_align(len)).min(buf.len());
    }

    Ok(false)
}

fn check_errno(payload: &[u8]) -> io::Result<()> {
    match DataReader::new(payload, 0).read_i32() {
        Some(code) if code < 0 => Err(io::Error::from_raw_os_error(code.saturating_neg())),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::os::unix::net::UnixDatagram;

    use super::*;
    use crate::Conn;
    use crate::transport::NLMSG_OVERRUN;

    fn message(msg_type: u16, msg_flags: u16, seq: u32, payload: &[u8]) -> Vec<u8> {
        let len = NLMSG_HDRLEN + payload.len();
        let mut b = Vec::new();
        b.extend_from_slice(&(len as u32).to_ne_bytes());
        b.extend_from_slice(&msg_type.to_ne_bytes());
        b.extend_from_slice(&msg_flags.to_ne_bytes());
        b.extend_from_slice(&seq.to_ne_bytes());
        b.extend_from_slice(&1234u32.to_ne_bytes());
        b.extend_from_slice(payload);
        b.resize(nlmsg_align(len), 0);
        b
    }

    #[test]
    fn test_parse_multipart_until_done() {
        let mut first = message(0x13, flags::MULTI, 7, b"one");
        first.extend(message(NLMSG_NOOP, 0, 7, &[]));
        first.extend(message(0x13, flags::MULTI, 7, b"two!"));

        let mut replies = Vec::new();
        assert!(!parse_messages(&first, 7, &mut replies).unwrap());

        let done = message(NLMSG_DONE, flags::MULTI, 7, &0i32.to_ne_bytes());
        assert!(parse_messages(&done, 7, &mut replies).unwrap());

        assert_eq!(replies, vec![b"one".to_vec(), b"two!".to_vec()]);
    }

    #[test]
    fn test_parse_single_reply_without_multi() {
        let b = message(0x13, 0, 1, b"only");
        let mut replies = Vec::new();
        assert!(parse_messages(&b, 1, &mut replies).unwrap());
        assert_eq!(replies.len(), 1);
    }

    #[test]
    fn test_parse_error_and_ack() {
        let mut replies = Vec::new();

        let ack = message(NLMSG_ERROR, 0, 3, &0i32.to_ne_bytes());
        assert!(parse_messages(&ack, 3, &mut replies).unwrap());

        let eperm = message(NLMSG_ERROR, 0, 3, &(-libc::EPERM).to_ne_bytes());
        let err = parse_messages(&eperm, 3, &mut replies).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EPERM));

        let done = message(NLMSG_DONE, flags::MULTI, 3, &(-libc::EMSGSIZE).to_ne_bytes());
        let err = parse_messages(&done, 3, &mut replies).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EMSGSIZE));
    }

    #[test]
    fn test_parse_rejects_malformed_datagrams() {
        let mut replies = Vec::new();

        let wrong_seq = message(0x13, flags::MULTI, 2, b"x");
        let err = parse_messages(&wrong_seq, 1, &mut replies).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let mut too_long = message(0x13, flags::MULTI, 1, b"abcd");
        too_long[..4].copy_from_slice(&64u32.to_ne_bytes());
        let err = parse_messages(&too_long, 1, &mut replies).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let err = parse_messages(&[0u8; 6], 1, &mut replies).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        assert!(replies.is_empty());
    }

    #[test]
    fn test_parse_rejects_reserved_control_types() {
        let mut replies = Vec::new();

        let overrun = message(NLMSG_OVERRUN, 0, 5, &[0u8; 4]);
        let err = parse_messages(&overrun, 5, &mut replies).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let reserved = message(NLMSG_MIN_TYPE - 1, flags::MULTI, 5, b"data");
        let err = parse_messages(&reserved, 5, &mut replies).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        assert!(replies.is_empty());
    }

    #[test]
    fn test_close_is_idempotent() {
        let (sock, _peer) = UnixDatagram::pair().unwrap();
        let mut transport = NetlinkTransport {
            fd: Some(OwnedFd::from(sock)),
            pid: 0,
            seq: 0,
        };

        assert!(transport.close().is_ok());
        assert!(transport.close().is_ok());

        let err = transport.execute(&Request::dump_algorithms()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
        assert_eq!(transport.seq, 0);
    }

    #[test]
    #[ignore = "needs CAP_NET_ADMIN and the crypto_user module"]
    fn test_integration_conn_algorithms() {
        let mut conn = Conn::dial().unwrap();
        let algorithms = conn.algorithms().unwrap();
        conn.close().unwrap();
        conn.close().unwrap();

        let sha1 = algorithms
            .iter()
            .find(|a| a.name == "sha1")
            .expect("did not find SHA-1 hash implementation");
        assert_eq!(sha1.alg_type.type_name(), Some("shash"));
        match &sha1.alg_type {
            crate::AlgorithmType::Hash(h) => assert_eq!(h.digest_size, 20),
            other => panic!("unexpected SHA-1 type: {other:?}"),
        }
    }
}
