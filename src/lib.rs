//! Access to the Linux kernel crypto API's netlink interface.
//!
//! [`Conn`] sends a single `CRYPTO_MSG_GETALG` dump request over a
//! `NETLINK_CRYPTO` socket and decodes every reply into an [`Algorithm`].
//! The decoder itself is pure and works on any byte buffer, see
//! [`parse_algorithm`].
//!
//! For more information on the Linux kernel crypto API, please see
//! <https://www.kernel.org/doc/html/latest/crypto/index.html>.

pub mod algorithm;
pub mod conn;
pub mod decoder;
pub mod error;
pub mod transport;

pub use algorithm::{Algorithm, AlgorithmType, Cipher, Hash};
pub use conn::Conn;
pub use decoder::{encode_algorithm, parse_algorithm};
pub use error::{DecodeError, EncodeError, Error};
pub use transport::{NetlinkTransport, Request, Transport};
