use std::io;

use thiserror::Error;

/// Errors produced while decoding a single `CRYPTO_MSG_GETALG` reply.
///
/// Each variant names the region of the message that was malformed. Offsets
/// are relative to the start of the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected number of bytes for crypto_user_alg, want: {want}, got: {got}")]
    MalformedHeader { want: usize, got: usize },

    #[error("truncated netlink attribute at offset {offset}: need {length} bytes, {remaining} remain")]
    TruncatedAttribute {
        offset: usize,
        length: usize,
        remaining: usize,
    },

    #[error("invalid netlink attribute length {length} at offset {offset}")]
    InvalidAttributeLength { offset: usize, length: usize },

    #[error("unexpected number of bytes for {report}, want: {want}, got: {got}")]
    MalformedReport {
        report: &'static str,
        want: usize,
        got: usize,
    },

    #[error("netlink attribute {attr_type} is not a {want}-byte value; length: {got}")]
    MalformedAttribute { attr_type: u16, want: usize, got: usize },
}

/// Errors produced while building netlink attributes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("netlink attribute {attr_type} value of {len} bytes does not fit in an attribute")]
    AttributeTooLarge { attr_type: u16, len: usize },
}

/// Errors returned by [`Conn`](crate::Conn).
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to decode algorithm message {index}")]
    Decode {
        index: usize,
        #[source]
        source: DecodeError,
    },

    #[error("netlink transport failed")]
    Transport(#[source] io::Error),
}

impl Error {
    /// The decoding failure behind this error, if any.
    pub fn decode_error(&self) -> Option<&DecodeError> {
        match self {
            Error::Decode { source, .. } => Some(source),
            Error::Transport(_) => None,
        }
    }
}
