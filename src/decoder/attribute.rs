//! Netlink attribute (TLV) walking and encoding.
//!
//! An attribute is a native-endian `u16` length, a native-endian `u16` type
//! and `length - 4` bytes of value, padded to a 4-byte boundary. The length
//! covers the header and value but not the padding.

use super::binary_utils::{DataReader, str_from_bytes};
use crate::error::{DecodeError, EncodeError};

/// Size of `struct nlattr`.
pub const ATTR_HEADER_LEN: usize = 4;

const NLA_ALIGNTO: usize = 4;
const NLA_F_NESTED: u16 = 1 << 15;
const NLA_F_NET_BYTEORDER: u16 = 1 << 14;
const NLA_TYPE_MASK: u16 = !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);

/// Rounds `len` up to the netlink attribute alignment.
pub const fn align(len: usize) -> usize {
    (len + NLA_ALIGNTO - 1) & !(NLA_ALIGNTO - 1)
}

/// A cursor over a buffer of netlink attributes.
///
/// Call [`advance`](Self::advance) until it returns `false`, inspecting each
/// attribute through the typed accessors, then call
/// [`finish`](Self::finish). The walk stops at the first malformed attribute
/// and the error is only reported by `finish`, so a loop that ends early
/// looks exactly like one that ran out of input.
pub struct AttributeDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
    attr_type: u16,
    value: &'a [u8],
    err: Option<DecodeError>,
}

impl<'a> AttributeDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_offset(data, 0)
    }

    /// Creates a decoder whose error offsets are shifted by `base`, for
    /// attribute buffers that sit behind a fixed header.
    pub fn with_offset(data: &'a [u8], base: usize) -> Self {
        Self {
            data,
            pos: 0,
            base,
            attr_type: 0,
            value: &[],
            err: None,
        }
    }

    /// Moves to the next attribute. Returns `false` once the buffer is
    /// exhausted or an error has been recorded.
    pub fn advance(&mut self) -> bool {
        if self.err.is_some() || self.pos >= self.data.len() {
            return false;
        }

        let offset = self.base + self.pos;
        let mut reader = DataReader::new(self.data, self.pos);
        let remaining = reader.remaining();

        let (Some(length), Some(raw_type)) = (reader.read_u16(), reader.read_u16()) else {
            self.fail(DecodeError::TruncatedAttribute {
                offset,
                length: ATTR_HEADER_LEN,
                remaining,
            });
            return false;
        };

        let length = usize::from(length);
        if length < ATTR_HEADER_LEN {
            self.fail(DecodeError::InvalidAttributeLength { offset, length });
            return false;
        }

        let Some(value) = reader.read_bytes(length - ATTR_HEADER_LEN) else {
            self.fail(DecodeError::TruncatedAttribute {
                offset,
                length,
                remaining,
            });
            return false;
        };

        self.attr_type = raw_type & NLA_TYPE_MASK;
        self.value = value;
        // The final attribute may omit its padding.
        self.pos = (self.pos + align(length)).min(self.data.len());

        true
    }

    /// Type of the current attribute with the nested and byte-order flags
    /// cleared.
    pub fn attr_type(&self) -> u16 {
        self.attr_type
    }

    /// Raw value of the current attribute.
    pub fn bytes(&self) -> &'a [u8] {
        self.value
    }

    /// Value of the current attribute as NUL-terminated text.
    pub fn string(&self) -> String {
        str_from_bytes(self.value).into_owned()
    }

    pub fn uint8(&mut self) -> u8 {
        self.fixed::<1>().map_or(0, |b| b[0])
    }

    pub fn uint16(&mut self) -> u16 {
        self.fixed().map_or(0, u16::from_ne_bytes)
    }

    pub fn uint32(&mut self) -> u32 {
        self.fixed().map_or(0, u32::from_ne_bytes)
    }

    pub fn uint64(&mut self) -> u64 {
        self.fixed().map_or(0, u64::from_ne_bytes)
    }

    /// Hands the current value to `f`; an error from `f` ends the walk.
    pub fn decode_with<F>(&mut self, f: F)
    where
        F: FnOnce(&'a [u8]) -> Result<(), DecodeError>,
    {
        if let Err(err) = f(self.value) {
            self.fail(err);
        }
    }

    /// The error that stopped the walk, if any.
    pub fn err(&self) -> Option<&DecodeError> {
        self.err.as_ref()
    }

    /// Consumes the decoder, reporting any error met during the walk.
    pub fn finish(self) -> Result<(), DecodeError> {
        match self.err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn fixed<const N: usize>(&mut self) -> Option<[u8; N]> {
        match <[u8; N]>::try_from(self.value) {
            Ok(b) => Some(b),
            Err(_) => {
                self.fail(DecodeError::MalformedAttribute {
                    attr_type: self.attr_type,
                    want: N,
                    got: self.value.len(),
                });
                None
            }
        }
    }

    fn fail(&mut self, err: DecodeError) {
        if self.err.is_none() {
            self.err = Some(err);
        }
    }
}

/// Builds a buffer of netlink attributes in kernel format.
#[derive(Debug, Default)]
pub struct AttributeEncoder {
    buf: Vec<u8>,
}

impl AttributeEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&mut self, attr_type: u16, value: &[u8]) -> Result<(), EncodeError> {
        let length = u16::try_from(ATTR_HEADER_LEN + value.len())
            .map_err(|_| EncodeError::AttributeTooLarge { attr_type, len: value.len() })?;

        self.buf.extend_from_slice(&length.to_ne_bytes());
        self.buf.extend_from_slice(&attr_type.to_ne_bytes());
        self.buf.extend_from_slice(value);
        self.buf.resize(align(self.buf.len()), 0);

        Ok(())
    }

    pub fn string(&mut self, attr_type: u16, value: &str) -> Result<(), EncodeError> {
        let mut b = value.as_bytes().to_vec();
        b.push(0);
        self.bytes(attr_type, &b)
    }

    pub fn uint8(&mut self, attr_type: u16, value: u8) -> Result<(), EncodeError> {
        self.bytes(attr_type, &[value])
    }

    pub fn uint16(&mut self, attr_type: u16, value: u16) -> Result<(), EncodeError> {
        self.bytes(attr_type, &value.to_ne_bytes())
    }

    pub fn uint32(&mut self, attr_type: u16, value: u32) -> Result<(), EncodeError> {
        self.bytes(attr_type, &value.to_ne_bytes())
    }

    pub fn uint64(&mut self, attr_type: u16, value: u64) -> Result<(), EncodeError> {
        self.bytes(attr_type, &value.to_ne_bytes())
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}
