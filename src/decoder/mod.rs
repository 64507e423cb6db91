//! Decoding of `CRYPTO_MSG_GETALG` replies.
//!
//! A reply is a `struct crypto_user_alg` followed by netlink attributes. The
//! priority attribute and at most one report attribute describe the
//! algorithm; any other attribute is skipped.

use tracing::trace;

use crate::algorithm::{Algorithm, AlgorithmType, Cipher, Hash};
use crate::error::{DecodeError, EncodeError};

pub mod attribute;
pub mod binary_utils;

use attribute::{AttributeDecoder, AttributeEncoder};
use binary_utils::{
    DataReader, SIZEOF_CRYPTO_REPORT_CIPHER, SIZEOF_CRYPTO_REPORT_HASH, SIZEOF_CRYPTO_USER_ALG,
    pack, sizes,
};

// enum crypto_attr_type
pub const CRYPTOCFGA_UNSPEC: u16 = 0;
pub const CRYPTOCFGA_PRIORITY_VAL: u16 = 1;
pub const CRYPTOCFGA_REPORT_LARVAL: u16 = 2;
pub const CRYPTOCFGA_REPORT_HASH: u16 = 3;
pub const CRYPTOCFGA_REPORT_BLKCIPHER: u16 = 4;
pub const CRYPTOCFGA_REPORT_AEAD: u16 = 5;
pub const CRYPTOCFGA_REPORT_COMPRESS: u16 = 6;
pub const CRYPTOCFGA_REPORT_RNG: u16 = 7;
pub const CRYPTOCFGA_REPORT_CIPHER: u16 = 8;
pub const CRYPTOCFGA_REPORT_AKCIPHER: u16 = 9;
pub const CRYPTOCFGA_REPORT_KPP: u16 = 10;
pub const CRYPTOCFGA_REPORT_ACOMP: u16 = 11;
pub const CRYPTOCFGA_STAT: u16 = 12;

/// Decodes one reply message into an [`Algorithm`].
///
/// When a message carries both a cipher and a hash report, the one that
/// appears last wins.
pub fn parse_algorithm(b: &[u8]) -> Result<Algorithm, DecodeError> {
    let mut alg = parse_user_alg(b)?;

    // Attributes occur immediately after the crypto_user_alg structure.
    let mut ad = AttributeDecoder::with_offset(&b[SIZEOF_CRYPTO_USER_ALG..], SIZEOF_CRYPTO_USER_ALG);
    while ad.advance() {
        match ad.attr_type() {
            CRYPTOCFGA_PRIORITY_VAL => alg.priority = ad.uint32(),
            CRYPTOCFGA_REPORT_CIPHER => ad.decode_with(|b| {
                alg.alg_type = AlgorithmType::Cipher(parse_cipher(b)?);
                Ok(())
            }),
            CRYPTOCFGA_REPORT_HASH => ad.decode_with(|b| {
                alg.alg_type = AlgorithmType::Hash(parse_hash(b)?);
                Ok(())
            }),
            other => trace!(attr_type = other, name = %alg.name, "skipping crypto attribute"),
        }
    }

    ad.finish()?;

    Ok(alg)
}

// Parse the crypto_user_alg header at the start of a message
fn parse_user_alg(b: &[u8]) -> Result<Algorithm, DecodeError> {
    let malformed = || DecodeError::MalformedHeader {
        want: SIZEOF_CRYPTO_USER_ALG,
        got: b.len(),
    };

    if b.len() < SIZEOF_CRYPTO_USER_ALG {
        return Err(malformed());
    }

    let mut reader = DataReader::new(&b[..SIZEOF_CRYPTO_USER_ALG], 0);
    let name = reader.read_str(sizes::NAME).ok_or_else(malformed)?;
    let driver = reader.read_str(sizes::NAME).ok_or_else(malformed)?;
    let module = reader.read_str(sizes::NAME).ok_or_else(malformed)?;
    reader.skip(4); // cru_type
    reader.skip(4); // cru_mask
    let ref_count = reader.read_u32().ok_or_else(malformed)?;
    let flags = reader.read_u32().ok_or_else(malformed)?;

    Ok(Algorithm {
        name,
        driver,
        module,
        priority: 0,
        flags,
        ref_count,
        alg_type: AlgorithmType::Unknown,
    })
}

fn parse_cipher(b: &[u8]) -> Result<Cipher, DecodeError> {
    let malformed = || DecodeError::MalformedReport {
        report: "crypto_report_cipher",
        want: SIZEOF_CRYPTO_REPORT_CIPHER,
        got: b.len(),
    };

    if b.len() != SIZEOF_CRYPTO_REPORT_CIPHER {
        return Err(malformed());
    }

    let mut reader = DataReader::new(b, 0);
    let type_name = reader.read_str(sizes::NAME).ok_or_else(malformed)?;

    Ok(Cipher {
        block_size: reader.read_u32().ok_or_else(malformed)?,
        min_key_size: reader.read_u32().ok_or_else(malformed)?,
        max_key_size: reader.read_u32().ok_or_else(malformed)?,
        type_name,
    })
}

fn parse_hash(b: &[u8]) -> Result<Hash, DecodeError> {
    let malformed = || DecodeError::MalformedReport {
        report: "crypto_report_hash",
        want: SIZEOF_CRYPTO_REPORT_HASH,
        got: b.len(),
    };

    if b.len() != SIZEOF_CRYPTO_REPORT_HASH {
        return Err(malformed());
    }

    let mut reader = DataReader::new(b, 0);
    let type_name = reader.read_str(sizes::NAME).ok_or_else(malformed)?;

    Ok(Hash {
        block_size: reader.read_u32().ok_or_else(malformed)?,
        digest_size: reader.read_u32().ok_or_else(malformed)?,
        type_name,
    })
}

/// Encodes `alg` in the format the kernel uses for a `CRYPTO_MSG_GETALG`
/// reply: the header, a priority attribute and, unless the type is unknown,
/// one report attribute.
pub fn encode_algorithm(alg: &Algorithm) -> Result<Vec<u8>, EncodeError> {
    let mut b = Vec::with_capacity(SIZEOF_CRYPTO_USER_ALG + SIZEOF_CRYPTO_REPORT_CIPHER + 16);
    b.extend_from_slice(&pack::<{ sizes::NAME }>(&alg.name));
    b.extend_from_slice(&pack::<{ sizes::NAME }>(&alg.driver));
    b.extend_from_slice(&pack::<{ sizes::NAME }>(&alg.module));
    b.extend_from_slice(&0u32.to_ne_bytes()); // cru_type
    b.extend_from_slice(&0u32.to_ne_bytes()); // cru_mask
    b.extend_from_slice(&alg.ref_count.to_ne_bytes());
    b.extend_from_slice(&alg.flags.to_ne_bytes());

    let mut ae = AttributeEncoder::new();
    ae.uint32(CRYPTOCFGA_PRIORITY_VAL, alg.priority)?;
    match &alg.alg_type {
        AlgorithmType::Unknown => {}
        AlgorithmType::Cipher(c) => ae.bytes(CRYPTOCFGA_REPORT_CIPHER, &encode_cipher(c))?,
        AlgorithmType::Hash(h) => ae.bytes(CRYPTOCFGA_REPORT_HASH, &encode_hash(h))?,
    }

    b.extend_from_slice(&ae.finish());
    Ok(b)
}

fn encode_cipher(c: &Cipher) -> Vec<u8> {
    let mut b = Vec::with_capacity(SIZEOF_CRYPTO_REPORT_CIPHER);
    b.extend_from_slice(&pack::<{ sizes::NAME }>(&c.type_name));
    b.extend_from_slice(&c.block_size.to_ne_bytes());
    b.extend_from_slice(&c.min_key_size.to_ne_bytes());
    b.extend_from_slice(&c.max_key_size.to_ne_bytes());
    b
}

fn encode_hash(h: &Hash) -> Vec<u8> {
    let mut b = Vec::with_capacity(SIZEOF_CRYPTO_REPORT_HASH);
    b.extend_from_slice(&pack::<{ sizes::NAME }>(&h.type_name));
    b.extend_from_slice(&h.block_size.to_ne_bytes());
    b.extend_from_slice(&h.digest_size.to_ne_bytes());
    b
}
