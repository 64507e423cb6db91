use std::borrow::Cow;

// Constants for crypto_user structure field sizes
pub mod sizes {
    /// CRYPTO_MAX_NAME, in characters.
    pub const MAX_NAME: usize = 64;

    /// Width of one kernel `char`. Signed on x86, unsigned on arm, powerpc
    /// and riscv; only the width matters once the field is treated as bytes.
    pub const CHAR_WIDTH: usize = std::mem::size_of::<std::ffi::c_char>();

    /// Byte length of every `char[CRYPTO_MAX_NAME]` field.
    pub const NAME: usize = MAX_NAME * CHAR_WIDTH;
}

/// Size of `struct crypto_user_alg`.
pub const SIZEOF_CRYPTO_USER_ALG: usize = crypto_user_alg_layout_size();

/// Size of `struct crypto_report_cipher`.
pub const SIZEOF_CRYPTO_REPORT_CIPHER: usize = report_cipher_layout_size();

/// Size of `struct crypto_report_hash`.
pub const SIZEOF_CRYPTO_REPORT_HASH: usize = report_hash_layout_size();

// Helper for reading data at specific offsets. Every read is bounds checked
// and yields None instead of running past the end of the slice.
pub struct DataReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> DataReader<'a> {
    pub fn new(data: &'a [u8], offset: usize) -> Self {
        Self { data, pos: offset }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn read_bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let bytes = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        self.read_bytes(N)?.try_into().ok()
    }

    /// Reads a fixed-size kernel `char` array and decodes it as text.
    pub fn read_str(&mut self, len: usize) -> Option<String> {
        self.read_bytes(len).map(|b| str_from_bytes(b).into_owned())
    }

    pub fn read_u16(&mut self) -> Option<u16> {
        self.read_array().map(u16::from_ne_bytes)
    }

    pub fn read_u32(&mut self) -> Option<u32> {
        self.read_array().map(u32::from_ne_bytes)
    }

    pub fn read_i32(&mut self) -> Option<i32> {
        self.read_array().map(i32::from_ne_bytes)
    }

    pub fn skip(&mut self, len: usize) {
        self.pos = self.pos.saturating_add(len).min(self.data.len());
    }
}

/// Decodes a kernel `char` array: everything up to the first NUL, or the
/// whole array when no NUL is present. Invalid UTF-8 is replaced rather than
/// rejected.
pub fn str_from_bytes(b: &[u8]) -> Cow<'_, str> {
    let end = b.iter().position(|&c| c == 0).unwrap_or(b.len());
    String::from_utf8_lossy(&b[..end])
}

/// Packs `s` into a zero-filled `char` array, truncating at `N` bytes the
/// same way the kernel's strscpy into a fixed field does.
pub fn pack<const N: usize>(s: &str) -> [u8; N] {
    let mut out = [0u8; N];
    let len = s.len().min(N);
    out[..len].copy_from_slice(&s.as_bytes()[..len]);
    out
}

// Structure layout definitions for calculating sizes

const fn crypto_user_alg_layout_size() -> usize {
    sizes::NAME + // cru_name
    sizes::NAME + // cru_driver_name
    sizes::NAME + // cru_module_name
    4 + // cru_type
    4 + // cru_mask
    4 + // cru_refcnt
    4 // cru_flags
}

const fn report_cipher_layout_size() -> usize {
    sizes::NAME + // type
    4 + // blocksize
    4 + // min_keysize
    4 // max_keysize
}

const fn report_hash_layout_size() -> usize {
    sizes::NAME + // type
    4 + // blocksize
    4 // digestsize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_sizes_match_kernel_abi() {
        assert_eq!(sizes::CHAR_WIDTH, 1);
        assert_eq!(SIZEOF_CRYPTO_USER_ALG, 208);
        assert_eq!(SIZEOF_CRYPTO_REPORT_CIPHER, 76);
        assert_eq!(SIZEOF_CRYPTO_REPORT_HASH, 72);
    }

    #[test]
    fn test_str_from_bytes_stops_at_nul() {
        assert_eq!(str_from_bytes(b"sha1\0\0\0\0"), "sha1");
        assert_eq!(str_from_bytes(b"ab\0cd"), "ab");
        assert_eq!(str_from_bytes(b"\0sha1"), "");
        assert_eq!(str_from_bytes(b""), "");
    }

    #[test]
    fn test_str_from_bytes_without_nul_uses_whole_array() {
        let full = [b'a'; sizes::NAME];
        assert_eq!(str_from_bytes(&full), "a".repeat(sizes::NAME));
    }

    #[test]
    fn test_pack_zero_fills_and_truncates() {
        let packed: [u8; 8] = pack("aes");
        assert_eq!(&packed, b"aes\0\0\0\0\0");

        let packed: [u8; 4] = pack("skcipher");
        assert_eq!(&packed, b"skci");
        assert_eq!(str_from_bytes(&packed), "skci");
    }

    #[test]
    fn test_data_reader_bounds() {
        let mut data = Vec::new();
        data.extend_from_slice(&7u32.to_ne_bytes());
        data.extend_from_slice(&9u16.to_ne_bytes());

        let mut reader = DataReader::new(&data, 0);
        assert_eq!(reader.read_u32(), Some(7));
        assert_eq!(reader.remaining(), 2);
        assert_eq!(reader.read_u32(), None);
        // A failed read does not move the cursor.
        assert_eq!(reader.position(), 4);
        assert_eq!(reader.read_u16(), Some(9));
        assert_eq!(reader.read_bytes(1), None);

        reader.skip(usize::MAX);
        assert_eq!(reader.remaining(), 0);
    }
}
