//! Little-endian primitives for reading Solana account data.
//!
//! Every multi-byte integer written by the Solana program is little-endian.
//! All reads go through [`read_u32_le`], [`read_u64_le`] and [`read_u128_le`]
//! so the conversion to host order lives in one place.

use super::CodecError;

/// Converts 4 little-endian bytes to a host-order `u32`.
#[inline]
#[must_use]
pub const fn read_u32_le(bytes: [u8; 4]) -> u32 {
    u32::from_le_bytes(bytes)
}

/// Converts 8 little-endian bytes to a host-order `u64`.
#[inline]
#[must_use]
pub const fn read_u64_le(bytes: [u8; 8]) -> u64 {
    u64::from_le_bytes(bytes)
}

/// Converts 16 little-endian bytes to a host-order `u128`.
#[inline]
#[must_use]
pub const fn read_u128_le(bytes: [u8; 16]) -> u128 {
    u128::from_le_bytes(bytes)
}

/// Forward-only cursor over an account buffer.
///
/// Short reads fail with [`CodecError::MalformedAccount`] naming the field.
#[derive(Debug)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    /// Creates a cursor positioned at the start of `data`.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Current read position.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left after the current position.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Advances the cursor by `len` bytes without reading them.
    ///
    /// # Errors
    /// Fails if fewer than `len` bytes remain.
    pub fn skip(&mut self, len: usize, field: &'static str) -> Result<(), CodecError> {
        self.take(len, field).map(|_| ())
    }

    /// Reads `len` raw bytes.
    ///
    /// # Errors
    /// Fails if fewer than `len` bytes remain.
    pub fn take(&mut self, len: usize, field: &'static str) -> Result<&'a [u8], CodecError> {
        if self.remaining() < len {
            return Err(CodecError::MalformedAccount {
                field,
                offset: self.offset,
                needed: len,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    /// Reads a fixed-size byte array.
    ///
    /// # Errors
    /// Fails if fewer than `N` bytes remain.
    pub fn array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, field)?);
        Ok(out)
    }

    /// Reads a single byte.
    ///
    /// # Errors
    /// Fails if the buffer is exhausted.
    pub fn u8(&mut self, field: &'static str) -> Result<u8, CodecError> {
        self.array::<1>(field).map(|[b]| b)
    }

    /// Reads a little-endian `u32`.
    ///
    /// # Errors
    /// Fails if fewer than 4 bytes remain.
    pub fn u32_le(&mut self, field: &'static str) -> Result<u32, CodecError> {
        self.array(field).map(read_u32_le)
    }

    /// Reads a little-endian `u64`.
    ///
    /// # Errors
    /// Fails if fewer than 8 bytes remain.
    pub fn u64_le(&mut self, field: &'static str) -> Result<u64, CodecError> {
        self.array(field).map(read_u64_le)
    }

    /// Reads a little-endian `u128`.
    ///
    /// # Errors
    /// Fails if fewer than 16 bytes remain.
    pub fn u128_le(&mut self, field: &'static str) -> Result<u128, CodecError> {
        self.array(field).map(read_u128_le)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_u64_le_reverses_byte_order() {
        let bytes = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        assert_eq!(read_u64_le(bytes), 0x0807_0605_0403_0201);
    }

    #[test]
    fn read_u64_le_small_value() {
        // 1_000_000 = 0x0F4240
        let bytes = [0x40, 0x42, 0x0F, 0, 0, 0, 0, 0];
        assert_eq!(read_u64_le(bytes), 1_000_000);
    }

    #[test]
    fn read_u128_le_reverses_byte_order() {
        let mut bytes = [0u8; 16];
        bytes[0] = 0xff;
        bytes[15] = 0x01;
        assert_eq!(read_u128_le(bytes), (1u128 << 120) | 0xff);
    }

    #[test]
    fn read_u128_le_one_ether() {
        // 10^18 = 0x0DE0B6B3A7640000
        let bytes = [
            0x00, 0x00, 0x64, 0xA7, 0xB3, 0xB6, 0xE0, 0x0D, 0, 0, 0, 0, 0, 0, 0, 0,
        ];
        assert_eq!(read_u128_le(bytes), 1_000_000_000_000_000_000);
    }

    #[test]
    fn read_u32_le_length_prefix() {
        assert_eq!(read_u32_le([0x04, 0x01, 0x00, 0x00]), 260);
    }

    #[test]
    fn cursor_reads_in_sequence() {
        let data = [0xaa, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xbb];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.u8("a").unwrap(), 0xaa);
        assert_eq!(cursor.u64_le("b").unwrap(), 2);
        assert_eq!(cursor.remaining(), 1);
        assert_eq!(cursor.take(1, "c").unwrap(), &[0xbb]);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn cursor_short_read_reports_field() {
        let data = [0u8; 3];
        let mut cursor = ByteCursor::new(&data);
        cursor.skip(1, "pad").unwrap();
        let err = cursor.u32_le("len").unwrap_err();
        assert_eq!(
            err,
            CodecError::MalformedAccount {
                field: "len",
                offset: 1,
                needed: 4,
                available: 2,
            }
        );
        // A failed read does not advance the cursor.
        assert_eq!(cursor.offset(), 1);
    }
}
