//! VarInt / VarLong encoding.
//!
//! Two's-complement integers split into little-endian 7-bit groups; the high
//! bit of each byte flags a continuation. Negative numbers always take the
//! maximum length because the sign bit is set.
//!
//! ## Wire Format
//! ```text
//! 2147483647 -> FF FF FF FF 07
//! -1         -> FF FF FF FF 0F
//! ```

use crate::error::{constants, ProtocolError, Result};

/// Bytes needed to carry `bits` worth of payload in 7-bit groups, rounded up
/// to cover one extra sign bit.
pub const fn max_encoded_len(bits: u32) -> usize {
    ((bits + 1) as usize).div_ceil(7)
}

/// Maximum encoded length of a VarInt.
pub const VARINT_MAX_BYTES: usize = max_encoded_len(i32::BITS);

/// Maximum encoded length of a VarLong.
pub const VARLONG_MAX_BYTES: usize = max_encoded_len(i64::BITS);

const SEGMENT_BITS: u8 = 0x7F;
const CONTINUE_BIT: u8 = 0x80;

/// Append the VarInt encoding of `value` to `out`.
pub fn encode_varint(value: i32, out: &mut Vec<u8>) {
    encode_var(value as u32 as u64, out);
}

/// Append the VarLong encoding of `value` to `out`.
pub fn encode_varlong(value: i64, out: &mut Vec<u8>) {
    encode_var(value as u64, out);
}

fn encode_var(mut value: u64, out: &mut Vec<u8>) {
    while value & !(SEGMENT_BITS as u64) != 0 {
        out.push((value as u8 & SEGMENT_BITS) | CONTINUE_BIT);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Number of bytes `value` occupies as a VarInt.
pub fn varint_len(value: i32) -> usize {
    var_len(value as u32 as u64)
}

/// Number of bytes `value` occupies as a VarLong.
pub fn varlong_len(value: i64) -> usize {
    var_len(value as u64)
}

fn var_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

/// Incremental decoder shared by the blocking and async readers.
///
/// Feed bytes one at a time until [`VarDecoder::push`] yields a value. The
/// decoder refuses to accept more than `max_bytes` bytes.
#[derive(Debug)]
pub(crate) struct VarDecoder {
    value: u64,
    seen: Vec<u8>,
    bits: u32,
    max_bytes: usize,
    overflow_msg: &'static str,
}

impl VarDecoder {
    pub(crate) fn varint() -> Self {
        Self::new(i32::BITS, constants::ERR_VARINT_TOO_LONG)
    }

    pub(crate) fn varlong() -> Self {
        Self::new(i64::BITS, constants::ERR_VARLONG_TOO_LONG)
    }

    fn new(bits: u32, overflow_msg: &'static str) -> Self {
        let max_bytes = max_encoded_len(bits);
        Self {
            value: 0,
            seen: Vec::with_capacity(max_bytes),
            bits,
            max_bytes,
            overflow_msg,
        }
    }

    /// Accept one byte. Returns the raw value once the final group arrives.
    pub(crate) fn push(&mut self, byte: u8) -> Result<Option<u64>> {
        let shift = 7 * self.seen.len() as u32;
        let group = byte & SEGMENT_BITS;
        // the last group may only fill the bits left below the value width
        if shift + 7 > self.bits && group >> (self.bits - shift) != 0 {
            self.seen.push(byte);
            return Err(ProtocolError::format(format!(
                "value exceeds {} bits, final group {group:#04x}",
                self.bits
            )));
        }
        self.value |= (group as u64) << shift;
        self.seen.push(byte);
        if byte & CONTINUE_BIT == 0 {
            return Ok(Some(self.value));
        }
        if self.seen.len() >= self.max_bytes {
            return Err(ProtocolError::format(self.overflow_msg));
        }
        Ok(None)
    }

    /// Re-attach the bytes consumed so far to an end-of-stream error.
    pub(crate) fn with_partial(self, err: ProtocolError) -> ProtocolError {
        match err {
            ProtocolError::UnexpectedEnd { .. } => ProtocolError::UnexpectedEnd {
                expected: self.seen.len() + 1,
                partial: self.seen,
            },
            other => other,
        }
    }
}

/// Decode a VarInt from the start of `data` without consuming anything.
///
/// Returns `Ok(None)` when `data` ends before the final group, which lets
/// stream decoders wait for more bytes.
pub fn peek_varint(data: &[u8]) -> Result<Option<(i32, usize)>> {
    let mut decoder = VarDecoder::varint();
    for (i, &byte) in data.iter().enumerate() {
        if let Some(value) = decoder.push(byte)? {
            return Ok(Some((value as u32 as i32, i + 1)));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn varint(value: i32) -> Vec<u8> {
        let mut out = Vec::new();
        encode_varint(value, &mut out);
        out
    }

    fn varlong(value: i64) -> Vec<u8> {
        let mut out = Vec::new();
        encode_varlong(value, &mut out);
        out
    }

    #[test]
    fn test_max_lengths_derived() {
        assert_eq!(VARINT_MAX_BYTES, 5);
        assert_eq!(VARLONG_MAX_BYTES, 10);
    }

    #[test]
    fn test_varint_known_encodings() {
        assert_eq!(varint(0), vec![0x00]);
        assert_eq!(varint(1), vec![0x01]);
        assert_eq!(varint(127), vec![0x7F]);
        assert_eq!(varint(128), vec![0x80, 0x01]);
        assert_eq!(varint(255), vec![0xFF, 0x01]);
        assert_eq!(varint(25565), vec![0xDD, 0xC7, 0x01]);
        assert_eq!(varint(2097151), vec![0xFF, 0xFF, 0x7F]);
        assert_eq!(varint(i32::MAX), vec![0xFF, 0xFF, 0xFF, 0xFF, 0x07]);
        assert_eq!(varint(-1), vec![0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
        assert_eq!(varint(i32::MIN), vec![0x80, 0x80, 0x80, 0x80, 0x08]);
    }

    #[test]
    fn test_varlong_known_encodings() {
        assert_eq!(varlong(i64::MAX), vec![0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F]);
        assert_eq!(
            varlong(-1),
            vec![0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]
        );
        assert_eq!(
            varlong(i64::MIN),
            vec![0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x01]
        );
    }

    #[test]
    fn test_lengths_match_encoding() {
        for value in [0, 1, 127, 128, 16383, 16384, i32::MAX, -1, i32::MIN] {
            assert_eq!(varint_len(value), varint(value).len());
        }
        for value in [0, 300, i64::MAX, -1, i64::MIN] {
            assert_eq!(varlong_len(value), varlong(value).len());
        }
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_peek_varint() {
        assert_eq!(peek_varint(&[0xDD, 0xC7, 0x01, 0x42]).unwrap(), Some((25565, 3)));
        assert_eq!(peek_varint(&[0xDD, 0xC7]).unwrap(), None);
        assert!(peek_varint(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]).is_err());
    }

    #[test]
    fn test_final_group_range() {
        let mut varint = VarDecoder::varint();
        for byte in [0xFF, 0xFF, 0xFF, 0xFF] {
            assert!(matches!(varint.push(byte), Ok(None)));
        }
        assert!(matches!(varint.push(0x10), Err(ProtocolError::Format(_))));

        let mut varint = VarDecoder::varint();
        let mut last = None;
        for byte in [0xFF, 0xFF, 0xFF, 0xFF, 0x0F] {
            last = varint.push(byte).ok().flatten();
        }
        assert_eq!(last, Some(u32::MAX as u64));

        let mut varlong = VarDecoder::varlong();
        for _ in 0..9 {
            assert!(matches!(varlong.push(0xFF), Ok(None)));
        }
        assert!(matches!(varlong.push(0x02), Err(ProtocolError::Format(_))));
    }
}
