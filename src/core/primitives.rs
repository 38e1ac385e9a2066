//! Primitive and string codec over blocking byte channels.
//!
//! [`McRead`] and [`McWrite`] are extension traits implemented for every
//! [`std::io::Read`] / [`std::io::Write`], including [`crate::core::Buffer`].
//! The async twins in [`crate::core::async_io`] produce identical bytes.
//!
//! ## Wire Format
//! ```text
//! fixed width : big-endian, bool = 0x00 | 0x01
//! utf         : VarInt(byte_len) utf8_bytes
//! ascii       : latin1_bytes 0x00
//! optional    : bool [value]
//! uuid        : u128 big-endian
//! byte array  : VarInt(len) bytes
//! ```

use std::io::{Read, Write};

use crate::core::channel::{read_full, write_full};
use crate::core::varint::{encode_varint, encode_varlong, VarDecoder};
use crate::error::{constants, ProtocolError, Result};

/// Longest string, in code points, the protocol accepts.
pub const MAX_STRING_CHARS: usize = 32767;

/// Largest declared byte length of a string: four UTF-8 bytes per code point.
pub const MAX_STRING_BYTES: usize = MAX_STRING_CHARS * 4;

/// A value with a fixed big-endian wire width.
pub trait FixedWidth: Sized + Copy + Send + 'static {
    const SIZE: usize;
    const NAME: &'static str;

    fn put(self, out: &mut Vec<u8>);

    /// Decode from exactly `SIZE` bytes.
    fn take(bytes: &[u8]) -> Result<Self>;
}

/// Integer kinds that accept range-checked writes from a wider value.
pub trait Integral: FixedWidth + TryFrom<i128> {
    const LOWER: i128;
    const UPPER: i128;
}

macro_rules! fixed_width {
    ($($ty:ty => $name:literal),* $(,)?) => {$(
        impl FixedWidth for $ty {
            const SIZE: usize = std::mem::size_of::<$ty>();
            const NAME: &'static str = $name;

            #[inline]
            fn put(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_be_bytes());
            }

            #[inline]
            fn take(bytes: &[u8]) -> Result<Self> {
                let raw: [u8; std::mem::size_of::<$ty>()] = bytes.try_into().map_err(|_| {
                    ProtocolError::format(format!(
                        "{} needs {} bytes, got {}",
                        $name,
                        Self::SIZE,
                        bytes.len()
                    ))
                })?;
                Ok(<$ty>::from_be_bytes(raw))
            }
        }
    )*};
}

macro_rules! integral {
    ($($ty:ty),* $(,)?) => {$(
        impl Integral for $ty {
            const LOWER: i128 = <$ty>::MIN as i128;
            const UPPER: i128 = <$ty>::MAX as i128;
        }
    )*};
}

fixed_width! {
    i8 => "i8",
    u8 => "u8",
    i16 => "i16",
    u16 => "u16",
    i32 => "i32",
    u32 => "u32",
    i64 => "i64",
    u64 => "u64",
    u128 => "u128",
    f32 => "f32",
    f64 => "f64",
}

integral!(i8, u8, i16, u16, i32, u32, i64, u64);

impl FixedWidth for bool {
    const SIZE: usize = 1;
    const NAME: &'static str = "bool";

    fn put(self, out: &mut Vec<u8>) {
        out.push(self as u8);
    }

    fn take(bytes: &[u8]) -> Result<Self> {
        match bytes {
            [0x00] => Ok(false),
            [0x01] => Ok(true),
            other => Err(ProtocolError::format(format!(
                "invalid bool encoding {other:02x?}"
            ))),
        }
    }
}

/// Narrow `value` into `T`, failing with `ProtocolError::Range` if it does not fit.
pub fn narrow<T: Integral>(value: i128) -> Result<T> {
    T::try_from(value).map_err(|_| ProtocolError::Range {
        kind: T::NAME,
        value: value.to_string(),
        min: T::LOWER.to_string(),
        max: T::UPPER.to_string(),
    })
}

/// Byte-length and code-point checks shared by the sync and async string readers.
pub(crate) fn check_string_len(len: i32, max_chars: usize) -> Result<usize> {
    if len < 0 {
        return Err(ProtocolError::format(format!(
            "{}: string length {len}",
            constants::ERR_NEGATIVE_LENGTH
        )));
    }
    let len = len as usize;
    let max_bytes = max_chars * 4;
    if len > max_bytes {
        return Err(ProtocolError::format(format!(
            "string byte length {len} exceeds {max_bytes}"
        )));
    }
    Ok(len)
}

pub(crate) fn decode_string(bytes: Vec<u8>, max_chars: usize) -> Result<String> {
    let text = String::from_utf8(bytes)
        .map_err(|e| ProtocolError::format(format!("{}: {e}", constants::ERR_INVALID_UTF8)))?;
    let chars = text.chars().count();
    if chars > max_chars {
        return Err(ProtocolError::format(format!(
            "string length {chars} exceeds {max_chars} characters"
        )));
    }
    Ok(text)
}

pub(crate) fn check_array_len(len: i32, what: &str) -> Result<usize> {
    usize::try_from(len).map_err(|_| {
        ProtocolError::format(format!("{}: {what} length {len}", constants::ERR_NEGATIVE_LENGTH))
    })
}

/// Encode a length-prefixed UTF-8 string into `out`.
pub(crate) fn encode_utf(value: &str, max_chars: usize, out: &mut Vec<u8>) -> Result<()> {
    let chars = value.chars().count();
    if chars > max_chars {
        return Err(ProtocolError::Range {
            kind: "string",
            value: format!("{chars} characters"),
            min: "0".into(),
            max: max_chars.to_string(),
        });
    }
    encode_varint(value.len() as i32, out);
    out.extend_from_slice(value.as_bytes());
    Ok(())
}

/// Encode a NUL-terminated single-byte (Latin-1) string into `out`.
pub(crate) fn encode_ascii(value: &str, out: &mut Vec<u8>) -> Result<()> {
    for ch in value.chars() {
        let code = ch as u32;
        if code == 0 || code > 0xFF {
            return Err(ProtocolError::Range {
                kind: "single-byte character",
                value: format!("U+{code:04X}"),
                min: "U+0001".into(),
                max: "U+00FF".into(),
            });
        }
        out.push(code as u8);
    }
    out.push(0);
    Ok(())
}

pub(crate) fn encode_byte_array(value: &[u8], out: &mut Vec<u8>) -> Result<()> {
    let len = narrow::<i32>(value.len() as i128)?;
    encode_varint(len, out);
    out.extend_from_slice(value);
    Ok(())
}

/// Blocking decode operations, available on every [`Read`].
pub trait McRead: Read {
    /// Read one fixed-width big-endian value.
    fn read_value<T: FixedWidth>(&mut self) -> Result<T> {
        T::take(&read_full(self, T::SIZE)?)
    }

    fn read_varint(&mut self) -> Result<i32> {
        let mut decoder = VarDecoder::varint();
        loop {
            let byte = match read_full(self, 1) {
                Ok(b) => b[0],
                Err(e) => return Err(decoder.with_partial(e)),
            };
            if let Some(value) = decoder.push(byte)? {
                return Ok(value as u32 as i32);
            }
        }
    }

    fn read_varlong(&mut self) -> Result<i64> {
        let mut decoder = VarDecoder::varlong();
        loop {
            let byte = match read_full(self, 1) {
                Ok(b) => b[0],
                Err(e) => return Err(decoder.with_partial(e)),
            };
            if let Some(value) = decoder.push(byte)? {
                return Ok(value as i64);
            }
        }
    }

    /// Read a VarInt-prefixed UTF-8 string of at most 32767 code points.
    fn read_utf(&mut self) -> Result<String> {
        self.read_utf_max(MAX_STRING_CHARS)
    }

    /// Read a VarInt-prefixed UTF-8 string of at most `max_chars` code points.
    ///
    /// The declared byte length is checked against `max_chars * 4` before any
    /// bytes are buffered.
    fn read_utf_max(&mut self, max_chars: usize) -> Result<String> {
        let len = check_string_len(self.read_varint()?, max_chars)?;
        decode_string(read_full(self, len)?, max_chars)
    }

    /// Read a NUL-terminated single-byte (Latin-1) string.
    fn read_ascii(&mut self) -> Result<String> {
        let mut out = String::new();
        loop {
            match read_full(self, 1)?[0] {
                0 => return Ok(out),
                byte => out.push(byte as char),
            }
        }
    }

    /// Read a presence flag and, if set, the value decoded by `read`.
    fn read_optional<T, F>(&mut self, read: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        if self.read_value::<bool>()? {
            read(self).map(Some)
        } else {
            Ok(None)
        }
    }

    fn read_uuid(&mut self) -> Result<u128> {
        self.read_value::<u128>()
    }

    /// Read a VarInt-prefixed byte array.
    fn read_byte_array(&mut self) -> Result<Vec<u8>> {
        let len = check_array_len(self.read_varint()?, "byte array")?;
        read_full(self, len)
    }

    /// Read exactly `n` raw bytes.
    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        read_full(self, n)
    }

    /// Read until the channel is exhausted.
    fn read_remaining(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.read_to_end(&mut out)?;
        Ok(out)
    }
}

impl<R: Read + ?Sized> McRead for R {}

/// Blocking encode operations, available on every [`Write`].
pub trait McWrite: Write {
    fn write_value<T: FixedWidth>(&mut self, value: T) -> Result<()> {
        let mut out = Vec::with_capacity(T::SIZE);
        value.put(&mut out);
        write_full(self, &out)
    }

    /// Write `value` as `T`, failing with `ProtocolError::Range` if it does not fit.
    fn write_int<T: Integral>(&mut self, value: i128) -> Result<()> {
        self.write_value(narrow::<T>(value)?)
    }

    fn write_varint(&mut self, value: i32) -> Result<()> {
        let mut out = Vec::with_capacity(5);
        encode_varint(value, &mut out);
        write_full(self, &out)
    }

    fn write_varlong(&mut self, value: i64) -> Result<()> {
        let mut out = Vec::with_capacity(10);
        encode_varlong(value, &mut out);
        write_full(self, &out)
    }

    fn write_utf(&mut self, value: &str) -> Result<()> {
        self.write_utf_max(value, MAX_STRING_CHARS)
    }

    fn write_utf_max(&mut self, value: &str, max_chars: usize) -> Result<()> {
        let mut out = Vec::with_capacity(value.len() + 3);
        encode_utf(value, max_chars, &mut out)?;
        write_full(self, &out)
    }

    fn write_ascii(&mut self, value: &str) -> Result<()> {
        let mut out = Vec::with_capacity(value.len() + 1);
        encode_ascii(value, &mut out)?;
        write_full(self, &out)
    }

    /// Write a presence flag and, if present, delegate to `write`.
    fn write_optional<T, F>(&mut self, value: Option<&T>, write: F) -> Result<()>
    where
        T: ?Sized,
        F: FnOnce(&mut Self, &T) -> Result<()>,
    {
        self.write_value(value.is_some())?;
        match value {
            Some(v) => write(self, v),
            None => Ok(()),
        }
    }

    fn write_uuid(&mut self, value: u128) -> Result<()> {
        self.write_value(value)
    }

    fn write_byte_array(&mut self, value: &[u8]) -> Result<()> {
        let mut out = Vec::with_capacity(value.len() + 5);
        encode_byte_array(value, &mut out)?;
        write_full(self, &out)
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        write_full(self, bytes)
    }
}

impl<W: Write + ?Sized> McWrite for W {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Buffer;

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_fixed_width_big_endian() {
        let mut buf = Buffer::new();
        buf.write_value(0x1234u16).unwrap();
        buf.write_value(-2i32).unwrap();
        buf.write_value(1.5f32).unwrap();
        buf.write_value(true).unwrap();
        assert_eq!(
            &buf.as_slice()[..7],
            &[0x12, 0x34, 0xFF, 0xFF, 0xFF, 0xFE, 0x3F]
        );
        assert_eq!(buf.read_value::<u16>().unwrap(), 0x1234);
        assert_eq!(buf.read_value::<i32>().unwrap(), -2);
        assert_eq!(buf.read_value::<f32>().unwrap(), 1.5);
        assert!(buf.read_value::<bool>().unwrap());
    }

    #[test]
    fn test_write_int_range_checked() {
        let mut buf = Buffer::new();
        assert!(buf.write_int::<u16>(65535).is_ok());
        match buf.write_int::<u16>(65536) {
            Err(ProtocolError::Range { kind, min, max, .. }) => {
                assert_eq!(kind, "u16");
                assert_eq!(min, "0");
                assert_eq!(max, "65535");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(buf.write_int::<i8>(-129).is_err());
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn test_bool_rejects_other_bytes() {
        let mut buf = Buffer::from_bytes(vec![0x02]);
        assert!(matches!(
            buf.read_value::<bool>(),
            Err(ProtocolError::Format(_))
        ));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_varint_boundaries() {
        let mut buf = Buffer::new();
        buf.write_varint(2147483647).unwrap();
        assert_eq!(buf.as_slice(), &[255, 255, 255, 255, 7]);
        buf.clear();
        buf.write_varint(-1).unwrap();
        assert_eq!(buf.as_slice(), &[255, 255, 255, 255, 15]);
        assert_eq!(buf.read_varint().unwrap(), -1);
    }

    #[test]
    fn test_varint_too_long_is_format_error() {
        let mut buf = Buffer::from_bytes(vec![0x80, 0x80, 0x80, 0x80, 0x80, 0x01]);
        assert!(matches!(buf.read_varint(), Err(ProtocolError::Format(_))));
        // stops after exactly five bytes
        assert_eq!(buf.position(), 5);

        let mut buf = Buffer::from_bytes(vec![0xFF; 11]);
        assert!(matches!(buf.read_varlong(), Err(ProtocolError::Format(_))));
        assert_eq!(buf.position(), 10);
    }

    #[test]
    fn test_truncated_varint_keeps_partial_bytes() {
        let mut buf = Buffer::from_bytes(vec![0xFF, 0xFF]);
        match buf.read_varint() {
            Err(ProtocolError::UnexpectedEnd { expected, partial }) => {
                assert_eq!(expected, 3);
                assert_eq!(partial, vec![0xFF, 0xFF]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_varlong_roundtrip() {
        let mut buf = Buffer::new();
        for value in [0i64, 1, -1, i64::MAX, i64::MIN, 1 << 35] {
            buf.write_varlong(value).unwrap();
        }
        for value in [0i64, 1, -1, i64::MAX, i64::MIN, 1 << 35] {
            assert_eq!(buf.read_varlong().unwrap(), value);
        }
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_utf_roundtrip() {
        let mut buf = Buffer::new();
        buf.write_utf("mc.example.com").unwrap();
        buf.write_utf("héllo ✓").unwrap();
        assert_eq!(buf.as_slice()[0], 14);
        assert_eq!(buf.read_utf().unwrap(), "mc.example.com");
        assert_eq!(buf.read_utf().unwrap(), "héllo ✓");
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_utf_declared_length_limit() {
        let mut buf = Buffer::new();
        buf.write_varint(131069).unwrap();
        match buf.read_utf() {
            Err(ProtocolError::Format(msg)) => assert!(msg.contains("131069")),
            other => panic!("unexpected: {other:?}"),
        }
        // nothing past the prefix was consumed
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_utf_char_limit() {
        let long = "a".repeat(MAX_STRING_CHARS + 1);
        let mut buf = Buffer::new();
        assert!(matches!(
            buf.write_utf(&long),
            Err(ProtocolError::Range { .. })
        ));

        let mut raw = Vec::new();
        encode_varint(long.len() as i32, &mut raw);
        raw.extend_from_slice(long.as_bytes());
        let mut buf = Buffer::from_bytes(raw);
        assert!(matches!(buf.read_utf(), Err(ProtocolError::Format(_))));

        let mut buf = Buffer::new();
        buf.write_utf("Notch").unwrap();
        assert!(buf.read_utf_max(4).is_err());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_ascii_roundtrip() {
        let mut buf = Buffer::new();
        buf.write_ascii("MC|Brand é").unwrap();
        assert_eq!(*buf.as_slice().last().unwrap(), 0);
        assert_eq!(buf.read_ascii().unwrap(), "MC|Brand é");
        assert!(buf.write_ascii("✓").is_err());
        assert!(buf.write_ascii("a\0b").is_err());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_optional_roundtrip() {
        let mut buf = Buffer::new();
        buf.write_optional(Some(&42i32), |w, v| w.write_varint(*v))
            .unwrap();
        buf.write_optional(None::<&i32>, |w, v| w.write_varint(*v))
            .unwrap();
        assert_eq!(buf.as_slice(), &[1, 42, 0]);
        assert_eq!(buf.read_optional(|r| r.read_varint()).unwrap(), Some(42));
        assert_eq!(buf.read_optional(|r| r.read_varint()).unwrap(), None);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_uuid_and_byte_array() {
        let mut buf = Buffer::new();
        buf.write_uuid(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef).unwrap();
        buf.write_byte_array(&[9, 8, 7]).unwrap();
        assert_eq!(buf.len(), 16 + 4);
        assert_eq!(
            buf.read_uuid().unwrap(),
            0x0123_4567_89ab_cdef_0123_4567_89ab_cdef
        );
        assert_eq!(buf.read_byte_array().unwrap(), vec![9, 8, 7]);
    }
}
