//! zlib helpers for the compressed frame envelope
//!
//! A payload is compressed only when it is strictly longer than the threshold.
//! Inflation is bounded twice: by a caller-supplied limit on the declared size
//! and by the declared size itself while the stream is read.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::config::MAX_DATA_LENGTH;
use crate::error::constants::{ERR_COMPRESSION_FAILED, ERR_DECOMPRESSION_FAILED};
use crate::error::{ProtocolError, Result};

/// Whether a payload of `len` bytes is compressed under `threshold`.
///
/// A negative threshold disables compression. Payloads exactly at the
/// threshold stay uncompressed.
pub fn should_compress(len: usize, threshold: i32) -> bool {
    threshold >= 0 && len > threshold as usize
}

/// Compresses data into a zlib stream at `level` (0-9).
///
/// # Errors
/// Returns `ProtocolError::Format` if the encoder fails
pub fn compress(data: &[u8], level: u32) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(
        Vec::with_capacity(data.len() / 2 + 16),
        Compression::new(level.min(9)),
    );
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .map_err(|e| ProtocolError::format(format!("{ERR_COMPRESSION_FAILED}: {e}")))
}

/// Decompresses a zlib stream that must inflate to exactly `expected_len` bytes.
///
/// Output is read in chunks and rejected as soon as it passes `expected_len`,
/// so a small stream cannot inflate past the declared size.
///
/// # Errors
/// Returns `ProtocolError::Format` if:
/// - `expected_len` exceeds `max_len`
/// - The stream is corrupt or truncated
/// - The inflated size differs from `expected_len`
pub fn decompress(data: &[u8], expected_len: usize, max_len: usize) -> Result<Vec<u8>> {
    if expected_len > max_len {
        return Err(ProtocolError::format(format!(
            "declared data length {expected_len} exceeds limit {max_len}"
        )));
    }

    let mut reader = ZlibDecoder::new(data);
    let mut out = Vec::with_capacity(expected_len);
    let mut buffer = [0u8; 8192];
    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                out.extend_from_slice(&buffer[..n]);
                if out.len() > expected_len {
                    return Err(ProtocolError::format(format!(
                        "{ERR_DECOMPRESSION_FAILED}: payload inflates past declared length {expected_len}"
                    )));
                }
            }
            Err(e) => {
                return Err(ProtocolError::format(format!("{ERR_DECOMPRESSION_FAILED}: {e}")))
            }
        }
    }

    if out.len() != expected_len {
        return Err(ProtocolError::format(format!(
            "{ERR_DECOMPRESSION_FAILED}: inflated to {} bytes, declared {expected_len}",
            out.len()
        )));
    }
    Ok(out)
}

/// Compress `data` if it is longer than `threshold`.
///
/// Returns `None` when the payload stays uncompressed and should be sent as is.
pub fn maybe_compress(data: &[u8], threshold: i32, level: u32) -> Result<Option<Vec<u8>>> {
    if should_compress(data.len(), threshold) {
        compress(data, level).map(Some)
    } else {
        Ok(None)
    }
}

/// Inverse of [`maybe_compress`].
///
/// `declared` is the uncompressed length from the envelope, `None` for a
/// payload sent as is, in which case nothing is inflated and `None` comes back.
pub fn maybe_decompress(
    data: &[u8],
    declared: Option<usize>,
    max_len: usize,
) -> Result<Option<Vec<u8>>> {
    declared
        .map(|len| decompress(data, len, max_len))
        .transpose()
}
