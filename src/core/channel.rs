//! Byte channel primitives.
//!
//! The only two operations any codec needs from a transport: "write these
//! bytes" and "read exactly N bytes". Blocking channels are any
//! [`std::io::Read`]/[`std::io::Write`]; suspension-capable channels are any
//! tokio [`AsyncRead`]/[`AsyncWrite`]. Suspension happens only inside these
//! helpers.
//!
//! Unlike `read_exact` from std/tokio, a short read here reports the bytes
//! that did arrive via `ProtocolError::UnexpectedEnd`.

use std::io::{Read, Write};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ProtocolError, Result};

/// Upper bound on speculative pre-allocation for a single read.
const INITIAL_CAPACITY: usize = 8 * 1024;

/// Read exactly `n` bytes from a blocking channel.
///
/// The output grows with the bytes actually received, so a hostile length
/// prefix cannot force a large allocation up front.
pub fn read_full<R: Read + ?Sized>(reader: &mut R, n: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(n.min(INITIAL_CAPACITY));
    let mut limited = Read::take(&mut *reader, n as u64);
    Read::read_to_end(&mut limited, &mut out)?;
    if out.len() < n {
        return Err(ProtocolError::UnexpectedEnd {
            expected: n,
            partial: out,
        });
    }
    Ok(out)
}

/// Write every byte to a blocking channel.
pub fn write_full<W: Write + ?Sized>(writer: &mut W, bytes: &[u8]) -> Result<()> {
    Write::write_all(writer, bytes)?;
    Ok(())
}

/// Read exactly `n` bytes from an async channel.
pub async fn read_full_async<R: AsyncRead + Unpin + ?Sized>(
    reader: &mut R,
    n: usize,
) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(n.min(INITIAL_CAPACITY));
    let mut limited = AsyncReadExt::take(&mut *reader, n as u64);
    AsyncReadExt::read_to_end(&mut limited, &mut out).await?;
    if out.len() < n {
        return Err(ProtocolError::UnexpectedEnd {
            expected: n,
            partial: out,
        });
    }
    Ok(out)
}

/// Write every byte to an async channel.
pub async fn write_full_async<W: AsyncWrite + Unpin + ?Sized>(
    writer: &mut W,
    bytes: &[u8],
) -> Result<()> {
    AsyncWriteExt::write_all(writer, bytes).await?;
    Ok(())
}
