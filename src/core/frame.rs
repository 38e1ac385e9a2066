//! Packet frame codec.
//!
//! ## Wire Format
//! ```text
//! uncompressed:  [VarInt len] [VarInt id] [body]
//! compressed:    [VarInt len] [VarInt data_len] [payload]
//!                payload = zlib([VarInt id] [body]) when data_len != 0
//!                payload = [VarInt id] [body]       when data_len == 0
//! ```
//!
//! Whether the compressed envelope is in use depends only on the sign of the
//! threshold. Its value only decides, on write, which payloads get deflated.
//!
//! A frame is always read in full before its body is decoded, so the sync and
//! async readers share [`decode_frame`] and only differ in how bytes arrive.

use std::io::{Read, Write};

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::trace;

use crate::config::{DEFAULT_COMPRESSION_LEVEL, MAX_DATA_LENGTH, MAX_FRAME_LENGTH};
use crate::core::async_io::AsyncMcRead;
use crate::core::buffer::Buffer;
use crate::core::channel::{read_full, read_full_async, write_full, write_full_async};
use crate::core::primitives::{McRead, McWrite};
use crate::core::varint::encode_varint;
use crate::error::constants::{ERR_EMPTY_FRAME, ERR_FRAME_TRAILING};
use crate::error::{ProtocolError, Result};
use crate::protocol::packet::Packet;
use crate::protocol::registry::PacketSet;
use crate::protocol::version::ProtocolVersion;
use crate::utils::compression::{maybe_compress, maybe_decompress};

/// Compression threshold and size limits applied to every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSettings {
    /// Negative disables the compressed envelope.
    pub threshold: i32,
    /// zlib level used when deflating.
    pub level: u32,
    pub max_frame_length: usize,
    pub max_data_length: usize,
}

impl FrameSettings {
    pub const UNCOMPRESSED: Self = Self {
        threshold: -1,
        level: DEFAULT_COMPRESSION_LEVEL,
        max_frame_length: MAX_FRAME_LENGTH,
        max_data_length: MAX_DATA_LENGTH,
    };

    pub fn compressed(threshold: i32) -> Self {
        Self {
            threshold,
            ..Self::UNCOMPRESSED
        }
    }

    pub fn compression_enabled(&self) -> bool {
        self.threshold >= 0
    }

    fn check_frame_length(&self, len: i32) -> Result<usize> {
        if len < 1 {
            return Err(ProtocolError::format(format!("{ERR_EMPTY_FRAME}, got {len}")));
        }
        let len = len as usize;
        if len > self.max_frame_length {
            return Err(ProtocolError::format(format!(
                "frame length {len} exceeds limit {}",
                self.max_frame_length
            )));
        }
        Ok(len)
    }
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self::UNCOMPRESSED
    }
}

impl From<i32> for FrameSettings {
    fn from(threshold: i32) -> Self {
        Self::compressed(threshold)
    }
}

/// Encode `packet` into a complete frame, length prefix included.
///
/// `version` is mapped to its effective version first, so packet ids and body
/// layouts match what a registry for the same version would decode.
pub fn encode_frame(
    packet: &Packet,
    version: ProtocolVersion,
    settings: impl Into<FrameSettings>,
) -> Result<Vec<u8>> {
    let settings = settings.into();
    let version = version.resolve()?.effective;

    let mut inner = Buffer::new();
    inner.write_varint(packet.id(version)?)?;
    packet.encode_body(&mut inner, version)?;
    let inner = inner.into_inner();

    let body = if settings.compression_enabled() {
        if inner.len() > settings.max_data_length {
            return Err(ProtocolError::format(format!(
                "{} payload of {} bytes exceeds data limit {}",
                packet.name(),
                inner.len(),
                settings.max_data_length
            )));
        }
        let mut body = Vec::with_capacity(inner.len() + 5);
        match maybe_compress(&inner, settings.threshold, settings.level)? {
            Some(compressed) => {
                // bounded by max_data_length above, so the cast is lossless
                encode_varint(inner.len() as i32, &mut body);
                body.extend_from_slice(&compressed);
                trace!(
                    packet = packet.name(),
                    data_len = inner.len(),
                    compressed_len = body.len(),
                    "compressed frame"
                );
            }
            None => {
                encode_varint(0, &mut body);
                body.extend_from_slice(&inner);
            }
        }
        body
    } else {
        inner
    };

    if body.len() > settings.max_frame_length {
        return Err(ProtocolError::format(format!(
            "{} frame of {} bytes exceeds limit {}",
            packet.name(),
            body.len(),
            settings.max_frame_length
        )));
    }

    let mut frame = Vec::with_capacity(body.len() + 3);
    encode_varint(body.len() as i32, &mut frame);
    frame.extend_from_slice(&body);
    trace!(packet = packet.name(), len = frame.len(), "encoded frame");
    Ok(frame)
}

/// Decode one frame body (everything after the length prefix).
///
/// # Errors
/// - `ProtocolError::Format` for a bad data length, a corrupt zlib stream or
///   bytes left over after the packet body
/// - `ProtocolError::UnknownPacket` if the id is not in `packets`
pub fn decode_frame(
    body: Vec<u8>,
    packets: &PacketSet,
    settings: impl Into<FrameSettings>,
) -> Result<Packet> {
    let settings = settings.into();
    let mut buf = Buffer::from_bytes(body);

    if settings.compression_enabled() {
        let data_len = buf.read_varint()?;
        if data_len < 0 {
            return Err(ProtocolError::format(format!(
                "negative data length {data_len}"
            )));
        }
        let declared = (data_len > 0).then_some(data_len as usize);
        if let Some(inflated) = maybe_decompress(buf.peek(), declared, settings.max_data_length)? {
            trace!(data_len, "inflated frame");
            buf = Buffer::from_bytes(inflated);
        }
    }

    decode_payload(&mut buf, packets)
}

fn decode_payload(buf: &mut Buffer, packets: &PacketSet) -> Result<Packet> {
    let id = buf.read_varint()?;
    let packet_type = packets.lookup(id)?;
    let packet = packet_type.decode(buf, packets.version())?;
    if buf.has_remaining() {
        return Err(ProtocolError::format(format!(
            "{ERR_FRAME_TRAILING}: {} left {} bytes",
            packet_type.name,
            buf.remaining()
        )));
    }
    trace!(packet = packet_type.name, id, "decoded frame");
    Ok(packet)
}

/// Write one packet to a blocking channel.
pub fn write_packet<W: Write + ?Sized>(
    writer: &mut W,
    packet: &Packet,
    version: ProtocolVersion,
    settings: impl Into<FrameSettings>,
) -> Result<()> {
    let frame = encode_frame(packet, version, settings)?;
    write_full(writer, &frame)
}

/// Read one packet from a blocking channel.
///
/// After an error the channel position is undefined; discard it.
pub fn read_packet<R: Read + ?Sized>(
    reader: &mut R,
    packets: &PacketSet,
    settings: impl Into<FrameSettings>,
) -> Result<Packet> {
    let settings = settings.into();
    let len = settings.check_frame_length(McRead::read_varint(reader)?)?;
    let body = read_full(reader, len)?;
    decode_frame(body, packets, settings)
}

/// Write one packet to an async channel.
pub async fn write_packet_async<W: AsyncWrite + Unpin + Send + ?Sized>(
    writer: &mut W,
    packet: &Packet,
    version: ProtocolVersion,
    settings: impl Into<FrameSettings>,
) -> Result<()> {
    let frame = encode_frame(packet, version, settings)?;
    write_full_async(writer, &frame).await
}

/// Read one packet from an async channel.
pub async fn read_packet_async<R: AsyncRead + Unpin + Send + ?Sized>(
    reader: &mut R,
    packets: &PacketSet,
    settings: impl Into<FrameSettings>,
) -> Result<Packet> {
    let settings = settings.into();
    let len = settings.check_frame_length(AsyncMcRead::read_varint(reader).await?)?;
    let body = read_full_async(reader, len).await?;
    decode_frame(body, packets, settings)
}
