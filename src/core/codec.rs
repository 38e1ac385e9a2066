//! `tokio_util::codec` adapter for use with `Framed`.
//!
//! The codec owns the connection's framing state: the packet table for its
//! protocol version, the current game state, the direction it decodes and
//! the compression settings. Callers switch state and compression as the
//! corresponding packets go by.

use std::sync::Arc;

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::core::frame::{decode_frame, encode_frame, FrameSettings};
use crate::core::varint::peek_varint;
use crate::error::{ProtocolError, Result};
use crate::protocol::packet::Packet;
use crate::protocol::registry::{PacketRegistry, PacketSet, PacketTable};
use crate::protocol::state::{Direction, GameState};
use crate::protocol::version::ProtocolVersion;

/// Frame codec for one side of a connection.
#[derive(Debug, Clone)]
pub struct PacketCodec {
    table: Arc<PacketTable>,
    inbound: Direction,
    state: GameState,
    packets: PacketSet,
    settings: FrameSettings,
}

impl PacketCodec {
    /// Codec for a connection speaking `version`, decoding `inbound` packets.
    ///
    /// Starts in the handshaking state with compression off.
    pub fn new(registry: &PacketRegistry, version: ProtocolVersion, inbound: Direction) -> Result<Self> {
        let table = registry.table(version)?;
        let packets = table.set(GameState::Handshaking, inbound);
        Ok(Self {
            table,
            inbound,
            state: GameState::Handshaking,
            packets,
            settings: FrameSettings::UNCOMPRESSED,
        })
    }

    /// Codec for the server side: decodes serverbound packets.
    pub fn server(registry: &PacketRegistry, version: ProtocolVersion) -> Result<Self> {
        Self::new(registry, version, Direction::Serverbound)
    }

    /// Codec for the client side: decodes clientbound packets.
    pub fn client(registry: &PacketRegistry, version: ProtocolVersion) -> Result<Self> {
        Self::new(registry, version, Direction::Clientbound)
    }

    pub fn with_settings(mut self, settings: FrameSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn version(&self) -> ProtocolVersion {
        self.table.version()
    }

    pub fn settings(&self) -> FrameSettings {
        self.settings
    }

    pub fn set_state(&mut self, state: GameState) {
        debug!(from = ?self.state, to = ?state, "codec state change");
        self.state = state;
        self.packets = self.table.set(state, self.inbound);
    }

    /// Apply a `SetCompression` threshold; negative turns compression off.
    pub fn set_compression(&mut self, threshold: i32) {
        debug!(threshold, "codec compression change");
        self.settings.threshold = threshold;
    }
}

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        let Some((len, prefix)) = peek_varint(src)? else {
            return Ok(None);
        };
        if len < 1 || len as usize > self.settings.max_frame_length {
            return Err(ProtocolError::format(format!("invalid frame length {len}")));
        }
        let len = len as usize;

        if src.len() < prefix + len {
            src.reserve(prefix + len - src.len());
            return Ok(None);
        }

        src.advance(prefix);
        let body = src.split_to(len);
        decode_frame(body.to_vec(), &self.packets, self.settings).map(Some)
    }
}

impl Encoder<&Packet> for PacketCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: &Packet, dst: &mut BytesMut) -> Result<()> {
        let frame = encode_frame(item, self.table.version(), self.settings)?;
        dst.reserve(frame.len());
        dst.extend_from_slice(&frame);
        Ok(())
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<()> {
        <Self as Encoder<&Packet>>::encode(self, &item, dst)
    }
}
