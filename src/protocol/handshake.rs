//! Handshaking-state packets.
//!
//! The handshake is the first packet on every connection; it carries the
//! client's protocol version and selects the next state.

use crate::core::primitives::{McRead, McWrite};
use crate::core::Buffer;
use crate::error::{ProtocolError, Result};
use crate::protocol::packet::PacketBody;
use crate::protocol::state::{Direction, GameState};
use crate::protocol::version::ProtocolVersion;

/// Longest server address accepted in a handshake.
pub const MAX_ADDRESS_CHARS: usize = 255;

/// State requested by the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NextState {
    Status,
    Login,
}

impl NextState {
    pub fn code(self) -> i32 {
        match self {
            NextState::Status => 1,
            NextState::Login => 2,
        }
    }

    pub fn game_state(self) -> GameState {
        match self {
            NextState::Status => GameState::Status,
            NextState::Login => GameState::Login,
        }
    }
}

impl TryFrom<i32> for NextState {
    type Error = ProtocolError;

    fn try_from(code: i32) -> Result<Self> {
        match code {
            1 => Ok(NextState::Status),
            2 => Ok(NextState::Login),
            other => Err(ProtocolError::format(format!(
                "invalid handshake next state {other} (expected 1 or 2)"
            ))),
        }
    }
}

/// Serverbound 0x00 in the handshaking state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub protocol_version: i32,
    pub server_address: String,
    pub server_port: u16,
    pub next_state: NextState,
}

impl PacketBody for Handshake {
    const NAME: &'static str = "handshake";
    const STATE: GameState = GameState::Handshaking;
    const DIRECTIONS: &'static [Direction] = &[Direction::Serverbound];

    fn id(_version: ProtocolVersion) -> Option<i32> {
        Some(0x00)
    }

    fn decode(buf: &mut Buffer, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            protocol_version: buf.read_varint()?,
            server_address: buf.read_utf_max(MAX_ADDRESS_CHARS)?,
            server_port: buf.read_value::<u16>()?,
            next_state: NextState::try_from(buf.read_varint()?)?,
        })
    }

    fn encode(&self, buf: &mut Buffer, _version: ProtocolVersion) -> Result<()> {
        buf.write_varint(self.protocol_version)?;
        buf.write_utf_max(&self.server_address, MAX_ADDRESS_CHARS)?;
        buf.write_value(self.server_port)?;
        buf.write_varint(self.next_state.code())
    }
}
