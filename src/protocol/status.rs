//! Status-state packets (server list ping).

use crate::core::primitives::{McRead, McWrite};
use crate::core::Buffer;
use crate::error::Result;
use crate::protocol::packet::PacketBody;
use crate::protocol::state::{Direction, GameState};
use crate::protocol::version::ProtocolVersion;

/// Serverbound 0x00: asks for the status JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusRequest;

impl PacketBody for StatusRequest {
    const NAME: &'static str = "status_request";
    const STATE: GameState = GameState::Status;
    const DIRECTIONS: &'static [Direction] = &[Direction::Serverbound];

    fn id(_version: ProtocolVersion) -> Option<i32> {
        Some(0x00)
    }

    fn decode(_buf: &mut Buffer, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self)
    }

    fn encode(&self, _buf: &mut Buffer, _version: ProtocolVersion) -> Result<()> {
        Ok(())
    }
}

/// Clientbound 0x00: the server's status document, as raw JSON text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResponse {
    pub json: String,
}

impl StatusResponse {
    /// Parse the embedded JSON document.
    pub fn document(&self) -> Result<serde_json::Value> {
        serde_json::from_str(&self.json)
            .map_err(|e| crate::error::ProtocolError::format(format!("status JSON: {e}")))
    }
}

impl PacketBody for StatusResponse {
    const NAME: &'static str = "status_response";
    const STATE: GameState = GameState::Status;
    const DIRECTIONS: &'static [Direction] = &[Direction::Clientbound];

    fn id(_version: ProtocolVersion) -> Option<i32> {
        Some(0x00)
    }

    fn decode(buf: &mut Buffer, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            json: buf.read_utf()?,
        })
    }

    fn encode(&self, buf: &mut Buffer, _version: ProtocolVersion) -> Result<()> {
        buf.write_utf(&self.json)
    }
}

/// 0x01 in both directions: the client sends a payload and the server echoes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ping {
    pub payload: i64,
}

impl PacketBody for Ping {
    const NAME: &'static str = "ping";
    const STATE: GameState = GameState::Status;
    const DIRECTIONS: &'static [Direction] = &Direction::BOTH;

    fn id(_version: ProtocolVersion) -> Option<i32> {
        Some(0x01)
    }

    fn decode(buf: &mut Buffer, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            payload: buf.read_value::<i64>()?,
        })
    }

    fn encode(&self, buf: &mut Buffer, _version: ProtocolVersion) -> Result<()> {
        buf.write_value(self.payload)
    }
}
