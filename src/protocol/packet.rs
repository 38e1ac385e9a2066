//! Packet abstraction.
//!
//! Every concrete packet implements [`PacketBody`], which describes where the
//! packet lives (state, directions, per-version id) and how its body is laid
//! out. The closed [`Packet`] enum wraps all of them so frames can be decoded
//! without knowing the concrete type up front.

use std::fmt;

use crate::core::Buffer;
use crate::error::{ProtocolError, Result};
use crate::protocol::handshake::Handshake;
use crate::protocol::login::{
    EncryptionRequest, EncryptionResponse, LoginDisconnect, LoginPluginRequest,
    LoginPluginResponse, LoginStart, LoginSuccess, SetCompression,
};
use crate::protocol::state::{Direction, GameState};
use crate::protocol::status::{Ping, StatusRequest, StatusResponse};
use crate::protocol::version::ProtocolVersion;

/// Body layout and placement of one packet type.
///
/// Bodies exclude the frame envelope and the packet id.
pub trait PacketBody: Sized + Into<Packet> {
    const NAME: &'static str;
    const STATE: GameState;
    /// Directions the packet may travel in.
    const DIRECTIONS: &'static [Direction];

    /// Numeric id in `version`, or `None` if the packet does not exist there.
    fn id(version: ProtocolVersion) -> Option<i32>;

    fn decode(buf: &mut Buffer, version: ProtocolVersion) -> Result<Self>;

    fn encode(&self, buf: &mut Buffer, version: ProtocolVersion) -> Result<()>;
}

/// Decoder stored in a [`PacketType`].
pub type DecodeFn = fn(&mut Buffer, ProtocolVersion) -> Result<Packet>;

fn decode_as<P: PacketBody>(buf: &mut Buffer, version: ProtocolVersion) -> Result<Packet> {
    P::decode(buf, version).map(Into::into)
}

/// A packet type as registered for one protocol version.
#[derive(Clone, Copy)]
pub struct PacketType {
    pub name: &'static str,
    pub id: i32,
    pub state: GameState,
    pub directions: &'static [Direction],
    decode: DecodeFn,
}

impl PacketType {
    /// Describe `P` for `version`, if it exists there.
    pub fn of<P: PacketBody>(version: ProtocolVersion) -> Option<Self> {
        P::id(version).map(|id| Self {
            name: P::NAME,
            id,
            state: P::STATE,
            directions: P::DIRECTIONS,
            decode: decode_as::<P>,
        })
    }

    /// Build a descriptor by hand, bypassing [`PacketBody`].
    pub fn custom(
        name: &'static str,
        id: i32,
        state: GameState,
        directions: &'static [Direction],
        decode: DecodeFn,
    ) -> Self {
        Self {
            name,
            id,
            state,
            directions,
            decode,
        }
    }

    /// Decode a body positioned right after the packet id.
    pub fn decode(&self, buf: &mut Buffer, version: ProtocolVersion) -> Result<Packet> {
        (self.decode)(buf, version)
    }
}

impl fmt::Debug for PacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PacketType")
            .field("name", &self.name)
            .field("id", &format_args!("{:#04x}", self.id))
            .field("state", &self.state)
            .field("directions", &self.directions)
            .finish()
    }
}

macro_rules! packets {
    ($($variant:ident),* $(,)?) => {
        /// Any packet this crate can encode or decode.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Packet {
            $($variant($variant),)*
        }

        $(
            impl From<$variant> for Packet {
                fn from(p: $variant) -> Self {
                    Packet::$variant(p)
                }
            }
        )*

        impl Packet {
            pub fn name(&self) -> &'static str {
                match self {
                    $(Packet::$variant(_) => <$variant as PacketBody>::NAME,)*
                }
            }

            pub fn state(&self) -> GameState {
                match self {
                    $(Packet::$variant(_) => <$variant as PacketBody>::STATE,)*
                }
            }

            pub fn directions(&self) -> &'static [Direction] {
                match self {
                    $(Packet::$variant(_) => <$variant as PacketBody>::DIRECTIONS,)*
                }
            }

            /// Numeric id of this packet in `version`.
            ///
            /// # Errors
            /// Returns `ProtocolError::Format` if the packet does not exist in `version`.
            pub fn id(&self, version: ProtocolVersion) -> Result<i32> {
                let id = match self {
                    $(Packet::$variant(_) => <$variant as PacketBody>::id(version),)*
                };
                id.ok_or_else(|| {
                    ProtocolError::format(format!(
                        "{} does not exist in protocol {version}",
                        self.name()
                    ))
                })
            }

            /// Encode the body (no envelope, no id).
            pub fn encode_body(&self, buf: &mut Buffer, version: ProtocolVersion) -> Result<()> {
                match self {
                    $(Packet::$variant(p) => p.encode(buf, version),)*
                }
            }
        }

        /// Every packet type declared for `version`, in declaration order.
        pub fn declared_packets(version: ProtocolVersion) -> Vec<PacketType> {
            [$(PacketType::of::<$variant>(version),)*]
                .into_iter()
                .flatten()
                .collect()
        }
    };
}

packets! {
    Handshake,
    StatusRequest,
    StatusResponse,
    Ping,
    LoginStart,
    LoginDisconnect,
    EncryptionRequest,
    EncryptionResponse,
    LoginSuccess,
    SetCompression,
    LoginPluginRequest,
    LoginPluginResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_packets_filter_by_version() {
        let v1_8 = declared_packets(ProtocolVersion::V1_8);
        let v1_20 = declared_packets(ProtocolVersion::V1_20_1);
        assert!(v1_8.iter().all(|t| t.name != LoginPluginRequest::NAME));
        assert!(v1_20.iter().any(|t| t.name == LoginPluginRequest::NAME));
        assert_eq!(v1_20.len(), 12);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_packet_metadata() {
        let packet: Packet = Ping { payload: 7 }.into();
        assert_eq!(packet.name(), "ping");
        assert_eq!(packet.state(), GameState::Status);
        assert_eq!(packet.directions().len(), 2);
        assert_eq!(packet.id(ProtocolVersion::V1_18_1).unwrap(), 0x01);
    }

    #[test]
    fn test_missing_packet_id_is_error() {
        let packet: Packet = LoginPluginResponse {
            message_id: 1,
            data: None,
        }
        .into();
        assert!(packet.id(ProtocolVersion::V1_8).is_err());
    }
}
