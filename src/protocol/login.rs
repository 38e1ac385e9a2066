//! Login-state packets.
//!
//! Several bodies changed shape across releases; the `since_*` helpers below
//! name the protocol numbers where each change landed.

use crate::core::primitives::{McRead, McWrite};
use crate::core::Buffer;
use crate::error::{ProtocolError, Result};
use crate::protocol::packet::PacketBody;
use crate::protocol::state::{Direction, GameState};
use crate::protocol::version::ProtocolVersion;

/// Longest player name accepted by the login start packet.
pub const MAX_USERNAME_CHARS: usize = 16;
/// Longest server id in the encryption request.
pub const MAX_SERVER_ID_CHARS: usize = 20;
/// Longest namespaced identifier in a plugin request.
pub const MAX_IDENTIFIER_CHARS: usize = 32767;

/// 1.13 added the login plugin channel.
fn has_plugin_messages(version: ProtocolVersion) -> bool {
    version.number() >= 393
}

/// 1.16 switched login success to a binary UUID.
fn has_binary_uuid(version: ProtocolVersion) -> bool {
    version.number() >= 735
}

/// 1.19 and 1.19.2 carried chat signing keys during login.
fn has_signed_login(version: ProtocolVersion) -> bool {
    (759..=760).contains(&version.number())
}

/// 1.19.1 added the optional player UUID to login start.
fn has_login_uuid(version: ProtocolVersion) -> bool {
    version.number() >= 760
}

/// 1.19 added profile properties to login success.
fn has_properties(version: ProtocolVersion) -> bool {
    version.number() >= 759
}

fn format_uuid(uuid: u128) -> String {
    let hex = format!("{uuid:032x}");
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

fn parse_uuid(text: &str) -> Result<u128> {
    let hex: String = text.chars().filter(|c| *c != '-').collect();
    if hex.len() != 32 {
        return Err(ProtocolError::format(format!("malformed UUID {text:?}")));
    }
    u128::from_str_radix(&hex, 16)
        .map_err(|_| ProtocolError::format(format!("malformed UUID {text:?}")))
}

/// Clientbound 0x00: the server refuses the login. `reason` is a chat JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginDisconnect {
    pub reason: String,
}

impl PacketBody for LoginDisconnect {
    const NAME: &'static str = "login_disconnect";
    const STATE: GameState = GameState::Login;
    const DIRECTIONS: &'static [Direction] = &[Direction::Clientbound];

    fn id(_version: ProtocolVersion) -> Option<i32> {
        Some(0x00)
    }

    fn decode(buf: &mut Buffer, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            reason: buf.read_utf()?,
        })
    }

    fn encode(&self, buf: &mut Buffer, _version: ProtocolVersion) -> Result<()> {
        buf.write_utf(&self.reason)
    }
}

/// Chat signing key sent with login start in 1.19 and 1.19.2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningKey {
    pub expires_at: i64,
    pub public_key: Vec<u8>,
    pub signature: Vec<u8>,
}

impl SigningKey {
    fn read(buf: &mut Buffer) -> Result<Self> {
        Ok(Self {
            expires_at: buf.read_value::<i64>()?,
            public_key: buf.read_byte_array()?,
            signature: buf.read_byte_array()?,
        })
    }

    fn write(&self, buf: &mut Buffer) -> Result<()> {
        buf.write_value(self.expires_at)?;
        buf.write_byte_array(&self.public_key)?;
        buf.write_byte_array(&self.signature)
    }
}

/// Serverbound 0x00.
///
/// `signing_key` only exists on the wire for 1.19 and 1.19.2; `uuid` from
/// 1.19.2 on. Fields absent in the target version are dropped when encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginStart {
    pub name: String,
    pub signing_key: Option<SigningKey>,
    pub uuid: Option<u128>,
}

impl LoginStart {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            signing_key: None,
            uuid: None,
        }
    }
}

impl PacketBody for LoginStart {
    const NAME: &'static str = "login_start";
    const STATE: GameState = GameState::Login;
    const DIRECTIONS: &'static [Direction] = &[Direction::Serverbound];

    fn id(_version: ProtocolVersion) -> Option<i32> {
        Some(0x00)
    }

    fn decode(buf: &mut Buffer, version: ProtocolVersion) -> Result<Self> {
        let name = buf.read_utf_max(MAX_USERNAME_CHARS)?;
        let signing_key = if has_signed_login(version) {
            buf.read_optional(SigningKey::read)?
        } else {
            None
        };
        let uuid = if has_login_uuid(version) {
            buf.read_optional(|b| b.read_uuid())?
        } else {
            None
        };
        Ok(Self {
            name,
            signing_key,
            uuid,
        })
    }

    fn encode(&self, buf: &mut Buffer, version: ProtocolVersion) -> Result<()> {
        buf.write_utf_max(&self.name, MAX_USERNAME_CHARS)?;
        if has_signed_login(version) {
            buf.write_optional(self.signing_key.as_ref(), |b, key| key.write(b))?;
        }
        if has_login_uuid(version) {
            buf.write_optional(self.uuid.as_ref(), |b, uuid| b.write_uuid(*uuid))?;
        }
        Ok(())
    }
}

/// Clientbound 0x01: the server's public key and a verify token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionRequest {
    pub server_id: String,
    pub public_key: Vec<u8>,
    pub verify_token: Vec<u8>,
}

impl PacketBody for EncryptionRequest {
    const NAME: &'static str = "encryption_request";
    const STATE: GameState = GameState::Login;
    const DIRECTIONS: &'static [Direction] = &[Direction::Clientbound];

    fn id(_version: ProtocolVersion) -> Option<i32> {
        Some(0x01)
    }

    fn decode(buf: &mut Buffer, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            server_id: buf.read_utf_max(MAX_SERVER_ID_CHARS)?,
            public_key: buf.read_byte_array()?,
            verify_token: buf.read_byte_array()?,
        })
    }

    fn encode(&self, buf: &mut Buffer, _version: ProtocolVersion) -> Result<()> {
        buf.write_utf_max(&self.server_id, MAX_SERVER_ID_CHARS)?;
        buf.write_byte_array(&self.public_key)?;
        buf.write_byte_array(&self.verify_token)
    }
}

/// How the client proves it decrypted the verify token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The encrypted verify token.
    Token(Vec<u8>),
    /// A salted signature over the token; only valid in 1.19 and 1.19.2.
    Signature { salt: i64, signature: Vec<u8> },
}

/// Serverbound 0x01.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionResponse {
    pub shared_secret: Vec<u8>,
    pub verification: Verification,
}

impl PacketBody for EncryptionResponse {
    const NAME: &'static str = "encryption_response";
    const STATE: GameState = GameState::Login;
    const DIRECTIONS: &'static [Direction] = &[Direction::Serverbound];

    fn id(_version: ProtocolVersion) -> Option<i32> {
        Some(0x01)
    }

    fn decode(buf: &mut Buffer, version: ProtocolVersion) -> Result<Self> {
        let shared_secret = buf.read_byte_array()?;
        let has_token = !has_signed_login(version) || buf.read_value::<bool>()?;
        let verification = if has_token {
            Verification::Token(buf.read_byte_array()?)
        } else {
            Verification::Signature {
                salt: buf.read_value::<i64>()?,
                signature: buf.read_byte_array()?,
            }
        };
        Ok(Self {
            shared_secret,
            verification,
        })
    }

    fn encode(&self, buf: &mut Buffer, version: ProtocolVersion) -> Result<()> {
        buf.write_byte_array(&self.shared_secret)?;
        let signed = has_signed_login(version);
        match &self.verification {
            Verification::Token(token) => {
                if signed {
                    buf.write_value(true)?;
                }
                buf.write_byte_array(token)
            }
            Verification::Signature { salt, signature } if signed => {
                buf.write_value(false)?;
                buf.write_value(*salt)?;
                buf.write_byte_array(signature)
            }
            Verification::Signature { .. } => Err(ProtocolError::format(format!(
                "signature verification does not exist in protocol {version}"
            ))),
        }
    }
}

/// One entry of a game profile's property list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub value: String,
    pub signature: Option<String>,
}

/// Clientbound 0x02: login accepted.
///
/// Before 1.16 the UUID travelled as hyphenated text; properties exist from 1.19 on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSuccess {
    pub uuid: u128,
    pub username: String,
    pub properties: Vec<Property>,
}

impl PacketBody for LoginSuccess {
    const NAME: &'static str = "login_success";
    const STATE: GameState = GameState::Login;
    const DIRECTIONS: &'static [Direction] = &[Direction::Clientbound];

    fn id(_version: ProtocolVersion) -> Option<i32> {
        Some(0x02)
    }

    fn decode(buf: &mut Buffer, version: ProtocolVersion) -> Result<Self> {
        let uuid = if has_binary_uuid(version) {
            buf.read_uuid()?
        } else {
            parse_uuid(&buf.read_utf_max(36)?)?
        };
        let username = buf.read_utf_max(MAX_USERNAME_CHARS)?;
        let mut properties = Vec::new();
        if has_properties(version) {
            let count = buf.read_varint()?;
            if count < 0 {
                return Err(ProtocolError::format(format!(
                    "negative property count {count}"
                )));
            }
            for _ in 0..count {
                properties.push(Property {
                    name: buf.read_utf()?,
                    value: buf.read_utf()?,
                    signature: buf.read_optional(|b| b.read_utf())?,
                });
            }
        }
        Ok(Self {
            uuid,
            username,
            properties,
        })
    }

    fn encode(&self, buf: &mut Buffer, version: ProtocolVersion) -> Result<()> {
        if has_binary_uuid(version) {
            buf.write_uuid(self.uuid)?;
        } else {
            buf.write_utf_max(&format_uuid(self.uuid), 36)?;
        }
        buf.write_utf_max(&self.username, MAX_USERNAME_CHARS)?;
        if has_properties(version) {
            let count = i32::try_from(self.properties.len()).map_err(|_| {
                ProtocolError::format("too many profile properties")
            })?;
            buf.write_varint(count)?;
            for property in &self.properties {
                buf.write_utf(&property.name)?;
                buf.write_utf(&property.value)?;
                buf.write_optional(property.signature.as_deref(), |b, s| b.write_utf(s))?;
            }
        }
        Ok(())
    }
}

/// Clientbound 0x03: every later frame uses the compressed envelope.
///
/// A negative threshold turns compression off again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetCompression {
    pub threshold: i32,
}

impl PacketBody for SetCompression {
    const NAME: &'static str = "set_compression";
    const STATE: GameState = GameState::Login;
    const DIRECTIONS: &'static [Direction] = &[Direction::Clientbound];

    fn id(_version: ProtocolVersion) -> Option<i32> {
        Some(0x03)
    }

    fn decode(buf: &mut Buffer, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            threshold: buf.read_varint()?,
        })
    }

    fn encode(&self, buf: &mut Buffer, _version: ProtocolVersion) -> Result<()> {
        buf.write_varint(self.threshold)
    }
}

/// Clientbound 0x04 (1.13+): custom query; `data` runs to the end of the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginPluginRequest {
    pub message_id: i32,
    pub channel: String,
    pub data: Vec<u8>,
}

impl PacketBody for LoginPluginRequest {
    const NAME: &'static str = "login_plugin_request";
    const STATE: GameState = GameState::Login;
    const DIRECTIONS: &'static [Direction] = &[Direction::Clientbound];

    fn id(version: ProtocolVersion) -> Option<i32> {
        has_plugin_messages(version).then_some(0x04)
    }

    fn decode(buf: &mut Buffer, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            message_id: buf.read_varint()?,
            channel: buf.read_utf_max(MAX_IDENTIFIER_CHARS)?,
            data: buf.read_remaining()?,
        })
    }

    fn encode(&self, buf: &mut Buffer, _version: ProtocolVersion) -> Result<()> {
        buf.write_varint(self.message_id)?;
        buf.write_utf_max(&self.channel, MAX_IDENTIFIER_CHARS)?;
        buf.write_raw(&self.data)
    }
}

/// Serverbound 0x02 (1.13+): `None` means the client did not understand the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginPluginResponse {
    pub message_id: i32,
    pub data: Option<Vec<u8>>,
}

impl PacketBody for LoginPluginResponse {
    const NAME: &'static str = "login_plugin_response";
    const STATE: GameState = GameState::Login;
    const DIRECTIONS: &'static [Direction] = &[Direction::Serverbound];

    fn id(version: ProtocolVersion) -> Option<i32> {
        has_plugin_messages(version).then_some(0x02)
    }

    fn decode(buf: &mut Buffer, _version: ProtocolVersion) -> Result<Self> {
        Ok(Self {
            message_id: buf.read_varint()?,
            data: buf.read_optional(|b| b.read_remaining())?,
        })
    }

    fn encode(&self, buf: &mut Buffer, _version: ProtocolVersion) -> Result<()> {
        buf.write_varint(self.message_id)?;
        buf.write_optional(self.data.as_deref(), |b, data| b.write_raw(data))
    }
}
