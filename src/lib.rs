//! # mc-protocol
//!
//! Byte-exact codec for the Minecraft: Java Edition network protocol.
//!
//! The crate turns structured values into the bytes a vanilla client or
//! server expects and back: VarInt/VarLong integers, length-prefixed strings,
//! packet frames with optional zlib compression, a versioned packet registry
//! and NBT trees. Every codec comes in a blocking form over `std::io` and an
//! async form over `tokio::io`; both produce identical bytes.
//!
//! Sockets, encryption and connection state machines are left to the caller.
//!
//! ## Modules
//! - [`core`]: buffers, primitives, frames and the `tokio_util` codec
//! - [`protocol`]: game states, versions, packets and the registry
//! - [`nbt`]: NBT tree types, binary IO and JSON interop
//! - [`config`]: TOML / environment configuration
//! - [`error`]: the crate-wide error type
//!
//! ## Example
//! ```rust
//! use mc_protocol::core::frame::{read_packet, write_packet};
//! use mc_protocol::protocol::handshake::{Handshake, NextState};
//! use mc_protocol::protocol::{Direction, GameState, Packet, PacketRegistry, ProtocolVersion};
//!
//! let registry = PacketRegistry::new();
//! let version = ProtocolVersion::V1_18_1;
//! let handshake: Packet = Handshake {
//!     protocol_version: version.number(),
//!     server_address: "localhost".into(),
//!     server_port: 25565,
//!     next_state: NextState::Status,
//! }
//! .into();
//!
//! let mut wire = Vec::new();
//! write_packet(&mut wire, &handshake, version, -1)?;
//!
//! let inbound = registry.resolve(version, GameState::Handshaking, Direction::Serverbound)?;
//! assert_eq!(read_packet(&mut wire.as_slice(), &inbound, -1)?, handshake);
//! # Ok::<(), mc_protocol::error::ProtocolError>(())
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod core;
pub mod error;
pub mod nbt;
pub mod protocol;
pub mod utils;

pub use error::{ProtocolError, Result};
