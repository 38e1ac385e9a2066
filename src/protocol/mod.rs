//! # Protocol Layer
//!
//! Packet definitions, protocol versions and the registry that maps numeric
//! ids back to packet types.
//!
//! ## Components
//! - **State / Direction**: scope of a packet id
//! - **Version**: supported versions and fallback resolution
//! - **Packet**: the `PacketBody` trait and the closed `Packet` enum
//! - **Registry**: per-version lookup tables, built once and cached
//! - **Handshake / Status / Login**: concrete packet catalog

pub mod handshake;
pub mod login;
pub mod packet;
pub mod registry;
pub mod state;
pub mod status;
pub mod version;

pub use packet::{Packet, PacketBody, PacketType};
pub use registry::{PacketRegistry, PacketSet, PacketTable};
pub use state::{Direction, GameState};
pub use version::ProtocolVersion;
