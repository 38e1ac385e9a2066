//! # Error Types
//!
//! Error handling for every codec layer.
//!
//! This module defines all error variants that can occur while encoding or
//! decoding, from low-level I/O failures up to registry and NBT structure
//! violations.
//!
//! ## Error Categories
//! - **I/O Errors**: Failures reported by the underlying byte channel
//! - **Range Errors**: Values that do not fit the target width
//! - **Format Errors**: Malformed VarInts, frames, strings or NBT type bytes
//! - **Registry Errors**: Unknown packet ids, unsupported versions, duplicate registrations
//! - **NBT Errors**: Structural invariant violations and schema mismatches
//!
//! None of these are recoverable for the operation in flight. A channel that
//! produced an error mid-frame must not be read from again.
//!
//! ## Example Usage
//! ```rust
//! use mc_protocol::core::Buffer;
//! use mc_protocol::core::primitives::McRead;
//! use mc_protocol::error::ProtocolError;
//!
//! let mut buf = Buffer::from_bytes(vec![0xFF, 0xFF]);
//! match buf.read_varint() {
//!     Err(ProtocolError::UnexpectedEnd { partial, .. }) => assert_eq!(partial, vec![0xFF, 0xFF]),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use std::io;
use thiserror::Error;

use crate::protocol::state::{Direction, GameState};

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Registry errors
    pub const ERR_REGISTRY_READ_LOCK: &str = "Failed to acquire read lock on packet registry";
    pub const ERR_REGISTRY_WRITE_LOCK: &str = "Failed to acquire write lock on packet registry";

    /// VarInt errors
    pub const ERR_VARINT_TOO_LONG: &str = "VarInt exceeds 5 bytes";
    pub const ERR_VARLONG_TOO_LONG: &str = "VarLong exceeds 10 bytes";

    /// Frame errors
    pub const ERR_EMPTY_FRAME: &str = "Frame length must be at least 1";
    pub const ERR_FRAME_TRAILING: &str = "Packet body did not consume the whole frame";
    pub const ERR_DECOMPRESSION_FAILED: &str = "Decompression failed";
    pub const ERR_COMPRESSION_FAILED: &str = "Compression failed";

    /// String errors
    pub const ERR_NEGATIVE_LENGTH: &str = "Negative length prefix";
    pub const ERR_INVALID_UTF8: &str = "String is not valid UTF-8";

    /// NBT errors
    pub const ERR_NBT_TOO_DEEP: &str = "NBT nesting exceeds 512 levels";
    pub const ERR_NBT_TRAILING: &str = "Trailing bytes after NBT root";
}

/// ProtocolError is the primary error type for all codec operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A value outside the representable range of its target encoding.
    #[error("Value {value} out of range for {kind} (expected {min}..={max})")]
    Range {
        kind: &'static str,
        value: String,
        min: String,
        max: String,
    },

    /// Malformed bytes on the wire.
    #[error("Format error: {0}")]
    Format(String),

    /// The channel ran dry mid-read. `partial` holds what was read (diagnostic only).
    #[error("Unexpected end of stream: expected {expected} bytes, got {}", partial.len())]
    UnexpectedEnd { expected: usize, partial: Vec<u8> },

    #[error("Unknown packet id {id:#04x} for {direction:?} {state:?} (protocol {version})")]
    UnknownPacket {
        id: i32,
        state: GameState,
        direction: Direction,
        version: i32,
    },

    #[error("Unsupported protocol version {0}: no older supported version to fall back to")]
    UnsupportedVersion(i32),

    #[error("Duplicate packet id {id:#04x} in {direction:?} {state:?}: {first} conflicts with {second}")]
    Registration {
        id: i32,
        state: GameState,
        direction: Direction,
        first: &'static str,
        second: &'static str,
    },

    /// An NBT invariant violation (heterogeneous list, bad compound names).
    #[error("NBT structure error: {0}")]
    Structural(String),

    #[error("Schema mismatch: expected {expected}, found {found}")]
    SchemaMismatch { expected: String, found: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Synchronization primitive poisoned: {0}")]
    LockPoisoned(&'static str),
}

impl ProtocolError {
    /// Shorthand for a [`ProtocolError::Format`] built from anything displayable.
    pub fn format(msg: impl Into<String>) -> Self {
        ProtocolError::Format(msg.into())
    }

    pub fn structural(msg: impl Into<String>) -> Self {
        ProtocolError::Structural(msg.into())
    }

    pub fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        ProtocolError::SchemaMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
