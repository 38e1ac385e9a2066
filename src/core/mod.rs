//! # Core Codec Components
//!
//! Byte channels, primitive encodings and packet framing.
//!
//! ## Components
//! - **Buffer**: growable byte sequence with a read cursor
//! - **Channel**: "read exactly N" / "write all" over std and tokio I/O
//! - **Primitives**: fixed-width values, VarInt/VarLong, strings, optionals
//! - **Frame**: length-prefixed packet envelopes with optional zlib compression
//! - **Codec**: `tokio_util` framing for `Framed` streams
//!
//! ## Wire Format
//! ```text
//! [VarInt len] [VarInt id] [body]
//! [VarInt len] [VarInt data_len] [zlib([VarInt id] [body]) | [VarInt id] [body]]
//! ```
//!
//! ## Limits
//! - Frames longer than 2 097 151 bytes are rejected
//! - Declared lengths are validated before any allocation

pub mod async_io;
pub mod buffer;
pub mod channel;
pub mod codec;
pub mod frame;
pub mod primitives;
pub mod varint;

pub use buffer::Buffer;
