//! # NBT
//!
//! Named Binary Tag trees: the typed, self-describing format embedded in
//! packet bodies and world data.
//!
//! ## Components
//! - **Tag**: `Tag`, `List`, `Compound`, `NamedTag` and their invariants
//! - **IO**: binary encoding, blocking and async
//! - **Native**: conversion to and from `serde_json::Value`
//!
//! ## Example
//! ```rust
//! use mc_protocol::nbt::{self, Compound, NamedTag, Tag};
//!
//! let root = NamedTag::new("level", Compound::new().with("seed", 42i64)?);
//! let bytes = nbt::to_bytes(&root)?;
//! assert_eq!(nbt::from_bytes(&bytes)?, root);
//! # Ok::<(), mc_protocol::error::ProtocolError>(())
//! ```

pub mod io;
pub mod native;
pub mod tag;

pub use io::{
    from_bytes, read_tag, read_tag_async, to_bytes, write_tag, write_tag_async, Header, MAX_DEPTH,
};
pub use native::{from_native, to_native, Schema};
pub use tag::{Compound, List, NamedTag, Tag, TagKind};
