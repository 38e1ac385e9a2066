//! Packet registry keyed by (version, state, direction).
//!
//! Tables are built lazily per effective version and cached behind a
//! [`RwLock`]; lookups after the first build only take the read lock. Each
//! [`PacketSet`] holds an `Arc` to its map, so callers can keep using a set
//! without holding any lock.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, instrument, warn};

use crate::error::constants::{ERR_REGISTRY_READ_LOCK, ERR_REGISTRY_WRITE_LOCK};
use crate::error::{ProtocolError, Result};
use crate::protocol::packet::{declared_packets, PacketType};
use crate::protocol::state::{Direction, GameState};
use crate::protocol::version::{Fallback, ProtocolVersion, Resolution};

/// Packet types valid for one (version, state, direction), keyed by id.
#[derive(Debug, Clone)]
pub struct PacketSet {
    version: ProtocolVersion,
    state: GameState,
    direction: Direction,
    types: Arc<HashMap<i32, PacketType>>,
}

impl PacketSet {
    /// Effective version the ids belong to.
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn get(&self, id: i32) -> Option<&PacketType> {
        self.types.get(&id)
    }

    /// Look `id` up, failing with `ProtocolError::UnknownPacket`.
    pub fn lookup(&self, id: i32) -> Result<&PacketType> {
        self.get(id).ok_or(ProtocolError::UnknownPacket {
            id,
            state: self.state,
            direction: self.direction,
            version: self.version.number(),
        })
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered ids in ascending order.
    pub fn ids(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.types.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// Every packet set of one effective version.
#[derive(Debug)]
pub struct PacketTable {
    version: ProtocolVersion,
    sets: HashMap<(GameState, Direction), Arc<HashMap<i32, PacketType>>>,
}

impl PacketTable {
    /// Build the table from the packets declared for `version`.
    pub fn build(version: ProtocolVersion) -> Result<Self> {
        Self::build_from(version, declared_packets(version))
    }

    /// Build a table from an explicit list of packet types.
    ///
    /// # Errors
    /// Returns `ProtocolError::Registration` when two types claim the same id
    /// in the same state and direction.
    #[instrument(level = "debug", skip(types), fields(count = types.len()))]
    pub fn build_from(version: ProtocolVersion, types: Vec<PacketType>) -> Result<Self> {
        let mut sets: HashMap<(GameState, Direction), HashMap<i32, PacketType>> = HashMap::new();
        for packet_type in types {
            for &direction in packet_type.directions {
                let set = sets.entry((packet_type.state, direction)).or_default();
                if let Some(existing) = set.get(&packet_type.id) {
                    return Err(ProtocolError::Registration {
                        id: packet_type.id,
                        state: packet_type.state,
                        direction,
                        first: existing.name,
                        second: packet_type.name,
                    });
                }
                set.insert(packet_type.id, packet_type);
            }
        }
        debug!(sets = sets.len(), "packet table built");
        Ok(Self {
            version,
            sets: sets.into_iter().map(|(k, v)| (k, Arc::new(v))).collect(),
        })
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// The set for `state` and `direction`; empty if nothing is registered there.
    pub fn set(&self, state: GameState, direction: Direction) -> PacketSet {
        PacketSet {
            version: self.version,
            state,
            direction,
            types: self
                .sets
                .get(&(state, direction))
                .cloned()
                .unwrap_or_default(),
        }
    }
}

/// Thread-safe cache of packet tables.
///
/// Concurrent first requests for the same version may both build a table;
/// only one is kept and both callers see the same `Arc`.
#[derive(Debug, Default)]
pub struct PacketRegistry {
    tables: RwLock<HashMap<ProtocolVersion, Arc<PacketTable>>>,
}

impl PacketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a requested version to the one whose layouts will be used, logging
    /// a warning when the mapping is only approximate.
    pub fn resolution(&self, version: ProtocolVersion) -> Result<Resolution> {
        let resolution = version.resolve()?;
        if resolution.fallback == Fallback::Nearest {
            warn!(
                requested = version.number(),
                effective = resolution.effective.number(),
                "unsupported protocol version, falling back to nearest older layout"
            );
        }
        Ok(resolution)
    }

    /// The table for the effective version of `version`.
    pub fn table(&self, version: ProtocolVersion) -> Result<Arc<PacketTable>> {
        let effective = self.resolution(version)?.effective;

        {
            let tables = self
                .tables
                .read()
                .map_err(|_| ProtocolError::LockPoisoned(ERR_REGISTRY_READ_LOCK))?;
            if let Some(table) = tables.get(&effective) {
                return Ok(Arc::clone(table));
            }
        }

        let built = Arc::new(PacketTable::build(effective)?);
        let mut tables = self
            .tables
            .write()
            .map_err(|_| ProtocolError::LockPoisoned(ERR_REGISTRY_WRITE_LOCK))?;
        Ok(Arc::clone(tables.entry(effective).or_insert(built)))
    }

    /// The packet set for `version`, `state` and `direction`.
    pub fn resolve(
        &self,
        version: ProtocolVersion,
        state: GameState,
        direction: Direction,
    ) -> Result<PacketSet> {
        Ok(self.table(version)?.set(state, direction))
    }

    /// Number of versions with a cached table.
    pub fn cached_versions(&self) -> Result<usize> {
        self.tables
            .read()
            .map(|t| t.len())
            .map_err(|_| ProtocolError::LockPoisoned(ERR_REGISTRY_READ_LOCK))
    }
}
