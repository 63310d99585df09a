use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sled::IVec;

use crate::warps::errors::StoreError;
use crate::warps::ports::{BanMap, WarpStore};
use crate::warps::types::{PlayerId, WarpId, WarpRecord, WARP_SCHEMA_VERSION};

const TREE_WARPS: &str = "warps";
const TREE_BANS: &str = "warp_bans";

const WARP_PREFIX: &str = "warps:";
const BAN_PREFIX: &str = "bans:";

pub const BAN_SCHEMA_VERSION: u8 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct BanRecord {
    banned: Vec<PlayerId>,
    schema_version: u8,
}

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct SledWarpStoreBuilder {
    path: PathBuf,
    temporary: bool,
}

impl SledWarpStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            temporary: false,
        }
    }

    /// Delete the database when the store is dropped.
    pub fn temporary(mut self) -> Self {
        self.temporary = true;
        self
    }

    pub fn open(self) -> Result<SledWarpStore, StoreError> {
        SledWarpStore::open_with_options(self.path, self.temporary)
    }
}

/// Sled-backed Persistence Port. Warps live under `warps:<uuid>` and ban sets
/// under `bans:<owner uuid>`, both bincode encoded.
pub struct SledWarpStore {
    _db: sled::Db,
    warps: sled::Tree,
    bans: sled::Tree,
}

impl SledWarpStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::open_with_options(path, false)
    }

    fn open_with_options<P: AsRef<Path>>(path: P, temporary: bool) -> Result<Self, StoreError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::Config::new()
            .path(path_ref)
            .temporary(temporary)
            .open()?;
        let warps = db.open_tree(TREE_WARPS)?;
        let bans = db.open_tree(TREE_BANS)?;
        debug!("opened warp store at {}", path_ref.display());
        Ok(Self {
            _db: db,
            warps,
            bans,
        })
    }

    fn warp_key(id: WarpId) -> Vec<u8> {
        format!("{}{}", WARP_PREFIX, id).into_bytes()
    }

    fn ban_key(owner: PlayerId) -> Vec<u8> {
        format!("{}{}", BAN_PREFIX, owner).into_bytes()
    }

    fn parse_key<T: std::str::FromStr>(key: &[u8], prefix: &str) -> Result<T, StoreError> {
        let text = std::str::from_utf8(key)?;
        text.strip_prefix(prefix)
            .and_then(|rest| rest.parse().ok())
            .ok_or_else(|| StoreError::CorruptKey(text.to_string()))
    }

    fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, StoreError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    /// Number of stored warps, for status output.
    pub fn warp_count(&self) -> usize {
        self.warps.len()
    }
}

impl WarpStore for SledWarpStore {
    fn load_all_warps(&self) -> Result<Vec<(WarpId, WarpRecord)>, StoreError> {
        let mut out = Vec::new();
        for entry in self.warps.scan_prefix(WARP_PREFIX.as_bytes()) {
            let (key, value) = entry?;
            let id: WarpId = Self::parse_key(&key, WARP_PREFIX)?;
            let record: WarpRecord = Self::deserialize(value)?;
            if record.schema_version != WARP_SCHEMA_VERSION {
                return Err(StoreError::SchemaMismatch {
                    entity: "warp",
                    expected: WARP_SCHEMA_VERSION,
                    found: record.schema_version,
                });
            }
            out.push((id, record));
        }
        Ok(out)
    }

    fn save_warp(&mut self, id: WarpId, record: &WarpRecord) -> Result<(), StoreError> {
        let bytes = Self::serialize(record)?;
        self.warps.insert(Self::warp_key(id), bytes)?;
        self.warps.flush()?;
        Ok(())
    }

    fn delete_warp(&mut self, id: WarpId) -> Result<(), StoreError> {
        if self.warps.remove(Self::warp_key(id))?.is_none() {
            warn!("delete of unknown warp {} ignored", id);
        }
        self.warps.flush()?;
        Ok(())
    }

    fn load_bans(&self) -> Result<BanMap, StoreError> {
        let mut bans = HashMap::new();
        for entry in self.bans.scan_prefix(BAN_PREFIX.as_bytes()) {
            let (key, value) = entry?;
            let owner: PlayerId = Self::parse_key(&key, BAN_PREFIX)?;
            let record: BanRecord = Self::deserialize(value)?;
            if record.schema_version != BAN_SCHEMA_VERSION {
                return Err(StoreError::SchemaMismatch {
                    entity: "ban",
                    expected: BAN_SCHEMA_VERSION,
                    found: record.schema_version,
                });
            }
            let set: BTreeSet<PlayerId> = record.banned.into_iter().collect();
            if !set.is_empty() {
                bans.insert(owner, set);
            }
        }
        Ok(bans)
    }

    fn save_bans(&mut self, bans: &BanMap) -> Result<(), StoreError> {
        let mut batch = sled::Batch::default();
        for entry in self.bans.scan_prefix(BAN_PREFIX.as_bytes()) {
            let (key, _) = entry?;
            let owner: PlayerId = Self::parse_key(&key, BAN_PREFIX)?;
            if bans.get(&owner).map_or(true, |set| set.is_empty()) {
                batch.remove(key);
            }
        }
        for (owner, banned) in bans.iter().filter(|(_, set)| !set.is_empty()) {
            let record = BanRecord {
                banned: banned.iter().copied().collect(),
                schema_version: BAN_SCHEMA_VERSION,
            };
            batch.insert(Self::ban_key(*owner), Self::serialize(&record)?);
        }
        self.bans.apply_batch(batch)?;
        self.bans.flush()?;
        Ok(())
    }
}

/// Persistence Port kept entirely in memory. Records are returned in the
/// order they were first saved.
#[derive(Debug, Default, Clone)]
pub struct MemoryWarpStore {
    warps: Vec<(WarpId, WarpRecord)>,
    bans: BanMap,
}

impl MemoryWarpStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WarpStore for MemoryWarpStore {
    fn load_all_warps(&self) -> Result<Vec<(WarpId, WarpRecord)>, StoreError> {
        Ok(self.warps.clone())
    }

    fn save_warp(&mut self, id: WarpId, record: &WarpRecord) -> Result<(), StoreError> {
        match self.warps.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, slot)) => *slot = record.clone(),
            None => self.warps.push((id, record.clone())),
        }
        Ok(())
    }

    fn delete_warp(&mut self, id: WarpId) -> Result<(), StoreError> {
        self.warps.retain(|(existing, _)| *existing != id);
        Ok(())
    }

    fn load_bans(&self) -> Result<BanMap, StoreError> {
        Ok(self.bans.clone())
    }

    fn save_bans(&mut self, bans: &BanMap) -> Result<(), StoreError> {
        self.bans = bans
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(owner, set)| (*owner, set.clone()))
            .collect();
        Ok(())
    }
}
