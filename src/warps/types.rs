use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::warps::errors::WarpError;
use crate::warps::location::{self, Location, LocationRecord};
use crate::warps::ports::WorldPort;

pub const WARP_SCHEMA_VERSION: u8 = 1;

/// Stable identity of a player.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for PlayerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Identifier assigned to a warp at creation. Never reused.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct WarpId(pub Uuid);

impl WarpId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for WarpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for WarpId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Display material for a warp. Purely cosmetic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    #[default]
    Compass,
    GrassBlock,
    Stone,
    OakLog,
    OakSapling,
    Chest,
    CraftingTable,
    Furnace,
    Anvil,
    Beacon,
    Bed,
    Book,
    Map,
    EnderPearl,
    Diamond,
    Emerald,
    GoldIngot,
    IronIngot,
    Wheat,
    FishingRod,
    Sand,
    Snowball,
    Netherrack,
    EndStone,
    PlayerHead,
}

impl Icon {
    pub const ALL: [Icon; 25] = [
        Icon::Compass,
        Icon::GrassBlock,
        Icon::Stone,
        Icon::OakLog,
        Icon::OakSapling,
        Icon::Chest,
        Icon::CraftingTable,
        Icon::Furnace,
        Icon::Anvil,
        Icon::Beacon,
        Icon::Bed,
        Icon::Book,
        Icon::Map,
        Icon::EnderPearl,
        Icon::Diamond,
        Icon::Emerald,
        Icon::GoldIngot,
        Icon::IronIngot,
        Icon::Wheat,
        Icon::FishingRod,
        Icon::Sand,
        Icon::Snowball,
        Icon::Netherrack,
        Icon::EndStone,
        Icon::PlayerHead,
    ];

    /// Upper snake case material name, e.g. `ENDER_PEARL`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Icon::Compass => "COMPASS",
            Icon::GrassBlock => "GRASS_BLOCK",
            Icon::Stone => "STONE",
            Icon::OakLog => "OAK_LOG",
            Icon::OakSapling => "OAK_SAPLING",
            Icon::Chest => "CHEST",
            Icon::CraftingTable => "CRAFTING_TABLE",
            Icon::Furnace => "FURNACE",
            Icon::Anvil => "ANVIL",
            Icon::Beacon => "BEACON",
            Icon::Bed => "BED",
            Icon::Book => "BOOK",
            Icon::Map => "MAP",
            Icon::EnderPearl => "ENDER_PEARL",
            Icon::Diamond => "DIAMOND",
            Icon::Emerald => "EMERALD",
            Icon::GoldIngot => "GOLD_INGOT",
            Icon::IronIngot => "IRON_INGOT",
            Icon::Wheat => "WHEAT",
            Icon::FishingRod => "FISHING_ROD",
            Icon::Sand => "SAND",
            Icon::Snowball => "SNOWBALL",
            Icon::Netherrack => "NETHERRACK",
            Icon::EndStone => "END_STONE",
            Icon::PlayerHead => "PLAYER_HEAD",
        }
    }
}

impl fmt::Display for Icon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Icon {
    type Err = WarpError;

    /// Case-insensitive; `ender_pearl`, `ENDER_PEARL` and `ender pearl` all resolve.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace([' ', '-'], "_").to_ascii_uppercase();
        Icon::ALL
            .iter()
            .copied()
            .find(|icon| icon.as_str() == wanted)
            .ok_or_else(|| WarpError::UnknownIcon(s.to_string()))
    }
}

/// Persisted shape of a warp. The warp id is the storage key, not a field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WarpRecord {
    pub name: String,
    pub creator: PlayerId,
    pub owner: PlayerId,
    #[serde(default)]
    pub description: Option<String>,
    pub icon: String,
    #[serde(default)]
    pub location: Option<LocationRecord>,
    pub visits: u64,
    pub created_at: DateTime<Utc>,
    pub schema_version: u8,
}

/// A named, ownable teleport destination.
#[derive(Debug, Clone, PartialEq)]
pub struct Warp {
    id: WarpId,
    name: String,
    owner: PlayerId,
    creator: PlayerId,
    description: Option<String>,
    icon: Icon,
    location: Option<Location>,
    visits: u64,
    created_at: DateTime<Utc>,
}

impl Warp {
    /// Build a fresh warp owned by its creator. The name is validated.
    pub fn new(
        id: WarpId,
        creator: PlayerId,
        name: &str,
        location: Option<Location>,
    ) -> Result<Self, WarpError> {
        Ok(Self {
            id,
            name: validate_name(name)?,
            owner: creator,
            creator,
            description: None,
            icon: Icon::default(),
            location: location.as_ref().and_then(location::normalize),
            visits: 0,
            created_at: Utc::now(),
        })
    }

    pub fn with_icon(mut self, icon: Icon) -> Self {
        self.icon = icon;
        self
    }

    pub fn id(&self) -> WarpId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn creator(&self) -> PlayerId {
        self.creator
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn icon(&self) -> Icon {
        self.icon
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn visits(&self) -> u64 {
        self.visits
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn rename(&mut self, new_name: &str) -> Result<(), WarpError> {
        self.name = validate_name(new_name)?;
        Ok(())
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub fn set_icon(&mut self, material_name: &str) -> Result<(), WarpError> {
        self.icon = material_name.parse()?;
        Ok(())
    }

    /// Stored at block precision, like every persisted location.
    pub fn relocate(&mut self, location: Option<Location>) {
        self.location = location.as_ref().and_then(location::normalize);
    }

    pub(crate) fn set_owner(&mut self, owner: PlayerId) {
        self.owner = owner;
    }

    pub fn increment_visits(&mut self) {
        self.visits = self.visits.saturating_add(1);
    }

    pub fn reset_visits(&mut self) {
        self.visits = 0;
    }

    /// Ground-presence heuristic: the block beneath the target must not be air.
    /// No collision or headroom checks.
    pub fn is_safe_to_teleport<W: WorldPort + ?Sized>(&self, world: &W) -> bool {
        match &self.location {
            None => false,
            Some(location) => !world.is_air(&location.below()),
        }
    }

    pub fn to_record(&self) -> WarpRecord {
        WarpRecord {
            name: self.name.clone(),
            creator: self.creator,
            owner: self.owner,
            description: self.description.clone(),
            icon: self.icon.as_str().to_string(),
            location: self.location.as_ref().map(location::encode),
            visits: self.visits,
            created_at: self.created_at,
            schema_version: WARP_SCHEMA_VERSION,
        }
    }

    /// Rebuild a warp from storage. Unknown icons fall back to the default so a
    /// single bad record never hides a warp.
    pub fn from_record(id: WarpId, record: WarpRecord) -> Self {
        let icon = record.icon.parse().unwrap_or_else(|_| {
            log::warn!(
                "warp {} has unknown icon '{}', using {}",
                id,
                crate::logutil::escape_log(&record.icon),
                Icon::default()
            );
            Icon::default()
        });
        Self {
            id,
            name: record.name,
            owner: record.owner,
            creator: record.creator,
            description: record.description,
            icon,
            location: record.location.as_ref().and_then(location::decode),
            visits: record.visits,
            created_at: record.created_at,
        }
    }
}

fn validate_name(name: &str) -> Result<String, WarpError> {
    if name.trim().is_empty() {
        return Err(WarpError::InvalidName);
    }
    Ok(name.to_string())
}
