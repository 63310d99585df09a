//! Collaborator interfaces the registry calls out to.
//!
//! The registry never touches files, balances, permissions or the world
//! directly; host integrations implement these traits.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::warps::errors::{StoreError, WarpError};
use crate::warps::location::Location;
use crate::warps::types::{PlayerId, WarpId, WarpRecord};

/// Ban state as stored: owner -> players they have banned.
pub type BanMap = HashMap<PlayerId, BTreeSet<PlayerId>>;

/// Persistence Port. Every write must be durable when the call returns.
pub trait WarpStore {
    fn load_all_warps(&self) -> Result<Vec<(WarpId, WarpRecord)>, StoreError>;
    fn save_warp(&mut self, id: WarpId, record: &WarpRecord) -> Result<(), StoreError>;
    fn delete_warp(&mut self, id: WarpId) -> Result<(), StoreError>;
    fn load_bans(&self) -> Result<BanMap, StoreError>;
    fn save_bans(&mut self, bans: &BanMap) -> Result<(), StoreError>;
}

/// Named capabilities checked through [`EconomyPort::has_permission`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Delete warps and manage bans on behalf of other owners.
    Staff,
    /// Edit warps owned by other players.
    StaffEdit,
    /// Teleport to warps that fail the ground check.
    BypassSafety,
    /// Teleport to warps whose owner has banned the requester.
    BypassBan,
}

impl Capability {
    pub fn node(&self) -> &'static str {
        match self {
            Capability::Staff => "warps.staff",
            Capability::StaffEdit => "warps.staff.edit",
            Capability::BypassSafety => "warps.bypass.safety",
            Capability::BypassBan => "warps.bypass.ban",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.node())
    }
}

/// Economy and permission subsystem of the host.
pub trait EconomyPort {
    fn balance(&self, player: PlayerId) -> i64;
    fn debit(&mut self, player: PlayerId, amount: i64) -> Result<(), WarpError>;
    fn has_permission(&self, player: PlayerId, capability: Capability) -> bool;
    /// Price of the player's next warp, given how many they already own.
    fn warp_creation_cost(&self, player: PlayerId, owned: usize) -> i64;
    fn max_warps_allowed(&self) -> usize;
}

/// Resolves identities to names and back for presentation and staff commands.
pub trait PlayerDirectory {
    fn display_name(&self, player: PlayerId) -> Option<String>;
    fn resolve(&self, name: &str) -> Option<PlayerId>;
}

/// World interaction: ground probing and the actual teleport.
pub trait WorldPort {
    fn is_air(&self, location: &Location) -> bool;
    fn teleport(&mut self, player: PlayerId, location: &Location) -> Result<(), String>;
}

/// Ascending warp prices: the Nth warp a player owns costs `prices[N - 1]`.
/// A player may own at most `prices.len()` warps.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PriceTable {
    prices: Vec<i64>,
}

impl PriceTable {
    pub fn new(prices: Vec<i64>) -> Self {
        Self { prices }
    }

    /// Cost of the next warp for someone who already owns `owned`, or `None`
    /// once the table is exhausted.
    pub fn cost_for(&self, owned: usize) -> Option<i64> {
        self.prices.get(owned).copied()
    }

    pub fn max_warps(&self) -> usize {
        self.prices.len()
    }

    /// Drop-in body for [`EconomyPort::warp_creation_cost`]. Past the end of
    /// the table the price is `i64::MAX`; `create` reports the quota first.
    pub fn creation_cost(&self, owned: usize) -> i64 {
        self.cost_for(owned).unwrap_or(i64::MAX)
    }
}
