//! Owner-scoped ban lists. A ban covers every warp the owner has now or
//! creates later.

use std::collections::BTreeSet;

use crate::warps::ports::{BanMap, PlayerDirectory};
use crate::warps::types::PlayerId;

/// Shown in place of a banned player's name when the directory cannot
/// resolve it.
pub const UNKNOWN_PLAYER_NAME: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BanList {
    entries: BanMap,
}

impl BanList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(entries: BanMap) -> Self {
        Self { entries }
    }

    pub fn as_map(&self) -> &BanMap {
        &self.entries
    }

    /// Returns true when the target was not already banned.
    pub fn ban(&mut self, owner: PlayerId, target: PlayerId) -> bool {
        self.entries.entry(owner).or_default().insert(target)
    }

    /// Returns true when the target had been banned.
    pub fn unban(&mut self, owner: PlayerId, target: PlayerId) -> bool {
        let Some(banned) = self.entries.get_mut(&owner) else {
            return false;
        };
        let removed = banned.remove(&target);
        if banned.is_empty() {
            self.entries.remove(&owner);
        }
        removed
    }

    pub fn is_banned(&self, owner: PlayerId, target: PlayerId) -> bool {
        self.entries
            .get(&owner)
            .is_some_and(|banned| banned.contains(&target))
    }

    pub fn banned_ids(&self, owner: PlayerId) -> Vec<PlayerId> {
        self.entries
            .get(&owner)
            .map(|banned| banned.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn list_banned_names<D: PlayerDirectory + ?Sized>(
        &self,
        owner: PlayerId,
        directory: &D,
    ) -> Vec<String> {
        self.entries
            .get(&owner)
            .map(BTreeSet::iter)
            .into_iter()
            .flatten()
            .map(|id| {
                directory
                    .display_name(*id)
                    .unwrap_or_else(|| UNKNOWN_PLAYER_NAME.to_string())
            })
            .collect()
    }
}
