//! The authoritative warp registry.
//!
//! `WarpRegistry` owns every warp, the ban lists and the visit window, and is
//! the only writer to the [`WarpStore`]. Each mutation is applied to a copy,
//! written through to the store, and only then committed in memory, so a
//! failed write leaves the registry exactly as it was.
//!
//! The registry does no locking of its own. Hosts that share it between tasks
//! wrap it in a mutex (see [`spawn_visit_reset_task`](crate::warps::visits::spawn_visit_reset_task)).

use std::cmp::Ordering;
use std::collections::HashMap;

use log::{debug, info, warn};

use crate::logutil::escape_log;
use crate::warps::bans::BanList;
use crate::warps::errors::WarpError;
use crate::warps::location::Location;
use crate::warps::ports::{EconomyPort, PlayerDirectory, WarpStore, WorldPort};
use crate::warps::types::{Icon, PlayerId, Warp, WarpId};
use crate::warps::visits::VisitTracker;

/// Popularity order: more visits first. Equal counts compare equal, so a
/// stable sort over insertion order keeps older warps ahead.
pub fn compare_by_popularity(a: &Warp, b: &Warp) -> Ordering {
    b.visits().cmp(&a.visits())
}

pub struct WarpRegistry<S: WarpStore> {
    store: S,
    warps: HashMap<WarpId, Warp>,
    order: Vec<WarpId>,
    bans: BanList,
    visits: VisitTracker,
    default_icon: Icon,
}

impl<S: WarpStore> WarpRegistry<S> {
    /// Load every warp and ban from `store`. Warps are ordered by creation
    /// time, which restores insertion order across restarts.
    pub fn open(store: S) -> Result<Self, WarpError> {
        let mut records = store.load_all_warps()?;
        records.sort_by(|(a_id, a), (b_id, b)| {
            a.created_at.cmp(&b.created_at).then_with(|| a_id.cmp(b_id))
        });

        let mut warps = HashMap::with_capacity(records.len());
        let mut order = Vec::with_capacity(records.len());
        for (id, record) in records {
            order.push(id);
            warps.insert(id, Warp::from_record(id, record));
        }
        let bans = BanList::from_map(store.load_bans()?);
        info!(
            "warp registry loaded: {} warp(s), {} owner ban list(s)",
            order.len(),
            bans.as_map().len()
        );

        Ok(Self {
            store,
            warps,
            order,
            bans,
            visits: VisitTracker::new(),
            default_icon: Icon::default(),
        })
    }

    /// Icon given to warps created from now on.
    pub fn with_default_icon(mut self, icon: Icon) -> Self {
        self.default_icon = icon;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn find_by_id(&self, id: WarpId) -> Option<&Warp> {
        self.warps.get(&id)
    }

    /// If a transfer left an owner with two warps of the same name, the one
    /// created first wins.
    pub fn find_by_owner_and_name(&self, owner: PlayerId, name: &str) -> Option<&Warp> {
        self.iter().find(|w| w.owner() == owner && w.name() == name)
    }

    fn iter(&self) -> impl Iterator<Item = &Warp> + '_ {
        self.order.iter().filter_map(|id| self.warps.get(id))
    }

    /// Snapshot of every warp in insertion order.
    pub fn list_all(&self) -> Vec<Warp> {
        self.iter().cloned().collect()
    }

    pub fn list_by_owner(&self, owner: PlayerId) -> Vec<Warp> {
        self.iter().filter(|w| w.owner() == owner).cloned().collect()
    }

    /// All warps, most visited first.
    pub fn ranked(&self) -> Vec<Warp> {
        let mut list = self.list_all();
        list.sort_by(compare_by_popularity);
        list
    }

    pub fn count_owned(&self, owner: PlayerId) -> usize {
        self.iter().filter(|w| w.owner() == owner).count()
    }

    /// Distinct current owners, in order of their first warp.
    pub fn owner_ids(&self) -> Vec<PlayerId> {
        let mut owners: Vec<PlayerId> = Vec::new();
        for warp in self.iter() {
            if !owners.contains(&warp.owner()) {
                owners.push(warp.owner());
            }
        }
        owners
    }

    /// Create a warp for `creator` at `location` and charge them for it.
    ///
    /// Checks run in a fixed order: duplicate name, ground safety, quota,
    /// then funds. The record is written before the debit; if the debit fails
    /// the record is deleted again and the debit error is returned.
    pub fn create<E, W>(
        &mut self,
        creator: PlayerId,
        name: &str,
        location: Location,
        economy: &mut E,
        world: &W,
    ) -> Result<Warp, WarpError>
    where
        E: EconomyPort + ?Sized,
        W: WorldPort + ?Sized,
    {
        let warp = Warp::new(WarpId::new_v4(), creator, name, Some(location))?
            .with_icon(self.default_icon);

        if self.find_by_owner_and_name(creator, name).is_some() {
            return Err(WarpError::DuplicateName {
                name: name.to_string(),
            });
        }
        if !warp.is_safe_to_teleport(world) {
            return Err(WarpError::UnsafeLocation);
        }

        let owned = self.count_owned(creator);
        let max = economy.max_warps_allowed();
        if owned >= max {
            return Err(WarpError::QuotaExceeded { max });
        }

        let cost = economy.warp_creation_cost(creator, owned);
        let balance = economy.balance(creator);
        if cost > balance {
            return Err(WarpError::InsufficientFunds { cost, balance });
        }

        self.store.save_warp(warp.id(), &warp.to_record())?;
        if let Err(err) = economy.debit(creator, cost) {
            if let Err(cleanup) = self.store.delete_warp(warp.id()) {
                warn!(
                    "failed to roll back warp {} after debit error: {}",
                    warp.id(),
                    cleanup
                );
            }
            return Err(err);
        }

        info!(
            "warp created: {} '{}' by {} for {}",
            warp.id(),
            escape_log(warp.name()),
            creator,
            cost
        );
        self.order.push(warp.id());
        self.warps.insert(warp.id(), warp.clone());
        Ok(warp)
    }

    /// Delete `owner_name`'s warp called `warp_name`. Names the directory
    /// cannot resolve simply match nothing. No refund is issued.
    pub fn remove<D: PlayerDirectory + ?Sized>(
        &mut self,
        owner_name: &str,
        warp_name: &str,
        directory: &D,
    ) -> Result<bool, WarpError> {
        match directory.resolve(owner_name) {
            Some(owner) => self.remove_owned(owner, warp_name),
            None => {
                debug!("remove: unknown owner '{}'", escape_log(owner_name));
                Ok(false)
            }
        }
    }

    pub fn remove_owned(&mut self, owner: PlayerId, warp_name: &str) -> Result<bool, WarpError> {
        match self.find_by_owner_and_name(owner, warp_name).map(Warp::id) {
            Some(id) => self.remove_by_id(id),
            None => Ok(false),
        }
    }

    pub fn remove_by_id(&mut self, id: WarpId) -> Result<bool, WarpError> {
        if !self.warps.contains_key(&id) {
            return Ok(false);
        }
        self.store.delete_warp(id)?;
        if let Some(warp) = self.warps.remove(&id) {
            info!("warp removed: {} '{}'", id, escape_log(warp.name()));
        }
        self.order.retain(|existing| *existing != id);
        self.visits.forget_warp(id);
        Ok(true)
    }

    /// Hand management of a warp to another player. The creator, visit count
    /// and ban lists are left alone.
    pub fn transfer_ownership(
        &mut self,
        id: WarpId,
        new_owner: PlayerId,
    ) -> Result<Warp, WarpError> {
        let previous = self
            .find_by_id(id)
            .map(Warp::owner)
            .ok_or_else(|| WarpError::warp_not_found(id))?;
        let warp = self.update(id, |warp| {
            warp.set_owner(new_owner);
            Ok(())
        })?;
        info!("warp {} transferred from {} to {}", id, previous, new_owner);
        Ok(warp)
    }

    pub fn rename(&mut self, id: WarpId, new_name: &str) -> Result<Warp, WarpError> {
        let owner = self
            .find_by_id(id)
            .map(Warp::owner)
            .ok_or_else(|| WarpError::warp_not_found(id))?;
        if self
            .find_by_owner_and_name(owner, new_name)
            .is_some_and(|other| other.id() != id)
        {
            return Err(WarpError::DuplicateName {
                name: new_name.to_string(),
            });
        }
        self.update(id, |warp| warp.rename(new_name))
    }

    pub fn set_description(
        &mut self,
        id: WarpId,
        description: Option<String>,
    ) -> Result<Warp, WarpError> {
        self.update(id, |warp| {
            warp.set_description(description);
            Ok(())
        })
    }

    pub fn set_icon(&mut self, id: WarpId, material_name: &str) -> Result<Warp, WarpError> {
        self.update(id, |warp| warp.set_icon(material_name))
    }

    /// Move a warp. Safety is the caller's concern here.
    pub fn relocate(&mut self, id: WarpId, location: Option<Location>) -> Result<Warp, WarpError> {
        self.update(id, |warp| {
            warp.relocate(location);
            Ok(())
        })
    }

    pub fn reset_visits(&mut self, id: WarpId) -> Result<Warp, WarpError> {
        self.update(id, |warp| {
            warp.reset_visits();
            Ok(())
        })
    }

    /// Apply `change` to a copy of the warp, persist it, then commit.
    fn update<F>(&mut self, id: WarpId, change: F) -> Result<Warp, WarpError>
    where
        F: FnOnce(&mut Warp) -> Result<(), WarpError>,
    {
        let mut warp = self
            .find_by_id(id)
            .cloned()
            .ok_or_else(|| WarpError::warp_not_found(id))?;
        change(&mut warp)?;
        self.store.save_warp(id, &warp.to_record())?;
        self.warps.insert(id, warp.clone());
        Ok(warp)
    }

    /// Ban `target` from every warp `owner` has or will have. Returns whether
    /// anything changed.
    pub fn ban(&mut self, owner: PlayerId, target: PlayerId) -> Result<bool, WarpError> {
        let mut bans = self.bans.clone();
        if !bans.ban(owner, target) {
            return Ok(false);
        }
        self.store.save_bans(bans.as_map())?;
        self.bans = bans;
        info!(target: "security", "{} banned {} from their warps", owner, target);
        Ok(true)
    }

    pub fn unban(&mut self, owner: PlayerId, target: PlayerId) -> Result<bool, WarpError> {
        let mut bans = self.bans.clone();
        if !bans.unban(owner, target) {
            return Ok(false);
        }
        self.store.save_bans(bans.as_map())?;
        self.bans = bans;
        info!(target: "security", "{} unbanned {} from their warps", owner, target);
        Ok(true)
    }

    pub fn is_banned(&self, owner: PlayerId, target: PlayerId) -> bool {
        self.bans.is_banned(owner, target)
    }

    pub fn banned_ids(&self, owner: PlayerId) -> Vec<PlayerId> {
        self.bans.banned_ids(owner)
    }

    pub fn list_banned_names<D: PlayerDirectory + ?Sized>(
        &self,
        owner: PlayerId,
        directory: &D,
    ) -> Vec<String> {
        self.bans.list_banned_names(owner, directory)
    }

    pub fn has_visited(&self, id: WarpId, visitor: PlayerId) -> bool {
        self.visits.has_visited(id, visitor)
    }

    /// Count a visit unless this pair was already counted in the current
    /// period. Returns whether the visit counted.
    pub fn register_visit(&mut self, id: WarpId, visitor: PlayerId) -> Result<bool, WarpError> {
        if !self.warps.contains_key(&id) {
            return Err(WarpError::warp_not_found(id));
        }
        if !self.visits.mark(id, visitor) {
            return Ok(false);
        }
        match self.update(id, |warp| {
            warp.increment_visits();
            Ok(())
        }) {
            Ok(warp) => {
                debug!("visit counted: {} by {} (now {})", id, visitor, warp.visits());
                Ok(true)
            }
            Err(err) => {
                self.visits.unmark(id, visitor);
                Err(err)
            }
        }
    }

    /// Start a new visit period. Counts are untouched.
    pub fn clear_all_visits(&mut self) -> usize {
        self.visits.clear()
    }
}
