//! Player warp registry and access policy.
//!
//! Players register named warps that others can teleport to. The registry
//! tracks ownership, charges for creation through the host economy, keeps
//! per-owner ban lists and ranks warps by deduplicated hourly visits.
//! Everything the registry needs from the host (storage, money, permissions,
//! the world) comes in through the traits in [`ports`].

pub mod bans;
pub mod errors;
pub mod location;
pub mod policy;
pub mod ports;
pub mod registry;
pub mod storage;
pub mod types;
pub mod visits;

pub use bans::{BanList, UNKNOWN_PLAYER_NAME};
pub use errors::{StoreError, WarpError};
pub use location::{Location, LocationRecord};
pub use policy::{
    ban_as, can_act_for, can_manage, remove_as, teleport, unban_as, TeleportRequest, VisitOutcome,
};
pub use ports::{
    BanMap, Capability, EconomyPort, PlayerDirectory, PriceTable, WarpStore, WorldPort,
};
pub use registry::{compare_by_popularity, WarpRegistry};
pub use storage::{MemoryWarpStore, SledWarpStore, SledWarpStoreBuilder};
pub use types::{Icon, PlayerId, Warp, WarpId, WarpRecord, WARP_SCHEMA_VERSION};
pub use visits::{spawn_visit_reset_task, VisitResetSchedule, VisitTracker, VISIT_PERIOD};
