//! Integration tests for the sled-backed warp store across restarts.
use playerwarps::warps::{
    Capability, EconomyPort, Icon, Location, LocationRecord, PlayerId, SledWarpStore,
    SledWarpStoreBuilder, StoreError, WarpError, WarpRegistry, WarpStore, WorldPort,
    WARP_SCHEMA_VERSION,
};
use std::time::Duration;
use tempfile::TempDir;

struct Free;

impl EconomyPort for Free {
    fn balance(&self, _player: PlayerId) -> i64 {
        0
    }
    fn debit(&mut self, _player: PlayerId, _amount: i64) -> Result<(), WarpError> {
        Ok(())
    }
    fn has_permission(&self, _player: PlayerId, _capability: Capability) -> bool {
        false
    }
    fn warp_creation_cost(&self, _player: PlayerId, _owned: usize) -> i64 {
        0
    }
    fn max_warps_allowed(&self) -> usize {
        10
    }
}

struct Solid;

impl WorldPort for Solid {
    fn is_air(&self, _location: &Location) -> bool {
        false
    }
    fn teleport(&mut self, _player: PlayerId, _location: &Location) -> Result<(), String> {
        Ok(())
    }
}

fn open(dir: &TempDir) -> WarpRegistry<SledWarpStore> {
    let store = SledWarpStoreBuilder::new(dir.path().join("warps"))
        .open()
        .expect("store");
    WarpRegistry::open(store).expect("registry")
}

#[test]
fn warps_bans_and_counts_survive_reopen() {
    let dir = TempDir::new().expect("tempdir");
    let owner = PlayerId::new_v4();
    let heir = PlayerId::new_v4();
    let visitor = PlayerId::new_v4();
    let banned = PlayerId::new_v4();

    let (first, second) = {
        let mut reg = open(&dir);
        let first = reg
            .create(owner, "alpha", Location::new("world", 10.7, 70.2, -5.5, 12.5, -90.0), &mut Free, &Solid)
            .unwrap();
        std::thread::sleep(Duration::from_millis(5));
        let second = reg
            .create(owner, "beta", Location::new("nether", 1.0, 40.0, 1.0, 0.0, 0.0), &mut Free, &Solid)
            .unwrap();
        reg.set_description(first.id(), Some("first warp".into())).unwrap();
        reg.set_icon(first.id(), "beacon").unwrap();
        reg.register_visit(first.id(), visitor).unwrap();
        reg.transfer_ownership(second.id(), heir).unwrap();
        reg.ban(owner, banned).unwrap();
        (first.id(), second.id())
    };

    let mut reg = open(&dir);
    assert_eq!(reg.len(), 2);
    let names: Vec<String> = reg.list_all().iter().map(|w| w.name().to_string()).collect();
    assert_eq!(names, vec!["alpha", "beta"]);

    let alpha = reg.find_by_id(first).unwrap();
    assert_eq!(alpha.visits(), 1);
    assert_eq!(alpha.description(), Some("first warp"));
    assert_eq!(alpha.icon(), Icon::Beacon);
    let loc = alpha.location().unwrap();
    // positions are stored at block precision
    assert_eq!((loc.world.as_str(), loc.x, loc.y, loc.z), ("world", 10.0, 70.0, -6.0));
    assert_eq!((loc.pitch, loc.yaw), (12.5, -90.0));

    let beta = reg.find_by_id(second).unwrap();
    assert_eq!(beta.owner(), heir);
    assert_eq!(beta.creator(), owner);

    assert!(reg.is_banned(owner, banned));
    // the dedup window starts empty after a restart
    assert!(!reg.has_visited(first, visitor));
    assert!(reg.register_visit(first, visitor).unwrap());
    assert_eq!(reg.find_by_id(first).unwrap().visits(), 2);
}

#[test]
fn removals_and_unbans_are_durable() {
    let dir = TempDir::new().expect("tempdir");
    let owner = PlayerId::new_v4();
    let target = PlayerId::new_v4();
    {
        let mut reg = open(&dir);
        reg.create(owner, "gone", Location::new("world", 0.0, 64.0, 0.0, 0.0, 0.0), &mut Free, &Solid)
            .unwrap();
        reg.ban(owner, target).unwrap();
    }
    {
        let mut reg = open(&dir);
        assert!(reg.remove_owned(owner, "gone").unwrap());
        assert!(reg.unban(owner, target).unwrap());
    }
    let reg = open(&dir);
    assert!(reg.is_empty());
    assert!(!reg.is_banned(owner, target));
    assert!(reg.store().load_bans().unwrap().is_empty());
    assert_eq!(reg.store().warp_count(), 0);
}

#[test]
fn records_without_world_load_without_location() {
    let dir = TempDir::new().expect("tempdir");
    let owner = PlayerId::new_v4();
    let id = playerwarps::warps::WarpId::new_v4();
    {
        let mut store = SledWarpStore::open(dir.path().join("warps")).unwrap();
        let record = playerwarps::warps::WarpRecord {
            name: "orphan".into(),
            creator: owner,
            owner,
            description: None,
            icon: "NOT_AN_ICON".into(),
            location: Some(LocationRecord {
                world: None,
                x: 1,
                y: 2,
                z: 3,
                pitch: 0.0,
                yaw: 0.0,
            }),
            visits: 7,
            created_at: chrono::Utc::now(),
            schema_version: WARP_SCHEMA_VERSION,
        };
        store.save_warp(id, &record).unwrap();
    }
    let reg = open(&dir);
    let warp = reg.find_by_id(id).unwrap();
    assert!(warp.location().is_none());
    assert_eq!(warp.icon(), Icon::default());
    assert_eq!(warp.visits(), 7);
}

#[test]
fn unknown_schema_versions_are_refused() {
    let dir = TempDir::new().expect("tempdir");
    let owner = PlayerId::new_v4();
    {
        let mut store = SledWarpStore::open(dir.path().join("warps")).unwrap();
        let record = playerwarps::warps::WarpRecord {
            name: "future".into(),
            creator: owner,
            owner,
            description: None,
            icon: "COMPASS".into(),
            location: None,
            visits: 0,
            created_at: chrono::Utc::now(),
            schema_version: WARP_SCHEMA_VERSION + 1,
        };
        store
            .save_warp(playerwarps::warps::WarpId::new_v4(), &record)
            .unwrap();
    }
    let store = SledWarpStore::open(dir.path().join("warps")).unwrap();
    assert!(matches!(
        WarpRegistry::open(store),
        Err(WarpError::Storage(StoreError::SchemaMismatch { entity: "warp", .. }))
    ));
}

#[test]
fn temporary_stores_work_like_regular_ones() {
    let dir = TempDir::new().expect("tempdir");
    let store = SledWarpStoreBuilder::new(dir.path().join("scratch"))
        .temporary()
        .open()
        .expect("store");
    let mut reg = WarpRegistry::open(store).unwrap();
    let owner = PlayerId::new_v4();
    reg.create(owner, "tmp", Location::new("world", 0.0, 64.0, 0.0, 0.0, 0.0), &mut Free, &Solid)
        .unwrap();
    assert_eq!(reg.store().warp_count(), 1);
    assert_eq!(reg.store().load_all_warps().unwrap()[0].1.name, "tmp");
}

#[test]
fn live_locations_match_reloaded_ones() {
    let dir = TempDir::new().expect("tempdir");
    let owner = PlayerId::new_v4();
    let (hub, moved, live_hub, live_moved) = {
        let mut reg = open(&dir);
        let hub = reg
            .create(owner, "hub", Location::new("world", 12.5, 65.0, -3.5, 10.0, 45.0), &mut Free, &Solid)
            .unwrap();
        let moved = reg
            .create(owner, "moved", Location::new("world", 0.0, 64.0, 0.0, 0.0, 0.0), &mut Free, &Solid)
            .unwrap();
        let relocated = reg
            .relocate(moved.id(), Some(Location::new("", 3.9, 70.0, 3.9, 0.0, 0.0)))
            .unwrap();
        assert!(relocated.location().is_none());
        (
            hub.id(),
            moved.id(),
            hub.location().cloned(),
            relocated.location().cloned(),
        )
    };
    assert_eq!(
        live_hub,
        Some(Location::new("world", 12.0, 65.0, -4.0, 10.0, 45.0))
    );

    let reg = open(&dir);
    assert_eq!(reg.find_by_id(hub).unwrap().location().cloned(), live_hub);
    assert_eq!(reg.find_by_id(moved).unwrap().location().cloned(), live_moved);
}

#[test]
fn worldless_locations_cannot_be_created() {
    let dir = TempDir::new().expect("tempdir");
    let mut reg = open(&dir);
    assert!(matches!(
        reg.create(PlayerId::new_v4(), "nowhere", Location::new("", 1.0, 65.0, 1.0, 0.0, 0.0), &mut Free, &Solid),
        Err(WarpError::UnsafeLocation)
    ));
    assert!(reg.is_empty());
}
