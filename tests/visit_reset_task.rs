//! The background reset task clears the visit window on period boundaries.
use playerwarps::warps::{
    spawn_visit_reset_task, MemoryWarpStore, PlayerId, Warp, WarpId, WarpRecord, WarpRegistry,
    WarpStore, VisitResetSchedule, WARP_SCHEMA_VERSION,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};

fn seeded_registry() -> (WarpRegistry<MemoryWarpStore>, WarpId) {
    let owner = PlayerId::new_v4();
    let id = WarpId::new_v4();
    let mut store = MemoryWarpStore::new();
    store
        .save_warp(
            id,
            &WarpRecord {
                name: "market".into(),
                creator: owner,
                owner,
                description: None,
                icon: "CHEST".into(),
                location: None,
                visits: 0,
                created_at: chrono::Utc::now(),
                schema_version: WARP_SCHEMA_VERSION,
            },
        )
        .unwrap();
    (WarpRegistry::open(store).unwrap(), id)
}

#[tokio::test]
async fn reset_task_reopens_the_window() {
    let (registry, warp) = seeded_registry();
    let registry = Arc::new(Mutex::new(registry));
    let visitor = PlayerId::new_v4();
    {
        let mut reg = registry.lock().await;
        assert!(reg.register_visit(warp, visitor).unwrap());
        assert!(!reg.register_visit(warp, visitor).unwrap());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = spawn_visit_reset_task(
        registry.clone(),
        VisitResetSchedule::new(Duration::from_millis(100)),
        Duration::from_millis(10),
        shutdown_rx,
    );

    let mut cleared = false;
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        if !registry.lock().await.has_visited(warp, visitor) {
            cleared = true;
            break;
        }
    }
    assert!(cleared, "visit window was never reset");

    {
        let mut reg = registry.lock().await;
        // counts are cumulative across periods
        assert_eq!(reg.find_by_id(warp).map(Warp::visits), Some(1));
        assert!(reg.register_visit(warp, visitor).unwrap());
        assert_eq!(reg.find_by_id(warp).map(Warp::visits), Some(2));
    }

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("task stops on shutdown")
        .unwrap();
}

#[tokio::test]
async fn dropping_the_sender_stops_the_task() {
    let (registry, _) = seeded_registry();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = spawn_visit_reset_task(
        Arc::new(Mutex::new(registry)),
        VisitResetSchedule::hourly(),
        Duration::from_millis(5),
        shutdown_rx,
    );
    drop(shutdown_tx);
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("task stops when sender is dropped")
        .unwrap();
}

#[tokio::test]
async fn zero_poll_interval_is_clamped() {
    let (registry, _) = seeded_registry();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = spawn_visit_reset_task(
        Arc::new(Mutex::new(registry)),
        VisitResetSchedule::new(Duration::ZERO),
        Duration::ZERO,
        shutdown_rx,
    );
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!handle.is_finished());
    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("task stops on shutdown")
        .unwrap();
}
