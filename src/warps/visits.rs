//! Visit deduplication and the periodic reset that reopens the window.
//!
//! A `(warp, visitor)` pair counts toward the warp's popularity at most once
//! per period. The registry owns the tracker; the host clears it on a fixed
//! wall-clock schedule, either by calling
//! [`WarpRegistry::clear_all_visits`](crate::warps::WarpRegistry::clear_all_visits)
//! itself or through [`spawn_visit_reset_task`].

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::warps::ports::WarpStore;
use crate::warps::registry::WarpRegistry;
use crate::warps::types::{PlayerId, WarpId};

/// Default dedup window.
pub const VISIT_PERIOD: Duration = Duration::from_secs(60 * 60);

/// Pairs that have already been counted in the current period.
#[derive(Debug, Default, Clone)]
pub struct VisitTracker {
    visited: HashSet<(WarpId, PlayerId)>,
}

impl VisitTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_visited(&self, warp: WarpId, visitor: PlayerId) -> bool {
        self.visited.contains(&(warp, visitor))
    }

    /// Moves the pair to "visited". Returns false if it already was.
    pub fn mark(&mut self, warp: WarpId, visitor: PlayerId) -> bool {
        self.visited.insert((warp, visitor))
    }

    pub(crate) fn unmark(&mut self, warp: WarpId, visitor: PlayerId) {
        self.visited.remove(&(warp, visitor));
    }

    /// Drop every pair for a warp that no longer exists.
    pub(crate) fn forget_warp(&mut self, warp: WarpId) {
        self.visited.retain(|(w, _)| *w != warp);
    }

    /// Returns how many pairs were cleared.
    pub fn clear(&mut self) -> usize {
        let cleared = self.visited.len();
        self.visited.clear();
        cleared
    }

    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }
}

/// Detects wall-clock period boundaries. Periods are aligned to multiples of
/// the period length since the Unix epoch, so an hourly period resets at the
/// top of every UTC hour.
#[derive(Debug, Clone)]
pub struct VisitResetSchedule {
    period: Duration,
    last_period_index: Option<i64>,
}

impl VisitResetSchedule {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            last_period_index: None,
        }
    }

    pub fn hourly() -> Self {
        Self::new(VISIT_PERIOD)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    fn period_index(&self, now: &DateTime<Utc>) -> i64 {
        now.timestamp_millis()
            .div_euclid(self.period.as_millis() as i64)
    }

    /// True exactly once each time `now` has moved into a new period since the
    /// previous call. The first call only records the current period.
    pub fn boundary_crossed(&mut self, now: &DateTime<Utc>) -> bool {
        let index = self.period_index(now);
        match self.last_period_index.replace(index) {
            Some(previous) => previous != index,
            None => false,
        }
    }
}

impl Default for VisitResetSchedule {
    fn default() -> Self {
        Self::hourly()
    }
}

/// Clear the registry's visit window whenever the schedule crosses a
/// boundary. The registry is locked only for the clear itself, so resets never
/// interleave with other registry calls made through the same mutex.
///
/// The task exits when `shutdown` flips to true or its sender is dropped.
pub fn spawn_visit_reset_task<S>(
    registry: Arc<Mutex<WarpRegistry<S>>>,
    mut schedule: VisitResetSchedule,
    poll_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    S: WarpStore + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll_interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(
            "visit reset task started (period {:?}, poll {:?})",
            schedule.period(),
            poll_interval
        );
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if schedule.boundary_crossed(&Utc::now()) {
                        let cleared = registry.lock().await.clear_all_visits();
                        debug!("visit window reset, {} pair(s) cleared", cleared);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("visit reset task stopped");
    })
}
