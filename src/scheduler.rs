//! Sync triggers: once at startup, on a fixed interval, and on demand.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::api::mission_store::SharedMissionStore;
use crate::launches::SharedLaunchFeed;
use crate::sync::refresh_and_sync;

/// Run one refresh-and-sync before the server starts accepting requests.
pub async fn run_startup_sync(store: &SharedMissionStore, feed: &SharedLaunchFeed) {
    tracing::info!("Loading initial SpaceX data");
    refresh_and_sync(store.as_ref(), feed).await;
}

/// Spawn the periodic trigger. The first run happens one `period` from now.
pub fn spawn_periodic_sync(
    store: SharedMissionStore,
    feed: SharedLaunchFeed,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            tracing::info!("Running periodic mission update");
            refresh_and_sync(store.as_ref(), &feed).await;
        }
    })
}

/// Spawn a single detached refresh-and-sync run.
pub fn spawn_sync_run(store: SharedMissionStore, feed: SharedLaunchFeed) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Some(report) = refresh_and_sync(store.as_ref(), &feed).await {
            tracing::debug!("Manual mission update finished: {:?}", report);
        }
    })
}
