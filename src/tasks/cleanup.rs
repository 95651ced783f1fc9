//! Expired-Entry Sweep Task
//!
//! Background task that periodically removes expired cache entries of
//! every region.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::facade::RegionCacheFacade;

/// Spawns a background task that periodically sweeps expired entries.
///
/// Reads purge expired entries lazily; this sweep reclaims storage for keys
/// nobody asks for again. It only needs a read lock since the sweep works on
/// storage directly.
///
/// # Arguments
/// * `cache` - shared reference to the facade
/// * `sweep_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_sweep_task(
    cache: Arc<RwLock<RegionCacheFacade>>,
    sweep_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(sweep_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting expired-entry sweep with interval of {} seconds",
            sweep_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let cache_guard = cache.read().await;
                cache_guard.clear_expired()
            };

            if removed > 0 {
                info!("Sweep: removed {} expired entries", removed);
            } else {
                debug!("Sweep: no expired entries found");
            }
        }
    })
}
