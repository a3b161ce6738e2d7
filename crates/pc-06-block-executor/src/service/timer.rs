use super::manager::BlockManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Spawns the periodic mempool maintenance task.
///
/// Each tick prunes transactions that no longer apply to the preferred
/// block. The chain lock is blocking, so the pruning runs on the blocking
/// pool and the lock is released before the next tick is awaited.
pub fn spawn_maintenance_timer(manager: Arc<BlockManager>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let manager = manager.clone();
            let pruned = tokio::task::spawn_blocking(move || {
                let guard = manager.chain_lock().lock();
                manager.prune_mempool(&guard)
            })
            .await;
            match pruned {
                Ok(Ok(0)) => {}
                Ok(Ok(dropped)) => debug!(dropped, "Pruned mempool"),
                Ok(Err(e)) => warn!(error = %e, "Mempool maintenance failed"),
                Err(e) => warn!(error = %e, "Mempool maintenance task failed"),
            }
        }
    })
}
