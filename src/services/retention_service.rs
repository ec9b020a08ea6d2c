//! Retention sweep for abandoned checkouts
//!
//! Transactions that never confirm within the retention window are deleted
//! together with their sub-transactions. Runs hourly until shutdown.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::store::TransactionStore;

const RETENTION_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

pub fn start_retention_sweep(
    store: Arc<dyn TransactionStore>,
    retention: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(RETENTION_SWEEP_INTERVAL);
        let retention = chrono::Duration::from_std(retention)
            .unwrap_or_else(|_| chrono::Duration::hours(24));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let cutoff = Utc::now() - retention;
                    match store.delete_pending_before(cutoff).await {
                        Ok(0) => {}
                        Ok(removed) => {
                            info!("retention: removed {} expired pending transactions", removed)
                        }
                        Err(e) => warn!("retention: cleanup failed: {}", e),
                    }
                }
                _ = shutdown.changed() => {
                    debug!("retention sweep stopping");
                    return;
                }
            }
        }
    })
}
