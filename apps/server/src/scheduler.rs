//! Background maintenance tasks of the server.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};

use crate::idempotency::IdempotencyCache;

/// Upper bound on the time between two idempotency cache sweeps.
const MAX_SWEEP_INTERVAL_SECS: u64 = 60;

/// Starts the periodic sweep of expired idempotency entries.
pub fn start_idempotency_eviction<V>(cache: Arc<IdempotencyCache<V>>) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    let period = cache
        .ttl()
        .min(Duration::from_secs(MAX_SWEEP_INTERVAL_SECS))
        .max(Duration::from_secs(1));

    tokio::spawn(async move {
        info!("Idempotency cache sweep started ({:?} interval)", period);
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let evicted = cache.evict_expired();
            if evicted > 0 {
                debug!(
                    "Evicted {} expired idempotency entries ({} remaining)",
                    evicted,
                    cache.len()
                );
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sweep_evicts_expired_entries() {
        let cache = Arc::new(IdempotencyCache::new(Duration::ZERO, 10));
        cache.insert("u1", "k1", 1u8);
        assert_eq!(cache.len(), 1);

        // The first tick fires immediately.
        let handle = start_idempotency_eviction(cache.clone());
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(cache.is_empty());
        handle.abort();
    }
}
