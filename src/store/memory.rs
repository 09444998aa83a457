//! In-memory TTL store implementation

use super::config::StoreConfig;
use super::entry::Entry;
use super::error::StoreError;
use super::Store;
use siphasher::sip::SipHasher13;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use std::sync::{Arc, RwLock, Weak};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info};

/// Type alias for our hash map with SipHasher
type StoreMap = HashMap<String, Entry, BuildHasherDefault<SipHasher13>>;

/// State shared between store handles and the sweep task
struct Inner {
    /// The main storage map, guarded by a single reader/writer lock
    items: RwLock<StoreMap>,

    /// Time to live applied to every insert
    expiration: Duration,

    /// Signals the sweep task to stop
    shutdown_tx: watch::Sender<bool>,
}

impl Inner {
    /// Evict every expired entry, returns the number removed
    ///
    /// The clock is sampled once per pass; every entry is checked against
    /// that single instant.
    fn remove_expired(&self) -> usize {
        let now = Instant::now();
        let mut items = self.items.write().expect("store lock poisoned");
        let before = items.len();
        items.retain(|_, entry| !entry.is_expired_at(now));
        before - items.len()
    }
}

/// In-memory store for short-lived challenge answers
///
/// Holds answers keyed by an opaque id supplied by the caller. Every insert
/// stamps the entry with `now + expiration`; a background sweep task evicts
/// entries past that stamp so unread answers cannot accumulate.
///
/// Reads that observe an expired entry report [`StoreError::Expired`] but
/// leave the entry in place; only the sweep or a later consuming read
/// removes it.
///
/// Handles are cheap to clone and share one map. The sweep task stops when
/// [`MemoryStore::shutdown`] is called or when the last handle is dropped.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Create a store with default configuration
    ///
    /// Requires a running tokio runtime for the sweep task.
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config(StoreConfig::default())
    }

    /// Create a store with the given configuration and start its sweep task
    pub fn with_config(config: StoreConfig) -> anyhow::Result<Self> {
        config.validate()?;

        if tokio::runtime::Handle::try_current().is_err() {
            anyhow::bail!("MemoryStore requires a tokio runtime for its sweep task");
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let inner = Arc::new(Inner {
            items: RwLock::new(HashMap::with_capacity_and_hasher(
                1024,
                BuildHasherDefault::<SipHasher13>::default(),
            )),
            expiration: config.expiration,
            shutdown_tx,
        });

        // The task holds only a weak reference so it cannot keep the store
        // alive on its own
        tokio::spawn(sweep_loop(
            Arc::downgrade(&inner),
            config.sweep_interval,
            shutdown_rx,
        ));

        info!(
            "Memory store started (expiration {:?}, sweep every {:?})",
            config.expiration, config.sweep_interval
        );

        Ok(MemoryStore { inner })
    }

    /// Insert or replace the answer for `id`
    ///
    /// Any prior entry for the same id is discarded and the expiration is
    /// recomputed from the moment of this call. Cannot fail.
    pub fn set(&self, id: &str, value: &str) {
        let entry = Entry::new(value, self.inner.expiration);
        let mut items = self.inner.items.write().expect("store lock poisoned");
        items.insert(id.to_string(), entry);
    }

    /// Look up the answer for `id`
    ///
    /// With `consume` set, a successful lookup also removes the entry in
    /// the same critical section, enforcing single use. An expired entry is
    /// reported as [`StoreError::Expired`] and left in place on both paths.
    pub fn get(&self, id: &str, consume: bool) -> Result<String, StoreError> {
        if consume {
            let mut items = self.inner.items.write().expect("store lock poisoned");
            let value = lookup(&items, id)?.value.clone();
            items.remove(id);
            return Ok(value);
        }

        let items = self.inner.items.read().expect("store lock poisoned");
        Ok(lookup(&items, id)?.value.clone())
    }

    /// Stop the background sweep task
    ///
    /// Idempotent. The store remains readable and writable afterwards, but
    /// expired entries are only removed by consuming reads.
    pub fn shutdown(&self) {
        info!("Memory store shutting down sweep task");
        let _ = self.inner.shutdown_tx.send(true);
    }

    /// Number of entries currently held, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.inner.items.read().expect("store lock poisoned").len()
    }

    /// Check if the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Store for MemoryStore {
    fn set(&self, id: &str, value: &str) -> Result<(), StoreError> {
        MemoryStore::set(self, id, value);
        Ok(())
    }

    fn get(&self, id: &str, consume: bool) -> Result<String, StoreError> {
        MemoryStore::get(self, id, consume)
    }
}

/// Lookup and expiry check shared by the consuming and non-consuming paths
fn lookup<'a>(items: &'a StoreMap, id: &str) -> Result<&'a Entry, StoreError> {
    let entry = items.get(id).ok_or(StoreError::NotFound)?;
    if entry.is_expired() {
        return Err(StoreError::Expired);
    }
    Ok(entry)
}

/// Background task that periodically evicts expired entries
///
/// Runs until told to stop, until the sender side of the shutdown channel
/// disappears with the store, or until the weak reference no longer
/// upgrades.
async fn sweep_loop(inner: Weak<Inner>, interval: Duration, mut shutdown_rx: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(interval);
    // Consume the immediate first tick; the first pass waits a full interval
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                let removed = inner.remove_expired();
                if removed > 0 {
                    debug!("Sweep evicted {} expired entries", removed);
                }
            }
            changed = shutdown_rx.changed() => {
                // An error means the store itself is gone
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    debug!("Sweep task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn short_config(expiration_ms: u64, sweep_ms: u64) -> StoreConfig {
        StoreConfig {
            expiration: Duration::from_millis(expiration_ms),
            sweep_interval: Duration::from_millis(sweep_ms),
        }
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = MemoryStore::new().unwrap();
        store.set("c1", "424242");

        assert_eq!(store.get("c1", false).unwrap(), "424242");
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let store = MemoryStore::new().unwrap();

        assert_eq!(store.get("missing", false), Err(StoreError::NotFound));
        assert_eq!(store.get("missing", true), Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_non_consuming_get_is_repeatable() {
        let store = MemoryStore::new().unwrap();
        store.set("c1", "424242");

        assert_eq!(store.get("c1", false).unwrap(), "424242");
        assert_eq!(store.get("c1", false).unwrap(), "424242");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_consume_removes_entry() {
        let store = MemoryStore::new().unwrap();
        store.set("c1", "424242");

        assert_eq!(store.get("c1", true).unwrap(), "424242");
        assert_eq!(store.get("c1", false), Err(StoreError::NotFound));
        assert_eq!(store.get("c1", true), Err(StoreError::NotFound));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value() {
        let store = MemoryStore::new().unwrap();
        store.set("c1", "first");
        store.set("c1", "second");

        assert_eq!(store.get("c1", false).unwrap(), "second");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_reported_and_left_in_place() {
        // Sweep interval far in the future so only the reads are observed
        let store = MemoryStore::with_config(short_config(1, 60_000)).unwrap();
        store.set("c1", "424242");
        sleep(Duration::from_millis(10)).await;

        assert_eq!(store.get("c1", false), Err(StoreError::Expired));
        assert_eq!(store.len(), 1);

        // The consuming path reports the same error and also leaves the
        // entry for the sweep
        assert_eq!(store.get("c1", true), Err(StoreError::Expired));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_overwrite_resets_expiration() {
        let store = MemoryStore::with_config(short_config(150, 60_000)).unwrap();
        store.set("c1", "first");
        sleep(Duration::from_millis(100)).await;

        // Rewriting restarts the clock, so the entry outlives the original
        // deadline
        store.set("c1", "second");
        sleep(Duration::from_millis(100)).await;

        assert_eq!(store.get("c1", false).unwrap(), "second");
    }

    #[tokio::test]
    async fn test_sweep_evicts_unread_entries() {
        let store = MemoryStore::with_config(short_config(1, 5)).unwrap();
        store.set("c1", "424242");

        // Never read; the sweep alone must clear it
        sleep(Duration::from_millis(50)).await;
        assert_eq!(store.len(), 0);
        assert_eq!(store.get("c1", false), Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_sweep_keeps_live_entries() {
        let store = MemoryStore::with_config(short_config(60_000, 5)).unwrap();
        store.set("c1", "424242");

        sleep(Duration::from_millis(50)).await;
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("c1", false).unwrap(), "424242");
    }

    #[tokio::test]
    async fn test_shutdown_stops_sweep() {
        let store = MemoryStore::with_config(short_config(1, 5)).unwrap();
        store.set("c1", "424242");
        store.shutdown();

        // The entry expires but no sweep pass runs anymore
        sleep(Duration::from_millis(50)).await;
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("c1", false), Err(StoreError::Expired));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_disjoint_ids() {
        let store = MemoryStore::new().unwrap();

        let mut handles = Vec::new();
        for task in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..100 {
                    let id = format!("task{}-{}", task, i);
                    let value = format!("answer-{}-{}", task, i);
                    store.set(&id, &value);
                    assert_eq!(store.get(&id, false).unwrap(), value);
                    assert_eq!(store.get(&id, true).unwrap(), value);
                    assert_eq!(store.get(&id, false), Err(StoreError::NotFound));
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_usable_through_trait_object() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new().unwrap());
        store.set("c1", "424242").unwrap();
        assert_eq!(store.get("c1", true).unwrap(), "424242");
        assert_eq!(store.get("c1", false), Err(StoreError::NotFound));
    }

    #[test]
    fn test_construction_requires_runtime() {
        // No runtime in a plain test, construction must refuse rather than
        // panic inside tokio::spawn
        assert!(MemoryStore::new().is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = StoreConfig {
            expiration: Duration::ZERO,
            ..StoreConfig::default()
        };
        let result = tokio_test::block_on(async { MemoryStore::with_config(config) });
        assert!(result.is_err());
    }
}
