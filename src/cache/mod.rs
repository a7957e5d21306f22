//! TTL cache for scan results.
//!
//! Request threads all want the same expensive, network-bound scan, so the
//! cache serializes computation per key: concurrent first-time callers for
//! one key trigger exactly one compute, while unrelated keys compute
//! concurrently and reads of a live value only take a read lock.
//!
//! The clock is injected so expiry is testable without sleeping.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};

use crate::core::errors::Result;

/// Time source for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock-backed [`Clock`] used outside of tests.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub hit_count: u64,
    pub miss_count: u64,
    pub entry_count: usize,
}

struct CacheRecord<V> {
    value: V,
    expires_at: Instant,
}

/// Keyed TTL cache with per-key compute serialization.
///
/// Values are cloned out on every read; store `Arc`s for large results so
/// all readers within one TTL window share a single instance.
pub struct TtlCache<V: Clone> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    records: RwLock<HashMap<String, CacheRecord<V>>>,
    /// One gate mutex per key, held for the duration of a compute.
    gates: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> TtlCache<V> {
    #[must_use]
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            records: RwLock::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn with_system_clock(ttl: Duration) -> Self {
        Self::new(ttl, Arc::new(SystemClock))
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    ///
    /// A hit is any call served without invoking `compute` — including a
    /// caller that lost the race and found the value already stored when it
    /// acquired the key's gate. On compute failure nothing is stored and the
    /// error propagates; the next caller retries from scratch.
    pub fn get_or_compute<F>(&self, key: &str, compute: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        self.get_or_compute_with_ttl(key, self.ttl, compute)
    }

    /// [`Self::get_or_compute`] with an explicit TTL for this entry.
    pub fn get_or_compute_with_ttl<F>(&self, key: &str, ttl: Duration, compute: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        if let Some(value) = self.live(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value);
        }

        let gate = self.gate(key);
        let _guard = gate.lock();

        // Double-checked: a racing caller may have stored the value while we
        // waited on the gate.
        if let Some(value) = self.live(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = compute()?;
        let expires_at = self.clock.now() + ttl;
        self.records.write().insert(
            key.to_string(),
            CacheRecord {
                value: value.clone(),
                expires_at,
            },
        );
        Ok(value)
    }

    /// Forcibly expire one key.
    pub fn invalidate(&self, key: &str) {
        self.records.write().remove(key);
    }

    /// Drop every record.
    pub fn clear(&self) {
        self.records.write().clear();
    }

    /// Drop records whose TTL has lapsed.
    pub fn prune_expired(&self) {
        let now = self.clock.now();
        self.records.write().retain(|_, rec| rec.expires_at > now);
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hit_count: self.hits.load(Ordering::Relaxed),
            miss_count: self.misses.load(Ordering::Relaxed),
            entry_count: self.records.read().len(),
        }
    }

    fn live(&self, key: &str) -> Option<V> {
        let records = self.records.read();
        let record = records.get(key)?;
        if record.expires_at <= self.clock.now() {
            return None;
        }
        Some(record.value.clone())
    }

    fn gate(&self, key: &str) -> Arc<Mutex<()>> {
        Arc::clone(
            self.gates
                .lock()
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }
}
