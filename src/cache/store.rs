//! Single-slot TTL cache used by the review orchestrator.
//!
//! Holds the most recent successful fetch for a fixed validity window.
//! Stale entries are ignored rather than evicted; the next successful
//! fetch overwrites them. A racing duplicate fetch under concurrency is
//! acceptable, so a plain `RwLock` around the slot is all the
//! coordination this needs.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use time::OffsetDateTime;
use tracing::warn;

/// Time source for the cache, injectable so tests can advance it.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
    }
}

struct Entry<T> {
    value: T,
    fetched_at_millis: i64,
}

/// At most one cached value, valid for `ttl` after the `set` that stored
/// it. Process lifetime; never persisted.
pub struct TimedCache<T> {
    slot: RwLock<Option<Entry<T>>>,
    ttl_millis: i64,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> TimedCache<T> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            slot: RwLock::new(None),
            ttl_millis: ttl.as_millis().min(i64::MAX as u128) as i64,
            clock,
        }
    }

    /// The stored value, if one exists and its validity window is open.
    /// Side-effect free.
    pub fn get(&self) -> Option<T> {
        let guard = self.read_slot();
        let entry = guard.as_ref()?;
        let age = self.clock.now_millis() - entry.fetched_at_millis;
        if age < self.ttl_millis {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    /// Overwrite the slot with `value`, timestamped now.
    pub fn set(&self, value: T) {
        let fetched_at_millis = self.clock.now_millis();
        *self.write_slot() = Some(Entry {
            value,
            fetched_at_millis,
        });
    }

    // A panic while the slot is held poisons the lock, but the slot
    // either holds the last complete entry or nothing; both are safe to
    // keep serving, so recover instead of propagating the poison.
    fn read_slot(&self) -> RwLockReadGuard<'_, Option<Entry<T>>> {
        self.slot.read().unwrap_or_else(|poisoned| {
            warn!(
                target = "printworks::cache",
                op = "get",
                "cache slot lock was poisoned, continuing with last entry"
            );
            poisoned.into_inner()
        })
    }

    fn write_slot(&self) -> RwLockWriteGuard<'_, Option<Entry<T>>> {
        self.slot.write().unwrap_or_else(|poisoned| {
            warn!(
                target = "printworks::cache",
                op = "set",
                "cache slot lock was poisoned, overwriting entry"
            );
            poisoned.into_inner()
        })
    }
}

#[cfg(test)]
pub(crate) mod test_clock {
    use std::sync::atomic::{AtomicI64, Ordering};

    use super::Clock;

    /// Manually advanced clock for TTL tests.
    #[derive(Debug, Default)]
    pub struct ManualClock {
        now: AtomicI64,
    }

    impl ManualClock {
        pub fn advance(&self, millis: i64) {
            self.now.fetch_add(millis, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_millis(&self) -> i64 {
            self.now.load(Ordering::SeqCst)
        }
    }
}
