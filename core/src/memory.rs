//! Memory Budget
//!
//! `MemorySentry` tracks the bytes held by cached resources across a render
//! session and asks registered `MemoryMonitored` objects to release memory
//! when the total exceeds a ceiling. The sentry only holds weak references, so
//! monitored objects can be dropped at any time; dead entries are pruned
//! during the next eviction walk.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// An object holding memory it can release on request.
pub trait MemoryMonitored: Send + Sync {
    /// Releases as much cached memory as possible and returns the number of
    /// bytes freed. Returning 0 is valid. Must not call back into the
    /// sentry's eviction.
    fn zap_memory(&self) -> u64;
}

/// Registered objects and the position of the round-robin eviction cursor.
struct ManagedList {
    /// Weak references to monitored objects.
    entries: Vec<Weak<dyn MemoryMonitored>>,

    /// Index of the next entry to ask for memory.
    cursor: usize,
}

/// Coordinates a memory budget shared between monitored objects.
pub struct MemorySentry {
    /// Budget in bytes.
    max_memory: i64,

    /// Sum of every change reported. A free can be reported before the
    /// matching allocation, so this may dip below zero for a moment.
    total_memory: AtomicI64,

    /// Registered objects. Never locked while calling `zap_memory()`.
    managed: Mutex<ManagedList>,

    /// Set while an eviction walk is running.
    evicting: AtomicBool,
}

impl MemorySentry {
    /// Creates a new sentry.
    ///
    /// * `max_memory` - Budget in bytes.
    pub fn new(max_memory: i64) -> Self {
        Self {
            max_memory,
            total_memory: AtomicI64::new(0),
            managed: Mutex::new(ManagedList {
                entries: Vec::new(),
                cursor: 0,
            }),
            evicting: AtomicBool::new(false),
        }
    }

    /// Returns the budget in bytes.
    pub fn max_memory(&self) -> i64 {
        self.max_memory
    }

    /// Returns the bytes currently reported; never negative.
    pub fn total_memory(&self) -> i64 {
        self.total_memory.load(Ordering::SeqCst).max(0)
    }

    /// Returns the number of registered entries, including any dead ones not
    /// yet pruned.
    pub fn num_managed(&self) -> usize {
        self.managed.lock().map(|m| m.entries.len()).unwrap_or(0)
    }

    /// Registers an object to be asked for memory when over budget.
    /// Registering an object twice is allowed.
    ///
    /// * `obj` - The object.
    pub fn register_as_managed(&self, obj: &Arc<dyn MemoryMonitored>) {
        match self.managed.lock() {
            Ok(mut managed) => managed.entries.push(Arc::downgrade(obj)),
            Err(_) => error!("Memory sentry list poisoned; object not registered"),
        }
    }

    /// Adds to the reported total (negative values for frees). If the total
    /// exceeds the budget, walks the registered objects once, round-robin from
    /// where the previous walk stopped, asking each to zap memory until the
    /// total is back under budget.
    ///
    /// * `n` - Change in bytes.
    pub fn increment_total_memory(&self, n: i64) {
        let total = self.total_memory.fetch_add(n, Ordering::SeqCst) + n;
        if total > self.max_memory {
            self.evict(total);
        }
    }

    /// Runs one eviction walk unless another thread is already doing so.
    ///
    /// * `total` - Total that triggered the walk.
    fn evict(&self, total: i64) {
        if self.evicting.swap(true, Ordering::AcqRel) {
            return;
        }

        warn!(
            "Texture memory {} bytes exceeds budget of {} bytes; releasing cached data",
            total, self.max_memory
        );

        // Snapshot live entries, pruning dead ones, then release the lock
        // before calling into monitored objects.
        let (live, start) = match self.managed.lock() {
            Ok(mut managed) => {
                managed.entries.retain(|w| w.strong_count() > 0);
                let live: Vec<Arc<dyn MemoryMonitored>> =
                    managed.entries.iter().filter_map(|w| w.upgrade()).collect();
                let start = if live.is_empty() {
                    0
                } else {
                    managed.cursor % live.len()
                };
                (live, start)
            }
            Err(_) => {
                error!("Memory sentry list poisoned; skipping eviction");
                self.evicting.store(false, Ordering::Release);
                return;
            }
        };

        let n = live.len();
        let mut idx = start;
        let mut visited = 0;
        let mut freed_total = 0;
        while visited < n && self.total_memory() > self.max_memory {
            let freed = live[idx].zap_memory();
            freed_total += freed;
            self.total_memory.fetch_sub(freed as i64, Ordering::SeqCst);
            idx = (idx + 1) % n;
            visited += 1;
        }
        debug!(
            "Eviction visited {visited} of {n} objects, freed {freed_total} bytes, total now {}",
            self.total_memory()
        );

        if let Ok(mut managed) = self.managed.lock() {
            managed.cursor = idx;
        }
        self.evicting.store(false, Ordering::Release);

        // Entries only kept alive by the snapshot are released here, outside
        // every lock.
        drop(live);
    }
}

/// Per-object memory accounting that forwards changes to a sentry, if the
/// sentry is still alive.
#[derive(Default)]
pub struct MemoryReporter {
    /// Sentry to report to.
    sentry: Option<Weak<MemorySentry>>,

    /// Bytes currently held by the owning object.
    usage: AtomicI64,
}

impl MemoryReporter {
    /// Creates a reporter.
    ///
    /// * `sentry` - Sentry to report to, if any.
    pub fn new(sentry: Option<&Arc<MemorySentry>>) -> Self {
        Self {
            sentry: sentry.map(Arc::downgrade),
            usage: AtomicI64::new(0),
        }
    }

    /// Returns the sentry if it is still alive.
    pub fn sentry(&self) -> Option<Arc<MemorySentry>> {
        self.sentry.as_ref().and_then(|s| s.upgrade())
    }

    /// Returns the bytes currently held.
    pub fn memory_usage(&self) -> i64 {
        self.usage.load(Ordering::SeqCst)
    }

    /// Records a change in held memory and forwards it to the sentry. May
    /// trigger an eviction walk, so callers must not hold locks that their own
    /// `zap_memory()` needs.
    ///
    /// * `n` - Change in bytes.
    pub fn increment_memory_usage(&self, n: i64) {
        self.usage.fetch_add(n, Ordering::SeqCst);
        if let Some(sentry) = self.sentry() {
            sentry.increment_total_memory(n);
        }
    }

    /// Records memory released during `zap_memory()`. The sentry subtracts
    /// the zapped bytes itself, so nothing is forwarded.
    ///
    /// * `n` - Bytes released.
    pub fn record_zapped(&self, n: i64) {
        self.usage.fetch_sub(n, Ordering::SeqCst);
    }
}

impl Drop for MemoryReporter {
    /// Reports all remaining usage as freed.
    fn drop(&mut self) {
        let usage = *self.usage.get_mut();
        if usage != 0 {
            if let Some(sentry) = self.sentry() {
                sentry.increment_total_memory(-usage);
            }
        }
    }
}
