//! Invalidating cache for Folio.
//!
//! [`InvalidatingCache`] holds a key/value map that is computed on demand by a
//! population callback and recomputed from scratch after every
//! [`invalidate`](InvalidatingCache::invalidate). It is the backing store for
//! ingested content: change notifications flip the cache to stale, and the
//! next reader pays for a full re-ingestion.
//!
//! # Thread Safety
//!
//! The cache is designed for concurrent access without external locking:
//! - Reads of a valid cache only take a shared lock to clone an `Arc`
//! - Population happens under the exclusive lock with double-checked validity,
//!   so racing readers never trigger duplicate population work
//! - `invalidate()` is lock-free (atomic epoch bump)
//!
//! Readers never observe a partially populated map: the backing map is
//! replaced wholesale, and only while no reader holds the shared lock.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use folio_cache::InvalidatingCache;
//!
//! let cache: InvalidatingCache<String, u32, String> = InvalidatingCache::new("demo", || {
//!     Ok(BTreeMap::from([("answer".to_owned(), 42)]))
//! });
//!
//! assert_eq!(cache.get_by_key(&"answer".to_owned()), Ok(Some(42)));
//! cache.invalidate();
//! assert!(!cache.is_valid());
//! assert_eq!(cache.get_all(), Ok(vec![42]));
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

/// Population callback producing the complete cache contents.
type PopulateFn<K, V, E> = dyn Fn() -> Result<BTreeMap<K, V>, E> + Send + Sync;

/// Lazily populated key/value store with invalidate-and-recompute semantics.
///
/// The cache starts stale. Every read operation ([`snapshot`](Self::snapshot),
/// [`get_all`](Self::get_all), [`get_by_key`](Self::get_by_key)) guarantees
/// the cache is populated first. Population is all-or-nothing: a failing
/// callback leaves the cache stale and the error is returned to the reader
/// that triggered it, so the next read retries.
pub struct InvalidatingCache<K, V, E> {
    name: String,
    populate: Box<PopulateFn<K, V, E>>,
    /// Current contents; the write lock doubles as the population lock.
    current: RwLock<Arc<BTreeMap<K, V>>>,
    /// Bumped by every invalidation.
    epoch: AtomicU64,
    /// Epoch the current contents were populated for.
    populated_epoch: AtomicU64,
}

impl<K, V, E> InvalidatingCache<K, V, E>
where
    K: Ord,
    V: Clone,
{
    /// Create a stale cache with the given population callback.
    ///
    /// # Arguments
    ///
    /// * `name` - Name used in log messages (e.g., the content set's URL)
    /// * `populate` - Callback computing the full cache contents
    pub fn new<F>(name: impl Into<String>, populate: F) -> Self
    where
        F: Fn() -> Result<BTreeMap<K, V>, E> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            populate: Box::new(populate),
            current: RwLock::new(Arc::new(BTreeMap::new())),
            epoch: AtomicU64::new(1),
            populated_epoch: AtomicU64::new(0),
        }
    }

    /// Cache name used in log messages.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check whether the current contents are up to date.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.populated_epoch.load(Ordering::Acquire) == self.epoch.load(Ordering::Acquire)
    }

    /// Mark the cache stale.
    ///
    /// Never blocks. The next read repopulates the cache; readers holding an
    /// earlier snapshot keep using it. An invalidation that arrives while a
    /// population is running leaves the cache stale once that population
    /// completes.
    pub fn invalidate(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        tracing::trace!(cache = %self.name, "Cache invalidated");
    }

    /// Get the complete current contents, populating first if stale.
    ///
    /// Uses double-checked locking:
    /// 1. Fast path: clone the current map under the shared lock if valid
    /// 2. Slow path: take the exclusive lock, recheck, then repopulate
    ///
    /// # Errors
    ///
    /// Returns the population callback's error. The cache stays stale.
    pub fn snapshot(&self) -> Result<Arc<BTreeMap<K, V>>, E> {
        {
            let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
            if self.is_valid() {
                return Ok(Arc::clone(&current));
            }
        }

        // Contents are only marked valid after a successful population, so a
        // lock poisoned by a panicking callback is safe to reuse.
        let mut current = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        // Double-check after acquiring lock
        if self.is_valid() {
            return Ok(Arc::clone(&current));
        }

        let epoch = self.epoch.load(Ordering::Acquire);
        *current = Arc::new(BTreeMap::new());

        let start = Instant::now();
        let entries = match (self.populate)() {
            Ok(entries) => Arc::new(entries),
            Err(e) => {
                tracing::warn!(cache = %self.name, "Cache population failed");
                return Err(e);
            }
        };

        *current = Arc::clone(&entries);
        self.populated_epoch.store(epoch, Ordering::Release);

        tracing::debug!(
            cache = %self.name,
            entries = entries.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Cache populated"
        );

        Ok(entries)
    }

    /// Get all values in key order, populating first if stale.
    ///
    /// # Errors
    ///
    /// Returns the population callback's error.
    pub fn get_all(&self) -> Result<Vec<V>, E> {
        Ok(self.snapshot()?.values().cloned().collect())
    }

    /// Get a single value by key, populating first if stale.
    ///
    /// # Errors
    ///
    /// Returns the population callback's error.
    pub fn get_by_key(&self, key: &K) -> Result<Option<V>, E> {
        Ok(self.snapshot()?.get(key).cloned())
    }
}
