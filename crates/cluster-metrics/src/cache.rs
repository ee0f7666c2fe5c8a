//! The shared derived-metrics cache.
//!
//! One [`MetricsCache`] is shared by every watch loop. All mutation happens
//! through the [`CacheState`] guard returned by [`MetricsCache::lock`], so a
//! caller can bracket several steps (a full resync) into one atomic unit.
//! Dropping the guard releases the lock. The lock is only ever held across
//! in-memory work, never across I/O.

use crate::handlers::HandlerRegistry;
use crate::kind::{ClusterObject, ResourceIdentity};
use crate::record::DerivedRecord;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Latest derived record per resource identity, across all kinds.
#[derive(Debug)]
pub struct MetricsCache {
    state: Mutex<CacheState>,
}

impl MetricsCache {
    /// Creates an empty cache dispatching through `registry`.
    #[must_use]
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            state: Mutex::new(CacheState {
                registry,
                records: BTreeMap::new(),
            }),
        }
    }

    /// Acquires the cache lock.
    ///
    /// Handlers run before any map mutation, so a panic while the lock is held
    /// cannot leave a half-written entry behind; a poisoned lock is recovered.
    pub fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Independent copy of every cached record, ordered by identity.
    #[must_use]
    pub fn snapshot(&self) -> Vec<DerivedRecord> {
        self.lock().records.values().cloned().collect()
    }

    /// Number of cached records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MetricsCache {
    fn default() -> Self {
        Self::new(HandlerRegistry::default())
    }
}

/// Cache contents, reachable only while the lock is held.
#[derive(Debug)]
pub struct CacheState {
    registry: HandlerRegistry,
    records: BTreeMap<ResourceIdentity, DerivedRecord>,
}

impl CacheState {
    /// Derives and stores the record for `obj`.
    ///
    /// Returns the object's identity whenever it was processed, including when
    /// the handler chose to skip it. Returns `None` for unregistered kinds and
    /// for objects the handler failed on; neither touches the cache.
    pub fn handle_add(&mut self, obj: &ClusterObject) -> Option<ResourceIdentity> {
        let kind = obj.kind();
        let Some(handler) = self.registry.get(kind) else {
            debug!("No handler registered for {}, ignoring {}", kind, obj.display_name());
            return None;
        };

        let id = match obj.identity() {
            Ok(id) => id,
            Err(e) => {
                warn!("Skipping {} {}: {}", kind, obj.display_name(), e);
                return None;
            }
        };

        match handler(obj) {
            Ok(Some(record)) => {
                self.records.insert(id.clone(), record);
            }
            Ok(None) => {
                debug!("{} {} yielded no data", kind, obj.display_name());
            }
            Err(e) => {
                warn!("Skipping {} {}: {}", kind, obj.display_name(), e);
                return None;
            }
        }
        Some(id)
    }

    /// Same as [`CacheState::handle_add`]; records are always replaced wholesale.
    pub fn handle_update(&mut self, obj: &ClusterObject) -> Option<ResourceIdentity> {
        self.handle_add(obj)
    }

    /// Removes the record for `obj`, returning its identity if the kind is
    /// registered and the object carries one.
    pub fn handle_delete(&mut self, obj: &ClusterObject) -> Option<ResourceIdentity> {
        let kind = obj.kind();
        if !self.registry.contains(kind) {
            debug!("No handler registered for {}, ignoring {}", kind, obj.display_name());
            return None;
        }

        match obj.identity() {
            Ok(id) => {
                self.records.remove(&id);
                Some(id)
            }
            Err(e) => {
                warn!("Cannot delete {} {}: {}", kind, obj.display_name(), e);
                None
            }
        }
    }

    /// Unconditionally removes the record stored under `id`.
    pub fn delete_by_key(&mut self, id: &ResourceIdentity) -> Option<DerivedRecord> {
        self.records.remove(id)
    }

    /// The record cached under `id`.
    #[must_use]
    pub fn get(&self, id: &ResourceIdentity) -> Option<&DerivedRecord> {
        self.records.get(id)
    }

    /// Whether a record is cached under `id`.
    #[must_use]
    pub fn contains_key(&self, id: &ResourceIdentity) -> bool {
        self.records.contains_key(id)
    }

    /// Cached identities in snapshot order.
    pub fn keys(&self) -> impl Iterator<Item = &ResourceIdentity> {
        self.records.keys()
    }

    /// Number of cached records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records are cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
