//! Translates one kind's watch events into cache mutations.
//!
//! Each adapter owns the set of identities its kind currently has in the
//! cluster (the live set). The live set is what lets a full relist evict
//! exactly this kind's stale entries, including objects that never produced
//! a record, without disturbing any other kind.

use crate::cache::{CacheState, MetricsCache};
use crate::kind::{ClusterObject, ResourceIdentity, ResourceKind};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Routes add/update/delete/replace events for one kind into the shared cache.
#[derive(Debug)]
pub struct ResourceEventAdapter {
    kind: ResourceKind,
    cache: Arc<MetricsCache>,
    live: HashSet<ResourceIdentity>,
}

impl ResourceEventAdapter {
    /// Creates an adapter for `kind` with an empty live set.
    #[must_use]
    pub fn new(kind: ResourceKind, cache: Arc<MetricsCache>) -> Self {
        Self {
            kind,
            cache,
            live: HashSet::new(),
        }
    }

    /// The kind this adapter accepts.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Identities currently known to exist for this kind.
    #[must_use]
    pub fn live_set(&self) -> &HashSet<ResourceIdentity> {
        &self.live
    }

    /// Derives and caches `obj`, adding it to the live set.
    pub fn on_add(&mut self, obj: &ClusterObject) {
        if !self.accepts(obj) {
            return;
        }
        let mut state = self.cache.lock();
        Self::add_locked(&mut state, &mut self.live, obj);
    }

    /// Same as [`ResourceEventAdapter::on_add`]; the record is replaced wholesale.
    pub fn on_update(&mut self, obj: &ClusterObject) {
        self.on_add(obj);
    }

    /// Drops the cached record for `obj` and forgets its identity.
    pub fn on_delete(&mut self, obj: &ClusterObject) {
        if !self.accepts(obj) {
            return;
        }
        let mut state = self.cache.lock();
        if let Some(id) = state.handle_delete(obj) {
            self.live.remove(&id);
        }
    }

    /// Full resync: drops everything this kind had cached, then loads `objects`
    /// as the complete current state, all under one lock acquisition.
    pub fn on_replace<'a>(&mut self, objects: impl IntoIterator<Item = &'a ClusterObject>) {
        let mut state = self.cache.lock();

        let stale = self.live.len();
        for id in self.live.drain() {
            state.delete_by_key(&id);
        }

        let mut listed = 0usize;
        for obj in objects {
            listed += 1;
            if self.accepts(obj) {
                Self::add_locked(&mut state, &mut self.live, obj);
            }
        }

        debug!(
            "Resynced {}: evicted {} previous, {} listed, {} live",
            self.kind,
            stale,
            listed,
            self.live.len()
        );
    }

    fn add_locked(
        state: &mut CacheState,
        live: &mut HashSet<ResourceIdentity>,
        obj: &ClusterObject,
    ) {
        if let Some(id) = state.handle_add(obj) {
            live.insert(id);
        }
    }

    fn accepts(&self, obj: &ClusterObject) -> bool {
        if obj.kind() == self.kind {
            return true;
        }
        warn!(
            "{} adapter received a {} object ({}), ignoring",
            self.kind,
            obj.kind(),
            obj.display_name()
        );
        false
    }
}
