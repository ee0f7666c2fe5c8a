//! Per-kind derivation handlers and the table that dispatches to them.
//!
//! Every handler is a pure function from one object to either a
//! [`DerivedRecord`] or `None` ("skip": nothing worth caching). Handlers are
//! grouped by API area:
//! - `pod`: pods and their containers
//! - `workloads`: deployments, daemon sets, replica sets, replication controllers, stateful sets
//! - `batch`: jobs and cron jobs
//! - `cluster`: nodes and namespaces
//! - `service`: services
//! - `quota`: resource quotas and cluster resource quotas

mod batch;
mod cluster;
pub mod common;
mod pod;
pub mod quantity;
mod quota;
mod service;
mod workloads;

use crate::error::HandlerError;
use crate::kind::{ClusterObject, ResourceKind};
use crate::record::DerivedRecord;
use std::collections::HashMap;

/// Signature shared by every entry in the handler table.
pub type DeriveFn = fn(&ClusterObject) -> Result<Option<DerivedRecord>, HandlerError>;

/// Wraps a typed handler so it can sit in the table next to the others.
macro_rules! typed_handler {
    ($variant:ident, $derive:path) => {{
        fn dispatch(obj: &ClusterObject) -> Result<Option<DerivedRecord>, HandlerError> {
            match obj {
                ClusterObject::$variant(inner) => $derive(inner),
                other => Err(HandlerError::KindMismatch {
                    expected: ResourceKind::$variant,
                    found: other.kind(),
                }),
            }
        }
        dispatch as DeriveFn
    }};
}

/// The built-in handler for `kind`.
#[must_use]
pub fn handler_for(kind: ResourceKind) -> DeriveFn {
    match kind {
        ResourceKind::Pod => typed_handler!(Pod, pod::derive_pod),
        ResourceKind::Deployment => typed_handler!(Deployment, workloads::derive_deployment),
        ResourceKind::DaemonSet => typed_handler!(DaemonSet, workloads::derive_daemon_set),
        ResourceKind::ReplicaSet => typed_handler!(ReplicaSet, workloads::derive_replica_set),
        ResourceKind::ReplicationController => typed_handler!(
            ReplicationController,
            workloads::derive_replication_controller
        ),
        ResourceKind::StatefulSet => typed_handler!(StatefulSet, workloads::derive_stateful_set),
        ResourceKind::Job => typed_handler!(Job, batch::derive_job),
        ResourceKind::CronJob => typed_handler!(CronJob, batch::derive_cron_job),
        ResourceKind::Node => typed_handler!(Node, cluster::derive_node),
        ResourceKind::Namespace => typed_handler!(Namespace, cluster::derive_namespace),
        ResourceKind::Service => typed_handler!(Service, service::derive_service),
        ResourceKind::ResourceQuota => typed_handler!(ResourceQuota, quota::derive_resource_quota),
        ResourceKind::ClusterResourceQuota => typed_handler!(
            ClusterResourceQuota,
            quota::derive_cluster_resource_quota
        ),
    }
}

/// Kind tag → handler table, fixed when the cache is built.
#[derive(Debug, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<ResourceKind, DeriveFn>,
}

impl HandlerRegistry {
    /// A registry with no handlers; every object is treated as unrecognized.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// A registry holding the built-in handlers for `kinds`.
    pub fn for_kinds(kinds: impl IntoIterator<Item = ResourceKind>) -> Self {
        let mut registry = Self::empty();
        for kind in kinds {
            registry.register(kind, handler_for(kind));
        }
        registry
    }

    /// Registers (or replaces) the handler for `kind`.
    pub fn register(&mut self, kind: ResourceKind, handler: DeriveFn) {
        self.handlers.insert(kind, handler);
    }

    /// Handler registered for `kind`, if any.
    #[must_use]
    pub fn get(&self, kind: ResourceKind) -> Option<DeriveFn> {
        self.handlers.get(&kind).copied()
    }

    /// Whether `kind` has a handler.
    #[must_use]
    pub fn contains(&self, kind: ResourceKind) -> bool {
        self.handlers.contains_key(&kind)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::for_kinds(ResourceKind::ALL)
    }
}
