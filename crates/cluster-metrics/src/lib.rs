//! Cluster Metrics
//!
//! Derives metrics and dimension properties from Kubernetes objects and keeps
//! them in a single cache that many concurrent watch loops update.
//!
//! # Example
//!
//! ```
//! use cluster_metrics::{ClusterObject, MetricsCache, ResourceEventAdapter, ResourceKind};
//! use k8s_openapi::api::core::v1::Service;
//! use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
//! use std::sync::Arc;
//!
//! let cache = Arc::new(MetricsCache::default());
//! let mut services = ResourceEventAdapter::new(ResourceKind::Service, Arc::clone(&cache));
//!
//! let svc = ClusterObject::from(Service {
//!     metadata: ObjectMeta {
//!         name: Some("web".to_string()),
//!         uid: Some("3f1c".to_string()),
//!         labels: Some([("app".to_string(), "web".to_string())].into()),
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! });
//! services.on_add(&svc);
//!
//! assert_eq!(cache.snapshot().len(), 1);
//! ```
//!
//! # Components
//!
//! - [`handlers`]: pure per-kind derivation functions and the dispatch table
//! - [`MetricsCache`]: lock-guarded store of the latest record per object
//! - [`ResourceEventAdapter`]: per-kind event translation with resync eviction

pub mod adapter;
pub mod cache;
pub mod error;
pub mod handlers;
pub mod kind;
pub mod record;

pub use adapter::ResourceEventAdapter;
pub use cache::{CacheState, MetricsCache};
pub use error::HandlerError;
pub use handlers::{DeriveFn, HandlerRegistry};
pub use kind::{ClusterObject, ResourceIdentity, ResourceKind};
pub use record::{Datapoint, DerivedRecord, DimProperties, Dimension, Dimensions, MetricType, Value};
