//! Cluster resource definitions
//!
//! Resource types that are not part of the upstream Kubernetes API and
//! therefore have no `k8s-openapi` counterpart.

pub mod cluster_resource_quota;

pub use cluster_resource_quota::*;
