//! Resource kinds, the tagged object union, and resource identities.

use crate::error::HandlerError;
use crds::ClusterResourceQuota;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::{
    Namespace, Node, Pod, ReplicationController, ResourceQuota, Service,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of cluster object the agent derives metrics from.
///
/// Serialized by its plural API resource name (`pods`, `daemonsets`, ...),
/// which is also how kinds are referred to in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    #[serde(rename = "pods")]
    Pod,
    #[serde(rename = "deployments")]
    Deployment,
    #[serde(rename = "daemonsets")]
    DaemonSet,
    #[serde(rename = "replicasets")]
    ReplicaSet,
    #[serde(rename = "replicationcontrollers")]
    ReplicationController,
    #[serde(rename = "statefulsets")]
    StatefulSet,
    #[serde(rename = "jobs")]
    Job,
    #[serde(rename = "cronjobs")]
    CronJob,
    #[serde(rename = "nodes")]
    Node,
    #[serde(rename = "namespaces")]
    Namespace,
    #[serde(rename = "services")]
    Service,
    #[serde(rename = "resourcequotas")]
    ResourceQuota,
    #[serde(rename = "clusterresourcequotas")]
    ClusterResourceQuota,
}

impl ResourceKind {
    /// Every kind the agent knows how to handle.
    pub const ALL: [ResourceKind; 13] = [
        ResourceKind::Pod,
        ResourceKind::Deployment,
        ResourceKind::DaemonSet,
        ResourceKind::ReplicaSet,
        ResourceKind::ReplicationController,
        ResourceKind::StatefulSet,
        ResourceKind::Job,
        ResourceKind::CronJob,
        ResourceKind::Node,
        ResourceKind::Namespace,
        ResourceKind::Service,
        ResourceKind::ResourceQuota,
        ResourceKind::ClusterResourceQuota,
    ];

    /// The Kubernetes `kind` string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Pod => "Pod",
            ResourceKind::Deployment => "Deployment",
            ResourceKind::DaemonSet => "DaemonSet",
            ResourceKind::ReplicaSet => "ReplicaSet",
            ResourceKind::ReplicationController => "ReplicationController",
            ResourceKind::StatefulSet => "StatefulSet",
            ResourceKind::Job => "Job",
            ResourceKind::CronJob => "CronJob",
            ResourceKind::Node => "Node",
            ResourceKind::Namespace => "Namespace",
            ResourceKind::Service => "Service",
            ResourceKind::ResourceQuota => "ResourceQuota",
            ResourceKind::ClusterResourceQuota => "ClusterResourceQuota",
        }
    }

    /// Plural API resource name, as used in REST paths.
    #[must_use]
    pub fn plural(self) -> &'static str {
        match self {
            ResourceKind::Pod => "pods",
            ResourceKind::Deployment => "deployments",
            ResourceKind::DaemonSet => "daemonsets",
            ResourceKind::ReplicaSet => "replicasets",
            ResourceKind::ReplicationController => "replicationcontrollers",
            ResourceKind::StatefulSet => "statefulsets",
            ResourceKind::Job => "jobs",
            ResourceKind::CronJob => "cronjobs",
            ResourceKind::Node => "nodes",
            ResourceKind::Namespace => "namespaces",
            ResourceKind::Service => "services",
            ResourceKind::ResourceQuota => "resourcequotas",
            ResourceKind::ClusterResourceQuota => "clusterresourcequotas",
        }
    }

    /// Whether objects of this kind live inside a namespace.
    #[must_use]
    pub fn is_namespaced(self) -> bool {
        !matches!(
            self,
            ResourceKind::Node | ResourceKind::Namespace | ResourceKind::ClusterResourceQuota
        )
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable key of one tracked object: its cluster-assigned UID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ResourceIdentity(String);

impl ResourceIdentity {
    /// Wraps a cluster-assigned UID.
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    /// The UID string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A watched object, tagged by kind.
#[derive(Debug, Clone)]
pub enum ClusterObject {
    Pod(Pod),
    Deployment(Deployment),
    DaemonSet(DaemonSet),
    ReplicaSet(ReplicaSet),
    ReplicationController(ReplicationController),
    StatefulSet(StatefulSet),
    Job(Job),
    CronJob(CronJob),
    Node(Node),
    Namespace(Namespace),
    Service(Service),
    ResourceQuota(ResourceQuota),
    ClusterResourceQuota(ClusterResourceQuota),
}

macro_rules! cluster_object_from {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for ClusterObject {
                fn from(obj: $variant) -> Self {
                    ClusterObject::$variant(obj)
                }
            }
        )*

        impl ClusterObject {
            /// The kind tag of this object.
            #[must_use]
            pub fn kind(&self) -> ResourceKind {
                match self {
                    $(ClusterObject::$variant(_) => ResourceKind::$variant,)*
                }
            }

            /// Standard object metadata.
            #[must_use]
            pub fn meta(&self) -> &ObjectMeta {
                match self {
                    $(ClusterObject::$variant(obj) => &obj.metadata,)*
                }
            }
        }
    };
}

cluster_object_from!(
    Pod,
    Deployment,
    DaemonSet,
    ReplicaSet,
    ReplicationController,
    StatefulSet,
    Job,
    CronJob,
    Node,
    Namespace,
    Service,
    ResourceQuota,
    ClusterResourceQuota,
);

impl ClusterObject {
    /// Identity of the object, taken from `metadata.uid`.
    pub fn identity(&self) -> Result<ResourceIdentity, HandlerError> {
        match self.meta().uid.as_deref() {
            Some(uid) if !uid.is_empty() => Ok(ResourceIdentity::new(uid)),
            _ => Err(HandlerError::MissingField {
                kind: self.kind(),
                field: "metadata.uid",
            }),
        }
    }

    /// Human readable `namespace/name` for log lines.
    #[must_use]
    pub fn display_name(&self) -> String {
        let meta = self.meta();
        let name = meta.name.as_deref().unwrap_or("<unnamed>");
        match meta.namespace.as_deref() {
            Some(ns) if !ns.is_empty() => format!("{ns}/{name}"),
            _ => name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(uid: Option<&str>) -> ObjectMeta {
        ObjectMeta {
            name: Some("web".to_string()),
            namespace: Some("prod".to_string()),
            uid: uid.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_identity_uses_uid_not_name() {
        let obj = ClusterObject::from(Service {
            metadata: meta(Some("svc-uid-1")),
            ..Default::default()
        });
        assert_eq!(obj.identity(), Ok(ResourceIdentity::new("svc-uid-1")));
        assert_eq!(obj.kind(), ResourceKind::Service);
        assert_eq!(obj.display_name(), "prod/web");
    }

    #[test]
    fn test_missing_uid_is_an_error() {
        let obj = ClusterObject::from(Pod {
            metadata: meta(None),
            ..Default::default()
        });
        assert_eq!(
            obj.identity(),
            Err(HandlerError::MissingField {
                kind: ResourceKind::Pod,
                field: "metadata.uid",
            })
        );
    }

    #[test]
    fn test_cluster_scoped_kinds() {
        let cluster_scoped: Vec<_> = ResourceKind::ALL
            .into_iter()
            .filter(|kind| !kind.is_namespaced())
            .collect();
        assert_eq!(
            cluster_scoped,
            vec![
                ResourceKind::Node,
                ResourceKind::Namespace,
                ResourceKind::ClusterResourceQuota
            ]
        );
    }

    #[test]
    fn test_kind_serializes_as_plural() {
        for kind in ResourceKind::ALL {
            let json = serde_json::to_value(kind).expect("kind serializes");
            assert_eq!(json, serde_json::Value::String(kind.plural().to_string()));
        }
    }
}
