//! Cluster-scoped kinds: nodes and namespaces.

use super::common::{base_dimensions, props_and_tags_from_labels, require_uid};
use crate::error::HandlerError;
use crate::kind::ResourceKind;
use crate::record::{Datapoint, DerivedRecord, DimProperties};
use k8s_openapi::api::core::v1::{Namespace, Node};

pub(crate) fn derive_node(node: &Node) -> Result<Option<DerivedRecord>, HandlerError> {
    let meta = &node.metadata;
    let uid = require_uid(meta, ResourceKind::Node)?;
    let name = meta.name.clone().unwrap_or_default();

    let ready = node
        .status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .and_then(|conditions| conditions.iter().find(|c| c.type_ == "Ready"))
        .map_or(-1, |condition| match condition.status.as_str() {
            "True" => 1,
            "False" => 0,
            _ => -1,
        });

    let mut dims = base_dimensions(meta, uid);
    dims.insert("kubernetes_node".to_string(), name.clone());
    let datapoints = vec![Datapoint::gauge("kubernetes.node_ready", &dims, ready)];

    let (props, tags) = props_and_tags_from_labels(meta.labels.as_ref());
    Ok(DerivedRecord::from_parts(
        datapoints,
        DimProperties::new("kubernetes_node", &name, props, tags),
    ))
}

pub(crate) fn derive_namespace(ns: &Namespace) -> Result<Option<DerivedRecord>, HandlerError> {
    let meta = &ns.metadata;
    let uid = require_uid(meta, ResourceKind::Namespace)?;
    let name = meta.name.clone().unwrap_or_default();

    // A namespace is its own namespace.
    let mut dims = base_dimensions(meta, uid);
    dims.insert("kubernetes_namespace".to_string(), name.clone());

    let phase = ns.status.as_ref().and_then(|status| status.phase.as_deref());
    let datapoints = match phase {
        Some("Active") => vec![Datapoint::gauge("kubernetes.namespace_phase", &dims, 1)],
        Some("Terminating") => vec![Datapoint::gauge("kubernetes.namespace_phase", &dims, 0)],
        _ => Vec::new(),
    };

    let (props, tags) = props_and_tags_from_labels(meta.labels.as_ref());
    Ok(DerivedRecord::from_parts(
        datapoints,
        DimProperties::new("kubernetes_namespace", &name, props, tags),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Value;
    use k8s_openapi::api::core::v1::{NamespaceStatus, NodeCondition, NodeStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn node(ready: Option<&str>) -> Node {
        Node {
            metadata: ObjectMeta {
                name: Some("node-a".to_string()),
                uid: Some("node-uid".to_string()),
                ..Default::default()
            },
            status: ready.map(|status| NodeStatus {
                conditions: Some(vec![NodeCondition {
                    type_: "Ready".to_string(),
                    status: status.to_string(),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_node_ready_values() {
        for (status, expected) in [(Some("True"), 1), (Some("False"), 0), (Some("Unknown"), -1), (None, -1)] {
            let record = derive_node(&node(status))
                .expect("node derives")
                .expect("node has data");
            let dp = record.datapoint("kubernetes.node_ready").expect("ready datapoint");
            assert_eq!(dp.value, Value::Int(expected), "status {status:?}");
            assert_eq!(dp.dimensions["kubernetes_node"], "node-a");
            assert_eq!(dp.dimensions["kubernetes_namespace"], "");
        }
    }

    #[test]
    fn test_namespace_phase() {
        let ns = Namespace {
            metadata: ObjectMeta {
                name: Some("prod".to_string()),
                uid: Some("ns-uid".to_string()),
                labels: Some([("team".to_string(), "core".to_string())].into()),
                ..Default::default()
            },
            status: Some(NamespaceStatus {
                phase: Some("Terminating".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let record = derive_namespace(&ns)
            .expect("namespace derives")
            .expect("namespace has data");
        let dp = record.datapoint("kubernetes.namespace_phase").expect("phase");
        assert_eq!(dp.value, Value::Int(0));
        assert_eq!(dp.dimensions["kubernetes_namespace"], "prod");
        let props = record.dim_props.as_ref().expect("labels");
        assert_eq!(props.dimension.name, "kubernetes_namespace");
        assert_eq!(props.properties["team"], "core");
    }

    #[test]
    fn test_namespace_without_phase_or_labels_is_skipped() {
        let ns = Namespace {
            metadata: ObjectMeta {
                name: Some("empty".to_string()),
                uid: Some("ns-2".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(derive_namespace(&ns), Ok(None));
    }
}
