//! Pods and the containers running in them.

use super::common::{
    add_owner_properties, base_dimensions, props_and_tags_from_labels, require_uid,
    strip_container_id_prefix,
};
use super::quantity::parse_quantity;
use crate::error::HandlerError;
use crate::kind::ResourceKind;
use crate::record::{Datapoint, DerivedRecord, DimProperties, Dimensions};
use k8s_openapi::api::core::v1::{Container, ContainerStatus, Pod};

/// Numeric encoding of `status.phase` for `kubernetes.pod_phase`.
fn phase_value(phase: &str) -> i64 {
    match phase {
        "Pending" => 1,
        "Running" => 2,
        "Succeeded" => 3,
        "Failed" => 4,
        _ => 5,
    }
}

/// Derives pod phase, per-container status and resource gauges, and the pod's
/// label and owner properties.
///
/// A record carries a single dimension-property update (the pod's), so the
/// container state is attached to each container datapoint as the
/// `container_status` and `container_status_reason` dimensions instead of a
/// separate update keyed on `container_id`.
pub(crate) fn derive_pod(pod: &Pod) -> Result<Option<DerivedRecord>, HandlerError> {
    let meta = &pod.metadata;
    let uid = require_uid(meta, ResourceKind::Pod)?;

    // Not yet observed by the kubelet; nothing meaningful to report.
    let Some(status) = pod.status.as_ref() else {
        return Ok(None);
    };

    let mut dims = base_dimensions(meta, uid);
    dims.insert("kubernetes_pod_uid".to_string(), uid.to_string());
    dims.insert(
        "kubernetes_pod_name".to_string(),
        meta.name.clone().unwrap_or_default(),
    );

    let mut datapoints = Vec::new();
    if let Some(phase) = status.phase.as_deref() {
        datapoints.push(Datapoint::gauge(
            "kubernetes.pod_phase",
            &dims,
            phase_value(phase),
        ));
    }

    let node_name = pod.spec.as_ref().and_then(|spec| spec.node_name.as_deref());
    let containers = pod
        .spec
        .as_ref()
        .map(|spec| spec.containers.as_slice())
        .unwrap_or_default();

    for cs in status.container_statuses.iter().flatten() {
        // Containers that have not started yet have no runtime ID.
        let Some(container_id) = cs.container_id.as_deref().filter(|id| !id.is_empty()) else {
            continue;
        };
        let container_dims = container_dimensions(&dims, container_id, cs, node_name);
        datapoints.extend(datapoints_for_container_status(cs, &container_dims));
        if let Some(spec) = containers.iter().find(|c| c.name == cs.name) {
            datapoints.extend(datapoints_for_container_spec(spec, &container_dims)?);
        }
    }

    let (mut props, tags) = props_and_tags_from_labels(meta.labels.as_ref());
    add_owner_properties(&mut props, meta);
    let dim_props = DimProperties::new("kubernetes_pod_uid", uid, props, tags);

    Ok(DerivedRecord::from_parts(datapoints, dim_props))
}

fn container_dimensions(
    pod_dims: &Dimensions,
    container_id: &str,
    cs: &ContainerStatus,
    node_name: Option<&str>,
) -> Dimensions {
    let mut dims = pod_dims.clone();
    dims.insert(
        "container_id".to_string(),
        strip_container_id_prefix(container_id).to_string(),
    );
    dims.insert("container_spec_name".to_string(), cs.name.clone());
    dims.insert("container_image".to_string(), cs.image.clone());
    if let Some(node) = node_name {
        dims.insert("kubernetes_node".to_string(), node.to_string());
    }
    if let Some((status, reason)) = container_state(cs) {
        dims.insert("container_status".to_string(), status.to_string());
        if let Some(reason) = reason.filter(|r| !r.is_empty()) {
            dims.insert("container_status_reason".to_string(), reason.to_string());
        }
    }
    dims
}

/// Current state name and reason; waiting wins over terminated over running.
fn container_state(cs: &ContainerStatus) -> Option<(&'static str, Option<&str>)> {
    let state = cs.state.as_ref()?;
    if let Some(waiting) = state.waiting.as_ref() {
        return Some(("waiting", waiting.reason.as_deref()));
    }
    if let Some(terminated) = state.terminated.as_ref() {
        return Some(("terminated", terminated.reason.as_deref()));
    }
    state.running.as_ref().map(|_| ("running", None))
}

fn datapoints_for_container_status(cs: &ContainerStatus, dims: &Dimensions) -> Vec<Datapoint> {
    vec![
        Datapoint::gauge("kubernetes.container_restart_count", dims, cs.restart_count),
        Datapoint::gauge(
            "kubernetes.container_ready",
            dims,
            i64::from(cs.ready),
        ),
    ]
}

/// Request/limit gauges for the resources the container declares.
fn datapoints_for_container_spec(
    container: &Container,
    dims: &Dimensions,
) -> Result<Vec<Datapoint>, HandlerError> {
    let Some(resources) = container.resources.as_ref() else {
        return Ok(Vec::new());
    };

    let mut datapoints = Vec::new();
    for (suffix, quantities) in [
        ("request", resources.requests.as_ref()),
        ("limit", resources.limits.as_ref()),
    ] {
        let Some(quantities) = quantities else {
            continue;
        };
        for (resource, metric) in [
            ("cpu", "kubernetes.container_cpu"),
            ("memory", "kubernetes.container_memory"),
        ] {
            if let Some(quantity) = quantities.get(resource) {
                datapoints.push(Datapoint::gauge(
                    &format!("{metric}.{suffix}"),
                    dims,
                    parse_quantity(&quantity.0)?,
                ));
            }
        }
    }
    Ok(datapoints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Value;
    use k8s_openapi::api::core::v1::{
        ContainerState, ContainerStateRunning, ContainerStateWaiting, PodSpec, PodStatus,
        ResourceRequirements,
    };
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    fn test_pod(container_id: Option<&str>) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some("web-0".to_string()),
                namespace: Some("prod".to_string()),
                uid: Some("pod-1".to_string()),
                labels: Some(BTreeMap::from([("app".to_string(), "web".to_string())])),
                ..Default::default()
            },
            spec: Some(PodSpec {
                node_name: Some("node-a".to_string()),
                containers: vec![Container {
                    name: "app".to_string(),
                    resources: Some(ResourceRequirements {
                        requests: Some(BTreeMap::from([
                            ("cpu".to_string(), Quantity("250m".to_string())),
                            ("memory".to_string(), Quantity("64Mi".to_string())),
                        ])),
                        limits: Some(BTreeMap::from([(
                            "cpu".to_string(),
                            Quantity("1".to_string()),
                        )])),
                        ..Default::default()
                    }),
                    ..Default::default()
                }],
                ..Default::default()
            }),
            status: Some(PodStatus {
                phase: Some("Running".to_string()),
                container_statuses: Some(vec![ContainerStatus {
                    name: "app".to_string(),
                    image: "registry/app:1.2".to_string(),
                    container_id: container_id.map(str::to_string),
                    ready: true,
                    restart_count: 3,
                    ..Default::default()
                }]),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_pod_phase_and_container_metrics() {
        let record = derive_pod(&test_pod(Some("cri-o://abc123")))
            .expect("pod derives")
            .expect("pod has data");

        let phase = record.datapoint("kubernetes.pod_phase").expect("phase datapoint");
        assert_eq!(phase.value, Value::Int(2));
        assert_eq!(phase.dimensions["kubernetes_pod_uid"], "pod-1");

        let restarts = record
            .datapoint("kubernetes.container_restart_count")
            .expect("restart datapoint");
        assert_eq!(restarts.value, Value::Int(3));
        assert_eq!(restarts.dimensions["container_id"], "abc123");
        assert_eq!(restarts.dimensions["container_spec_name"], "app");
        assert_eq!(restarts.dimensions["container_image"], "registry/app:1.2");
        assert_eq!(restarts.dimensions["kubernetes_node"], "node-a");

        let ready = record.datapoint("kubernetes.container_ready").expect("ready datapoint");
        assert_eq!(ready.value, Value::Int(1));

        let cpu_request = record
            .datapoint("kubernetes.container_cpu.request")
            .expect("cpu request");
        assert_eq!(cpu_request.value, Value::Float(0.25));
        assert!(record.datapoint("kubernetes.container_cpu.limit").is_some());
        assert!(record.datapoint("kubernetes.container_memory.request").is_some());
        assert!(record.datapoint("kubernetes.container_memory.limit").is_none());

        let props = record.dim_props.as_ref().expect("pod properties");
        assert_eq!(props.dimension.name, "kubernetes_pod_uid");
        assert_eq!(props.properties["app"], "web");
    }

    #[test]
    fn test_container_state_dimensions() {
        let mut pod = test_pod(Some("docker://abc123"));
        let statuses = pod
            .status
            .as_mut()
            .and_then(|status| status.container_statuses.as_mut())
            .expect("container statuses");

        statuses[0].state = Some(ContainerState {
            running: Some(ContainerStateRunning::default()),
            ..Default::default()
        });
        let record = derive_pod(&pod).expect("pod derives").expect("pod has data");
        let ready = record.datapoint("kubernetes.container_ready").expect("ready datapoint");
        assert_eq!(ready.dimensions["container_status"], "running");
        assert!(!ready.dimensions.contains_key("container_status_reason"));

        if let Some(statuses) = pod
            .status
            .as_mut()
            .and_then(|status| status.container_statuses.as_mut())
        {
            statuses[0].state = Some(ContainerState {
                waiting: Some(ContainerStateWaiting {
                    reason: Some("CrashLoopBackOff".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            });
        }
        let record = derive_pod(&pod).expect("pod derives").expect("pod has data");
        let restarts = record
            .datapoint("kubernetes.container_restart_count")
            .expect("restart datapoint");
        assert_eq!(restarts.dimensions["container_status"], "waiting");
        assert_eq!(restarts.dimensions["container_status_reason"], "CrashLoopBackOff");
        // The pod phase is not a container series.
        let phase = record.datapoint("kubernetes.pod_phase").expect("phase datapoint");
        assert!(!phase.dimensions.contains_key("container_status"));
    }

    #[test]
    fn test_unstarted_containers_are_ignored() {
        let record = derive_pod(&test_pod(None))
            .expect("pod derives")
            .expect("pod has data");
        assert_eq!(record.datapoints.len(), 1);
        assert_eq!(record.datapoints[0].metric, "kubernetes.pod_phase");
    }

    #[test]
    fn test_pod_without_status_is_skipped() {
        let mut pod = test_pod(None);
        pod.status = None;
        assert_eq!(derive_pod(&pod), Ok(None));
    }

    #[test]
    fn test_invalid_quantity_fails_the_pod() {
        let mut pod = test_pod(Some("docker://abc"));
        if let Some(resources) = pod
            .spec
            .as_mut()
            .and_then(|spec| spec.containers[0].resources.as_mut())
        {
            resources.limits = Some(BTreeMap::from([(
                "memory".to_string(),
                Quantity("lots".to_string()),
            )]));
        }
        assert_eq!(
            derive_pod(&pod),
            Err(HandlerError::InvalidQuantity("lots".to_string()))
        );
    }
}
