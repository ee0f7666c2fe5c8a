//! Replicated workload controllers: deployments, daemon sets, replica sets,
//! replication controllers and stateful sets.
//!
//! A workload without a desired replica count is skipped entirely rather than
//! reported with a zero that would read as "scaled to nothing".

use super::common::{base_dimensions, require_uid, workload_properties};
use crate::error::HandlerError;
use crate::kind::ResourceKind;
use crate::record::{Datapoint, DerivedRecord, DimProperties};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::core::v1::ReplicationController;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// `<prefix>.desired` / `<prefix>.available` pair shared by three kinds.
fn desired_available(
    meta: &ObjectMeta,
    kind: ResourceKind,
    prefix: &str,
    desired: Option<i32>,
    available: Option<i32>,
) -> Result<Option<DerivedRecord>, HandlerError> {
    let uid = require_uid(meta, kind)?;
    let Some(desired) = desired else {
        return Ok(None);
    };

    let dims = base_dimensions(meta, uid);
    let datapoints = vec![
        Datapoint::gauge(&format!("{prefix}.desired"), &dims, desired),
        Datapoint::gauge(&format!("{prefix}.available"), &dims, available.unwrap_or(0)),
    ];

    let (props, tags) = workload_properties(meta, kind);
    Ok(DerivedRecord::from_parts(
        datapoints,
        DimProperties::new("kubernetes_uid", uid, props, tags),
    ))
}

pub(crate) fn derive_deployment(dep: &Deployment) -> Result<Option<DerivedRecord>, HandlerError> {
    desired_available(
        &dep.metadata,
        ResourceKind::Deployment,
        "kubernetes.deployment",
        dep.spec.as_ref().and_then(|spec| spec.replicas),
        dep.status.as_ref().and_then(|status| status.available_replicas),
    )
}

pub(crate) fn derive_replica_set(rs: &ReplicaSet) -> Result<Option<DerivedRecord>, HandlerError> {
    desired_available(
        &rs.metadata,
        ResourceKind::ReplicaSet,
        "kubernetes.replica_set",
        rs.spec.as_ref().and_then(|spec| spec.replicas),
        rs.status.as_ref().and_then(|status| status.available_replicas),
    )
}

pub(crate) fn derive_replication_controller(
    rc: &ReplicationController,
) -> Result<Option<DerivedRecord>, HandlerError> {
    desired_available(
        &rc.metadata,
        ResourceKind::ReplicationController,
        "kubernetes.replication_controller",
        rc.spec.as_ref().and_then(|spec| spec.replicas),
        rc.status.as_ref().and_then(|status| status.available_replicas),
    )
}

pub(crate) fn derive_daemon_set(ds: &DaemonSet) -> Result<Option<DerivedRecord>, HandlerError> {
    let meta = &ds.metadata;
    let uid = require_uid(meta, ResourceKind::DaemonSet)?;
    let Some(status) = ds.status.as_ref() else {
        return Ok(None);
    };

    let dims = base_dimensions(meta, uid);
    let datapoints = vec![
        Datapoint::gauge(
            "kubernetes.daemon_set.current_scheduled",
            &dims,
            status.current_number_scheduled,
        ),
        Datapoint::gauge(
            "kubernetes.daemon_set.desired_scheduled",
            &dims,
            status.desired_number_scheduled,
        ),
        Datapoint::gauge(
            "kubernetes.daemon_set.misscheduled",
            &dims,
            status.number_misscheduled,
        ),
        Datapoint::gauge("kubernetes.daemon_set.ready", &dims, status.number_ready),
    ];

    let (props, tags) = workload_properties(meta, ResourceKind::DaemonSet);
    Ok(DerivedRecord::from_parts(
        datapoints,
        DimProperties::new("kubernetes_uid", uid, props, tags),
    ))
}

pub(crate) fn derive_stateful_set(ss: &StatefulSet) -> Result<Option<DerivedRecord>, HandlerError> {
    let meta = &ss.metadata;
    let uid = require_uid(meta, ResourceKind::StatefulSet)?;
    let Some(desired) = ss.spec.as_ref().and_then(|spec| spec.replicas) else {
        return Ok(None);
    };
    let status = ss.status.as_ref();

    let dims = base_dimensions(meta, uid);
    let datapoints = vec![
        Datapoint::gauge("kubernetes.stateful_set.desired", &dims, desired),
        Datapoint::gauge(
            "kubernetes.stateful_set.ready",
            &dims,
            status.and_then(|s| s.ready_replicas).unwrap_or(0),
        ),
        Datapoint::gauge(
            "kubernetes.stateful_set.current",
            &dims,
            status.and_then(|s| s.current_replicas).unwrap_or(0),
        ),
        Datapoint::gauge(
            "kubernetes.stateful_set.updated",
            &dims,
            status.and_then(|s| s.updated_replicas).unwrap_or(0),
        ),
    ];

    let (mut props, tags) = workload_properties(meta, ResourceKind::StatefulSet);
    if let Some(revision) = status.and_then(|s| s.current_revision.clone()) {
        props.insert("current_revision".to_string(), revision);
    }
    if let Some(revision) = status.and_then(|s| s.update_revision.clone()) {
        props.insert("update_revision".to_string(), revision);
    }

    Ok(DerivedRecord::from_parts(
        datapoints,
        DimProperties::new("kubernetes_uid", uid, props, tags),
    ))
}
