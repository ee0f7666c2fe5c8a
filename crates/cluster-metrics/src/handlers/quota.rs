//! Resource quotas: the namespaced `ResourceQuota` and OpenShift's
//! cluster-wide `ClusterResourceQuota`.

use super::common::{base_dimensions, require_uid};
use super::quantity::parse_quantity;
use crate::error::HandlerError;
use crate::kind::ResourceKind;
use crate::record::{Datapoint, DerivedRecord, Dimensions};
use crds::ClusterResourceQuota;
use k8s_openapi::api::core::v1::ResourceQuota;
use std::collections::BTreeMap;

/// One gauge per resource in `quantities`, tagged with `resource`.
fn quota_datapoints<'a>(
    metric: &str,
    dims: &Dimensions,
    quantities: impl IntoIterator<Item = (&'a String, &'a str)>,
) -> Result<Vec<Datapoint>, HandlerError> {
    quantities
        .into_iter()
        .map(|(resource, quantity)| {
            let mut dims = dims.clone();
            dims.insert("resource".to_string(), resource.clone());
            Ok(Datapoint::gauge(metric, &dims, parse_quantity(quantity)?))
        })
        .collect()
}

fn raw<V: AsRef<str>>(map: &BTreeMap<String, V>) -> impl Iterator<Item = (&String, &str)> {
    map.iter().map(|(k, v)| (k, v.as_ref()))
}

pub(crate) fn derive_resource_quota(
    quota: &ResourceQuota,
) -> Result<Option<DerivedRecord>, HandlerError> {
    let meta = &quota.metadata;
    let uid = require_uid(meta, ResourceKind::ResourceQuota)?;
    let Some(status) = quota.status.as_ref() else {
        return Ok(None);
    };

    let mut dims = base_dimensions(meta, uid);
    dims.insert("quota_name".to_string(), meta.name.clone().unwrap_or_default());

    let mut datapoints = Vec::new();
    if let Some(hard) = status.hard.as_ref() {
        datapoints.extend(quota_datapoints(
            "kubernetes.resource_quota_hard",
            &dims,
            hard.iter().map(|(k, q)| (k, q.0.as_str())),
        )?);
    }
    if let Some(used) = status.used.as_ref() {
        datapoints.extend(quota_datapoints(
            "kubernetes.resource_quota_used",
            &dims,
            used.iter().map(|(k, q)| (k, q.0.as_str())),
        )?);
    }

    Ok(DerivedRecord::from_parts(datapoints, None))
}

pub(crate) fn derive_cluster_resource_quota(
    quota: &ClusterResourceQuota,
) -> Result<Option<DerivedRecord>, HandlerError> {
    let meta = &quota.metadata;
    let uid = require_uid(meta, ResourceKind::ClusterResourceQuota)?;
    let Some(status) = quota.status.as_ref() else {
        return Ok(None);
    };

    let mut dims = base_dimensions(meta, uid);
    dims.insert("quota_name".to_string(), meta.name.clone().unwrap_or_default());

    let mut datapoints = quota_datapoints("openshift.clusterquota.hard", &dims, raw(&status.total.hard))?;
    datapoints.extend(quota_datapoints(
        "openshift.clusterquota.used",
        &dims,
        raw(&status.total.used),
    )?);

    // Share of the quota applied to each selected namespace.
    for applied in &status.namespaces {
        let mut ns_dims = dims.clone();
        ns_dims.insert("kubernetes_namespace".to_string(), applied.namespace.clone());
        datapoints.extend(quota_datapoints(
            "openshift.appliedclusterquota.hard",
            &ns_dims,
            raw(&applied.status.hard),
        )?);
        datapoints.extend(quota_datapoints(
            "openshift.appliedclusterquota.used",
            &ns_dims,
            raw(&applied.status.used),
        )?);
    }

    Ok(DerivedRecord::from_parts(datapoints, None))
}
