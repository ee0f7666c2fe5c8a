//! ClusterResourceQuota resource
//!
//! OpenShift's cluster-scoped quota (`quota.openshift.io/v1`). A single quota
//! object selects many namespaces and reports both the aggregate totals and a
//! per-namespace breakdown in its status.
//!
//! Quantities are kept as their raw string form (`"500m"`, `"10Gi"`); the
//! consumer decides how to interpret them.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[kube(
    group = "quota.openshift.io",
    version = "v1",
    kind = "ClusterResourceQuota",
    status = "ClusterResourceQuotaStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterResourceQuotaSpec {
    /// Quota enforced across every selected namespace
    #[serde(default)]
    pub quota: QuotaTotals,

    /// Selects the namespaces the quota applies to
    #[serde(default)]
    pub selector: ClusterResourceQuotaSelector,
}

/// Namespace selector of a ClusterResourceQuota
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterResourceQuotaSelector {
    /// Namespace annotations that must all match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,

    /// Standard label selector over namespace labels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<serde_json::Value>,
}

/// Hard limits and current usage, keyed by resource name (e.g. `pods`, `requests.cpu`)
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuotaTotals {
    #[serde(default)]
    pub hard: BTreeMap<String, String>,

    #[serde(default)]
    pub used: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterResourceQuotaStatus {
    /// Aggregate across all selected namespaces
    #[serde(default)]
    pub total: QuotaTotals,

    /// Per-namespace breakdown
    #[serde(default)]
    pub namespaces: Vec<NamespaceQuotaStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceQuotaStatus {
    pub namespace: String,

    #[serde(default)]
    pub status: QuotaTotals,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_status_totals() {
        let quota: ClusterResourceQuota = serde_json::from_value(serde_json::json!({
            "apiVersion": "quota.openshift.io/v1",
            "kind": "ClusterResourceQuota",
            "metadata": { "name": "team-a", "uid": "crq-1" },
            "spec": {
                "quota": { "hard": { "pods": "10" } },
                "selector": { "annotations": { "openshift.io/requester": "team-a" } }
            },
            "status": {
                "total": { "hard": { "pods": "10" }, "used": { "pods": "4" } },
                "namespaces": [
                    { "namespace": "a1", "status": { "used": { "pods": "4" } } }
                ]
            }
        }))
        .expect("quota should deserialize");

        let status = quota.status.expect("status present");
        assert_eq!(status.total.used.get("pods").map(String::as_str), Some("4"));
        assert_eq!(status.namespaces.len(), 1);
        assert_eq!(quota.spec.quota.hard.get("pods").map(String::as_str), Some("10"));
    }

    #[test]
    fn test_missing_spec_sections_default() {
        let quota: ClusterResourceQuota = serde_json::from_value(serde_json::json!({
            "apiVersion": "quota.openshift.io/v1",
            "kind": "ClusterResourceQuota",
            "metadata": { "name": "empty" },
            "spec": {}
        }))
        .expect("quota should deserialize");

        assert!(quota.spec.quota.hard.is_empty());
        assert!(quota.status.is_none());
    }
}
