//! Helpers shared by the per-kind handlers: base dimensions, label and
//! owner-reference properties, container ID normalization.

use crate::error::HandlerError;
use crate::kind::ResourceKind;
use crate::record::Dimensions;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::{BTreeMap, BTreeSet};

/// Value of the `metric_source` dimension on everything this crate emits.
pub const METRIC_SOURCE: &str = "kubernetes";

/// The UID of an object, which every handler keys its output on.
pub(crate) fn require_uid(meta: &ObjectMeta, kind: ResourceKind) -> Result<&str, HandlerError> {
    meta.uid
        .as_deref()
        .filter(|uid| !uid.is_empty())
        .ok_or(HandlerError::MissingField {
            kind,
            field: "metadata.uid",
        })
}

/// Dimensions carried by every datapoint derived from `meta`.
///
/// Cluster-scoped objects get an empty `kubernetes_namespace`.
pub(crate) fn base_dimensions(meta: &ObjectMeta, uid: &str) -> Dimensions {
    Dimensions::from([
        ("metric_source".to_string(), METRIC_SOURCE.to_string()),
        (
            "kubernetes_namespace".to_string(),
            meta.namespace.clone().unwrap_or_default(),
        ),
        ("kubernetes_uid".to_string(), uid.to_string()),
        (
            "kubernetes_name".to_string(),
            meta.name.clone().unwrap_or_default(),
        ),
    ])
}

/// Splits labels into properties (non-empty values) and tags (empty values).
#[must_use]
pub fn props_and_tags_from_labels(
    labels: Option<&BTreeMap<String, String>>,
) -> (BTreeMap<String, String>, BTreeSet<String>) {
    let mut props = BTreeMap::new();
    let mut tags = BTreeSet::new();
    for (key, value) in labels.into_iter().flatten() {
        if value.is_empty() {
            tags.insert(key.clone());
        } else {
            props.insert(key.clone(), value.clone());
        }
    }
    (props, tags)
}

/// Adds `<kind>` and `<kind>_uid` properties for every owner reference.
pub(crate) fn add_owner_properties(props: &mut BTreeMap<String, String>, meta: &ObjectMeta) {
    for owner in meta.owner_references.iter().flatten() {
        let kind = owner.kind.to_lowercase();
        props.insert(format!("{kind}_uid"), owner.uid.clone());
        props.insert(kind, owner.name.clone());
    }
}

/// Label properties/tags, owner properties and the `kubernetes_workload` marker.
pub(crate) fn workload_properties(
    meta: &ObjectMeta,
    kind: ResourceKind,
) -> (BTreeMap<String, String>, BTreeSet<String>) {
    let (mut props, tags) = props_and_tags_from_labels(meta.labels.as_ref());
    props.insert("kubernetes_workload".to_string(), kind.as_str().to_string());
    add_owner_properties(&mut props, meta);
    (props, tags)
}

/// Removes one leading runtime scheme (`docker://`, `cri-o://`, ...) from a
/// container ID. IDs without a scheme are returned unchanged.
#[must_use]
pub fn strip_container_id_prefix(id: &str) -> &str {
    match id.split_once("://") {
        Some((scheme, rest))
            if !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.')) =>
        {
            rest
        }
        _ => id,
    }
}
