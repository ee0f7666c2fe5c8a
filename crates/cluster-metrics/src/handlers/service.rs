//! Services carry no time series, only descriptive properties.

use super::common::{props_and_tags_from_labels, require_uid};
use crate::error::HandlerError;
use crate::kind::ResourceKind;
use crate::record::{DerivedRecord, DimProperties};
use k8s_openapi::api::core::v1::Service;

pub(crate) fn derive_service(svc: &Service) -> Result<Option<DerivedRecord>, HandlerError> {
    let meta = &svc.metadata;
    let uid = require_uid(meta, ResourceKind::Service)?;

    let (mut props, tags) = props_and_tags_from_labels(meta.labels.as_ref());
    if let Some(spec) = svc.spec.as_ref() {
        if let Some(service_type) = spec.type_.as_ref() {
            props.insert("service_type".to_string(), service_type.clone());
        }
        if let Some(cluster_ip) = spec.cluster_ip.as_ref().filter(|ip| !ip.is_empty()) {
            props.insert("cluster_ip".to_string(), cluster_ip.clone());
        }
    }

    Ok(DerivedRecord::from_parts(
        Vec::new(),
        DimProperties::new("kubernetes_uid", uid, props, tags),
    ))
}
