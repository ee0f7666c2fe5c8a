//! Jobs and cron jobs.

use super::common::{base_dimensions, require_uid, workload_properties};
use crate::error::HandlerError;
use crate::kind::ResourceKind;
use crate::record::{Datapoint, DerivedRecord, DimProperties};
use k8s_openapi::api::batch::v1::{CronJob, Job};

pub(crate) fn derive_job(job: &Job) -> Result<Option<DerivedRecord>, HandlerError> {
    let meta = &job.metadata;
    let uid = require_uid(meta, ResourceKind::Job)?;
    let spec = job.spec.as_ref();
    let (Some(completions), Some(parallelism)) = (
        spec.and_then(|s| s.completions),
        spec.and_then(|s| s.parallelism),
    ) else {
        return Ok(None);
    };
    let status = job.status.as_ref();

    let dims = base_dimensions(meta, uid);
    let datapoints = vec![
        Datapoint::gauge("kubernetes.job.completions", &dims, completions),
        Datapoint::gauge("kubernetes.job.parallelism", &dims, parallelism),
        Datapoint::gauge(
            "kubernetes.job.active",
            &dims,
            status.and_then(|s| s.active).unwrap_or(0),
        ),
        Datapoint::counter(
            "kubernetes.job.failed",
            &dims,
            status.and_then(|s| s.failed).unwrap_or(0),
        ),
        Datapoint::counter(
            "kubernetes.job.succeeded",
            &dims,
            status.and_then(|s| s.succeeded).unwrap_or(0),
        ),
    ];

    let (props, tags) = workload_properties(meta, ResourceKind::Job);
    Ok(DerivedRecord::from_parts(
        datapoints,
        DimProperties::new("kubernetes_uid", uid, props, tags),
    ))
}

pub(crate) fn derive_cron_job(cron: &CronJob) -> Result<Option<DerivedRecord>, HandlerError> {
    let meta = &cron.metadata;
    let uid = require_uid(meta, ResourceKind::CronJob)?;

    let active = cron
        .status
        .as_ref()
        .and_then(|status| status.active.as_ref())
        .map_or(0, Vec::len);
    let dims = base_dimensions(meta, uid);
    let datapoints = vec![Datapoint::gauge(
        "kubernetes.cronjob.active",
        &dims,
        i64::try_from(active).unwrap_or(i64::MAX),
    )];

    let (mut props, tags) = workload_properties(meta, ResourceKind::CronJob);
    if let Some(spec) = cron.spec.as_ref() {
        props.insert("schedule".to_string(), spec.schedule.clone());
        props.insert(
            "concurrency_policy".to_string(),
            spec.concurrency_policy
                .clone()
                .unwrap_or_else(|| "Allow".to_string()),
        );
        props.insert(
            "suspended".to_string(),
            spec.suspend.unwrap_or(false).to_string(),
        );
    }

    Ok(DerivedRecord::from_parts(
        datapoints,
        DimProperties::new("kubernetes_uid", uid, props, tags),
    ))
}
