//! Cluster State Controller
//!
//! Watches cluster resources (pods, workloads, nodes, namespaces, services,
//! quotas) and keeps a cache of metrics and dimension properties derived from
//! their current state. The cache is reconciled on every event and fully
//! resynced on every relist, so it never holds objects the cluster no longer
//! has.

mod backoff;
mod config;
mod controller;
mod error;
mod watcher;

#[cfg(test)]
mod test_utils;

use crate::config::ClusterStateConfig;
use crate::controller::Orchestrator;
use crate::error::ControllerError;
use cluster_metrics::{DerivedRecord, HandlerRegistry, MetricsCache};
use host_id::AzureMetadataClient;
use kube::Client;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Cluster State Controller");

    let config = ClusterStateConfig::load()?;
    info!("Configuration:");
    info!("  Distribution: {:?}", config.distribution);
    info!(
        "  Namespace: {}",
        config.namespace_filter().unwrap_or("all namespaces")
    );
    info!("  Snapshot interval: {:?}", config.snapshot_interval());

    probe_host_identity().await;

    let client = Client::try_default().await?;

    let planned = controller::plan_watches(&config);
    let cache = Arc::new(MetricsCache::new(HandlerRegistry::for_kinds(
        planned.iter().map(|plan| plan.kind),
    )));

    let mut orchestrator = Orchestrator::new(client, Arc::clone(&cache), &config);
    orchestrator.start()?;

    let mut ticker = tokio::time::interval(config.snapshot_interval());
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Received shutdown signal");
                break;
            }
            _ = ticker.tick() => report_snapshot(&cache.snapshot()),
        }
    }

    orchestrator.shutdown().await?;
    info!("Cluster State Controller stopped");
    Ok(())
}

async fn probe_host_identity() {
    let client = match AzureMetadataClient::new() {
        Ok(client) => client,
        Err(e) => {
            warn!("Failed to build Azure metadata client: {}", e);
            return;
        }
    };
    match client.unique_id().await {
        Ok(Some(id)) => info!("Running on Azure host {}", id),
        Ok(None) => debug!("Azure metadata did not identify this host"),
        Err(e) => debug!("Azure metadata service not available: {}", e),
    }
}

fn report_snapshot(records: &[DerivedRecord]) {
    let datapoints: usize = records.iter().map(|r| r.datapoints.len()).sum();
    let dim_props = records.iter().filter(|r| r.dim_props.is_some()).count();
    info!(
        "Cache snapshot: {} objects, {} datapoints, {} dimension updates",
        records.len(),
        datapoints,
        dim_props
    );

    match serde_json::to_string(records) {
        Ok(body) => debug!("Cache snapshot body: {}", body),
        Err(e) => warn!("Failed to serialize cache snapshot: {}", e),
    }
}
