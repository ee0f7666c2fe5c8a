//! Watch orchestration.
//!
//! The `Orchestrator` owns one watch loop per planned resource kind, all
//! feeding the same [`MetricsCache`] and all sharing one cancellation token.

use crate::config::{ClusterStateConfig, KubernetesDistribution};
use crate::error::ControllerError;
use crate::watcher::watch_kind;
use cluster_metrics::{ClusterObject, MetricsCache, ResourceEventAdapter, ResourceKind};
use crds::ClusterResourceQuota;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::{
    Namespace, Node, Pod, ReplicationController, ResourceQuota, Service,
};
use k8s_openapi::NamespaceResourceScope;
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use std::fmt::{self, Debug};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// One watch loop to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchPlan {
    /// Kind to watch
    pub kind: ResourceKind,
    /// Namespace restriction; `None` watches cluster-wide.
    pub namespace: Option<String>,
    /// Interval between full relists
    pub relist: Duration,
}

/// Decides which kinds to watch, where, and how often to relist.
///
/// Namespaced kinds follow the namespace filter. Nodes and namespaces are only
/// watched without a filter. Cluster resource quotas are OpenShift-only and
/// always cluster-wide.
#[must_use]
pub fn plan_watches(config: &ClusterStateConfig) -> Vec<WatchPlan> {
    let namespace = config.namespace_filter();

    ResourceKind::ALL
        .iter()
        .copied()
        .filter_map(|kind| {
            let scope = match kind {
                ResourceKind::ClusterResourceQuota
                    if config.distribution != KubernetesDistribution::OpenShift =>
                {
                    return None;
                }
                ResourceKind::ClusterResourceQuota => None,
                _ if kind.is_namespaced() => namespace.map(str::to_string),
                _ if namespace.is_some() => return None,
                _ => None,
            };
            Some(WatchPlan {
                kind,
                namespace: scope,
                relist: config.relist_interval(kind),
            })
        })
        .collect()
}

type WatchHandle = JoinHandle<Result<(), ControllerError>>;

/// Starts, stops and joins the per-kind watch loops.
pub struct Orchestrator {
    client: Client,
    cache: Arc<MetricsCache>,
    plans: Vec<WatchPlan>,
    cancel: CancellationToken,
    watchers: Vec<(ResourceKind, WatchHandle)>,
    started: bool,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("plans", &self.plans)
            .field("watchers", &self.watchers.len())
            .field("started", &self.started)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Plans the watches for `config`; nothing runs until [`Orchestrator::start`].
    pub fn new(client: Client, cache: Arc<MetricsCache>, config: &ClusterStateConfig) -> Self {
        Self {
            client,
            cache,
            plans: plan_watches(config),
            cancel: CancellationToken::new(),
            watchers: Vec::new(),
            started: false,
        }
    }

    /// Spawns every planned watch loop. Can only be called once.
    pub fn start(&mut self) -> Result<(), ControllerError> {
        if self.started {
            return Err(ControllerError::AlreadyStarted);
        }
        self.started = true;

        info!("Starting {} resource watchers", self.plans.len());
        for plan in &self.plans {
            info!(
                "  {} in {}",
                plan.kind,
                plan.namespace.as_deref().unwrap_or("all namespaces")
            );
            let handle = self.spawn_watch(plan);
            self.watchers.push((plan.kind, handle));
        }
        Ok(())
    }

    /// Signals every loop to stop without waiting for them.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Stops every loop and waits until all of them have exited.
    ///
    /// Returns the first failure if any loop ended with an error or panicked.
    pub async fn shutdown(mut self) -> Result<(), ControllerError> {
        self.stop();
        info!("Waiting for {} watchers to exit", self.watchers.len());

        let mut first_error = None;
        for (kind, handle) in self.watchers.drain(..) {
            let result = match handle.await {
                Ok(result) => result,
                Err(join_error) => Err(ControllerError::Watch(format!(
                    "{kind} watcher task failed: {join_error}"
                ))),
            };
            match result {
                Ok(()) => debug!("{} watcher exited", kind),
                Err(e) => {
                    error!("{} watcher exited with error: {}", kind, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        info!("All watchers stopped");
        first_error.map_or(Ok(()), Err)
    }

    fn spawn_watch(&self, plan: &WatchPlan) -> WatchHandle {
        let client = self.client.clone();
        let namespace = plan.namespace.as_deref();
        let adapter = ResourceEventAdapter::new(plan.kind, Arc::clone(&self.cache));
        let relist = plan.relist;
        let cancel = self.cancel.clone();

        match plan.kind {
            ResourceKind::Pod => {
                spawn_namespaced::<Pod>(client, namespace, adapter, relist, cancel)
            }
            ResourceKind::Deployment => {
                spawn_namespaced::<Deployment>(client, namespace, adapter, relist, cancel)
            }
            ResourceKind::DaemonSet => {
                spawn_namespaced::<DaemonSet>(client, namespace, adapter, relist, cancel)
            }
            ResourceKind::ReplicaSet => {
                spawn_namespaced::<ReplicaSet>(client, namespace, adapter, relist, cancel)
            }
            ResourceKind::ReplicationController => spawn_namespaced::<ReplicationController>(
                client, namespace, adapter, relist, cancel,
            ),
            ResourceKind::StatefulSet => {
                spawn_namespaced::<StatefulSet>(client, namespace, adapter, relist, cancel)
            }
            ResourceKind::Job => {
                spawn_namespaced::<Job>(client, namespace, adapter, relist, cancel)
            }
            ResourceKind::CronJob => {
                spawn_namespaced::<CronJob>(client, namespace, adapter, relist, cancel)
            }
            ResourceKind::Service => {
                spawn_namespaced::<Service>(client, namespace, adapter, relist, cancel)
            }
            ResourceKind::ResourceQuota => {
                spawn_namespaced::<ResourceQuota>(client, namespace, adapter, relist, cancel)
            }
            ResourceKind::Node => spawn_cluster::<Node>(client, adapter, relist, cancel),
            ResourceKind::Namespace => {
                spawn_cluster::<Namespace>(client, adapter, relist, cancel)
            }
            ResourceKind::ClusterResourceQuota => {
                spawn_cluster::<ClusterResourceQuota>(client, adapter, relist, cancel)
            }
        }
    }
}

fn spawn_namespaced<K>(
    client: Client,
    namespace: Option<&str>,
    adapter: ResourceEventAdapter,
    relist: Duration,
    cancel: CancellationToken,
) -> WatchHandle
where
    K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    K::DynamicType: Default,
    ClusterObject: From<K>,
{
    let api: Api<K> = match namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    };
    tokio::spawn(watch_kind(api, adapter, relist, cancel))
}

fn spawn_cluster<K>(
    client: Client,
    adapter: ResourceEventAdapter,
    relist: Duration,
    cancel: CancellationToken,
) -> WatchHandle
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    K::DynamicType: Default,
    ClusterObject: From<K>,
{
    let api: Api<K> = Api::all(client);
    tokio::spawn(watch_kind(api, adapter, relist, cancel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_RELIST_INTERVAL;
    use crate::test_utils::unresponsive_client;

    fn kinds(plans: &[WatchPlan]) -> Vec<ResourceKind> {
        plans.iter().map(|p| p.kind).collect()
    }

    #[test]
    fn test_plan_all_namespaces_on_kubernetes() {
        let plans = plan_watches(&ClusterStateConfig::default());
        let planned = kinds(&plans);

        assert_eq!(planned.len(), ResourceKind::ALL.len() - 1);
        assert!(planned.contains(&ResourceKind::Node));
        assert!(planned.contains(&ResourceKind::Namespace));
        assert!(!planned.contains(&ResourceKind::ClusterResourceQuota));
        assert!(plans.iter().all(|p| p.namespace.is_none()));
        assert!(plans.iter().all(|p| p.relist == DEFAULT_RELIST_INTERVAL));
    }

    #[test]
    fn test_plan_with_namespace_filter() {
        let config = ClusterStateConfig {
            namespace: Some("team-a".to_string()),
            ..Default::default()
        };
        let plans = plan_watches(&config);
        let planned = kinds(&plans);

        assert!(!planned.contains(&ResourceKind::Node));
        assert!(!planned.contains(&ResourceKind::Namespace));
        assert!(planned.contains(&ResourceKind::Pod));
        assert!(plans
            .iter()
            .all(|p| p.namespace.as_deref() == Some("team-a")));
    }

    #[test]
    fn test_plan_openshift_quotas_stay_cluster_wide() {
        let config = ClusterStateConfig {
            distribution: KubernetesDistribution::OpenShift,
            namespace: Some("team-a".to_string()),
            ..Default::default()
        };
        let plans = plan_watches(&config);

        let quota = plans
            .iter()
            .find(|p| p.kind == ResourceKind::ClusterResourceQuota)
            .expect("cluster quotas are watched on OpenShift");
        assert_eq!(quota.namespace, None);
    }

    #[test]
    fn test_plan_uses_per_kind_relist() {
        let config = ClusterStateConfig {
            relist_interval_seconds: 90,
            relist_overrides: [(ResourceKind::Pod, 15)].into(),
            ..Default::default()
        };
        let plans = plan_watches(&config);

        for plan in &plans {
            let expected = if plan.kind == ResourceKind::Pod { 15 } else { 90 };
            assert_eq!(plan.relist, Duration::from_secs(expected), "{}", plan.kind);
        }
    }

    fn orchestrator(config: &ClusterStateConfig) -> Orchestrator {
        Orchestrator::new(unresponsive_client(), Arc::new(MetricsCache::default()), config)
    }

    #[tokio::test]
    async fn test_start_is_single_use_and_shutdown_joins() {
        let config = ClusterStateConfig::default();
        let planned = plan_watches(&config).len();
        let mut orchestrator = orchestrator(&config);

        orchestrator.start().expect("first start succeeds");
        assert_eq!(orchestrator.watchers.len(), planned);

        assert!(matches!(
            orchestrator.start(),
            Err(ControllerError::AlreadyStarted)
        ));
        assert_eq!(orchestrator.watchers.len(), planned);

        let result = tokio::time::timeout(Duration::from_secs(5), orchestrator.shutdown())
            .await
            .expect("shutdown joins every watcher");
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_stop_ends_every_watcher() {
        let config = ClusterStateConfig {
            distribution: KubernetesDistribution::OpenShift,
            ..Default::default()
        };
        let mut orchestrator = orchestrator(&config);
        orchestrator.start().expect("start succeeds");
        assert!(orchestrator.watchers.iter().all(|(_, handle)| !handle.is_finished()));

        orchestrator.stop();
        tokio::time::timeout(Duration::from_secs(5), async {
            while !orchestrator
                .watchers
                .iter()
                .all(|(_, handle)| handle.is_finished())
            {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("every watcher exits after stop");

        assert!(matches!(
            orchestrator.start(),
            Err(ControllerError::AlreadyStarted)
        ));
        assert!(orchestrator.shutdown().await.is_ok());
    }

    async fn crashing_watch() -> Result<(), ControllerError> {
        panic!("watch loop crashed")
    }

    #[tokio::test]
    async fn test_shutdown_reports_panicked_watcher() {
        let mut orchestrator = orchestrator(&ClusterStateConfig::default());
        orchestrator
            .watchers
            .push((ResourceKind::Pod, tokio::spawn(crashing_watch())));
        orchestrator
            .watchers
            .push((ResourceKind::Service, tokio::spawn(async { Ok(()) })));

        match orchestrator.shutdown().await {
            Err(ControllerError::Watch(message)) => assert!(message.contains("Pod"), "{message}"),
            other => panic!("expected a watch failure, got {other:?}"),
        }
    }
}
