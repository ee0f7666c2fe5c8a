//! Controller configuration.
//!
//! Loaded from an optional YAML file (`CONFIG_PATH`) and then overridden by
//! environment variables:
//! - `WATCH_NAMESPACE`: restrict namespaced kinds to one namespace
//! - `KUBERNETES_DISTRIBUTION`: `kubernetes` (default) or `openshift`
//! - `RELIST_INTERVAL_SECONDS`: default full relist interval (0 = built-in default)
//! - `SNAPSHOT_INTERVAL_SECONDS`: how often the cache snapshot is reported

use crate::error::ControllerError;
use cluster_metrics::ResourceKind;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Relist interval used when none is configured.
pub const DEFAULT_RELIST_INTERVAL: Duration = Duration::from_secs(300);

/// Flavor of the cluster; OpenShift adds cluster resource quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KubernetesDistribution {
    #[default]
    Kubernetes,
    #[serde(rename = "openshift")]
    OpenShift,
}

impl FromStr for KubernetesDistribution {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kubernetes" => Ok(KubernetesDistribution::Kubernetes),
            "openshift" => Ok(KubernetesDistribution::OpenShift),
            other => Err(ControllerError::InvalidConfig(format!(
                "unknown Kubernetes distribution {other:?} (expected \"kubernetes\" or \"openshift\")"
            ))),
        }
    }
}

/// Configuration for the cluster state controller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ClusterStateConfig {
    /// Cluster distribution flavor
    pub distribution: KubernetesDistribution,

    /// Namespace restriction; unset or empty means all namespaces
    pub namespace: Option<String>,

    /// Default relist interval in seconds (0 = [`DEFAULT_RELIST_INTERVAL`])
    pub relist_interval_seconds: u64,

    /// Per-kind relist intervals in seconds, keyed by plural resource name
    pub relist_overrides: BTreeMap<ResourceKind, u64>,

    /// Seconds between cache snapshot reports
    pub snapshot_interval_seconds: u64,
}

impl Default for ClusterStateConfig {
    fn default() -> Self {
        Self {
            distribution: KubernetesDistribution::Kubernetes,
            namespace: None,
            relist_interval_seconds: 0,
            relist_overrides: BTreeMap::new(),
            snapshot_interval_seconds: 10,
        }
    }
}

impl ClusterStateConfig {
    /// Loads configuration from the process environment.
    pub fn load() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration using `lookup` in place of the environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ControllerError> {
        let mut config = match lookup("CONFIG_PATH") {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        if let Some(namespace) = lookup("WATCH_NAMESPACE") {
            config.namespace = Some(namespace);
        }
        if let Some(distribution) = lookup("KUBERNETES_DISTRIBUTION") {
            config.distribution = distribution.parse()?;
        }
        if let Some(seconds) = lookup("RELIST_INTERVAL_SECONDS") {
            config.relist_interval_seconds = parse_seconds("RELIST_INTERVAL_SECONDS", &seconds)?;
        }
        if let Some(seconds) = lookup("SNAPSHOT_INTERVAL_SECONDS") {
            config.snapshot_interval_seconds =
                parse_seconds("SNAPSHOT_INTERVAL_SECONDS", &seconds)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parses a YAML configuration document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ControllerError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ControllerError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ControllerError::ConfigFile {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    fn validate(&self) -> Result<(), ControllerError> {
        if self.snapshot_interval_seconds == 0 {
            return Err(ControllerError::InvalidConfig(
                "snapshotIntervalSeconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The namespace to restrict namespaced kinds to, if any.
    #[must_use]
    pub fn namespace_filter(&self) -> Option<&str> {
        self.namespace.as_deref().filter(|ns| !ns.is_empty())
    }

    /// Full relist interval for `kind`.
    #[must_use]
    pub fn relist_interval(&self, kind: ResourceKind) -> Duration {
        let seconds = self
            .relist_overrides
            .get(&kind)
            .copied()
            .unwrap_or(self.relist_interval_seconds);
        if seconds == 0 {
            DEFAULT_RELIST_INTERVAL
        } else {
            Duration::from_secs(seconds)
        }
    }

    #[must_use]
    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_secs(self.snapshot_interval_seconds)
    }
}

fn parse_seconds(name: &str, value: &str) -> Result<u64, ControllerError> {
    value.trim().parse().map_err(|e| {
        ControllerError::InvalidConfig(format!("{name} must be a whole number of seconds: {e}"))
    })
}
