//! Controller-specific error types.
//!
//! Per-object derivation failures never surface here; they are logged and
//! skipped inside the cache. These errors cover startup, configuration and
//! watch task supervision.

use thiserror::Error;
use kube::Error as KubeError;

/// Errors that can occur in the cluster state controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read
    #[error("Failed to read configuration file {path}: {source}")]
    ConfigFile {
        path: String,
        source: std::io::Error,
    },

    /// Configuration file is not valid YAML for the expected schema
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// The orchestrator was started twice
    #[error("Watch orchestrator already started")]
    AlreadyStarted,

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
