//! Azure instance metadata client
//!
//! The metadata service is only reachable from inside an Azure VM; anywhere
//! else the request times out after one second.

use crate::error::HostIdError;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Instance metadata endpoint, pinned to the API version the document shape
/// below was written against.
pub const AZURE_METADATA_URL: &str =
    "http://169.254.169.254/metadata/instance?api-version=2018-10-01";

const METADATA_TIMEOUT: Duration = Duration::from_secs(1);

/// The parts of the instance metadata document used to build the host ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AzureInstanceMetadata {
    /// The `compute` section
    #[serde(default)]
    pub compute: AzureComputeMetadata,
}

/// VM placement fields from the `compute` section; absent fields are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AzureComputeMetadata {
    /// Azure subscription ID
    pub subscription_id: String,
    /// Resource group containing the VM
    pub resource_group_name: String,
    /// VM name (`<scale-set>_<instance>` for scale set members)
    pub name: String,
    /// Scale set name, empty for standalone VMs
    pub vm_scale_set_name: String,
}

impl AzureInstanceMetadata {
    /// Builds the unique ID of the VM, or `None` if the document does not
    /// carry enough information.
    ///
    /// Scale set members are named `<scale-set>_<instance>`; the scale set
    /// prefix is removed once to get the instance part.
    #[must_use]
    pub fn unique_id(&self) -> Option<String> {
        let c = &self.compute;
        if c.subscription_id.is_empty() || c.resource_group_name.is_empty() || c.name.is_empty() {
            return None;
        }

        if c.vm_scale_set_name.is_empty() {
            return Some(format!(
                "{}/{}/microsoft.compute/virtualmachines/{}",
                c.subscription_id, c.resource_group_name, c.name
            ));
        }

        let prefix = format!("{}_", c.vm_scale_set_name);
        let instance = c.name.strip_prefix(&prefix).unwrap_or(&c.name);
        if instance.is_empty() {
            return None;
        }

        Some(format!(
            "{}/{}/microsoft.compute/virtualmachinescalesets/{}/virtualmachines/{}",
            c.subscription_id, c.resource_group_name, c.vm_scale_set_name, instance
        ))
    }
}

/// Parses a raw metadata response body and builds the unique ID from it.
pub fn unique_id_from_metadata(body: &str) -> Result<Option<String>, HostIdError> {
    let metadata: AzureInstanceMetadata = serde_json::from_str(body)?;
    Ok(metadata.unique_id())
}

/// Client for the Azure instance metadata service.
#[derive(Debug, Clone)]
pub struct AzureMetadataClient {
    client: Client,
    url: String,
}

impl AzureMetadataClient {
    /// Create a client for the well-known metadata endpoint
    pub fn new() -> Result<Self, HostIdError> {
        Self::with_url(AZURE_METADATA_URL)
    }

    /// Create a client for a custom endpoint
    pub fn with_url(url: impl Into<String>) -> Result<Self, HostIdError> {
        let client = Client::builder().timeout(METADATA_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Fetches the instance metadata document.
    pub async fn instance_metadata(&self) -> Result<AzureInstanceMetadata, HostIdError> {
        debug!("Querying Azure instance metadata at {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .header("Metadata", "true")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HostIdError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Unique ID of the VM this process runs on, if the metadata identifies one.
    pub async fn unique_id(&self) -> Result<Option<String>, HostIdError> {
        Ok(self.instance_metadata().await?.unique_id())
    }
}
