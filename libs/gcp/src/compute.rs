//! Compute Engine v1 REST client.
//!
//! Covers the instance operations the resize flow needs: get, stop, and
//! setMachineType. The mutating calls return the provider's long-running
//! operation envelope without awaiting it; whether the instance actually
//! reached the desired state is observed through subsequent gets.

use serde::{Deserialize, Serialize};
use tracing::debug;

use vmtailor_resize::InstanceStatus;

use crate::error::ApiError;
use crate::http::{build_http_client, handle_response};

/// Default Compute Engine API endpoint.
pub const DEFAULT_COMPUTE_URL: &str = "https://compute.googleapis.com";

/// Compute Engine API client.
#[derive(Debug, Clone)]
pub struct ComputeClient {
    client: reqwest::Client,
    base_url: String,
}

impl ComputeClient {
    /// Create a client against the default endpoint.
    pub fn new(token: &str) -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_COMPUTE_URL, token)
    }

    /// Create a client against a custom endpoint.
    pub fn with_base_url(base_url: impl Into<String>, token: &str) -> Result<Self, ApiError> {
        Ok(Self {
            client: build_http_client(token)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn instance_url(&self, project: &str, zone: &str, instance: &str) -> String {
        format!(
            "{}/compute/v1/projects/{}/zones/{}/instances/{}",
            self.base_url, project, zone, instance
        )
    }

    /// Fetch a single instance.
    pub async fn get_instance(
        &self,
        project: &str,
        zone: &str,
        instance: &str,
    ) -> Result<Instance, ApiError> {
        let url = self.instance_url(project, zone, instance);
        debug!(url = %url, "GET instance");

        let response = self.client.get(&url).send().await?;
        handle_response(response).await
    }

    /// Ask the provider to stop an instance.
    pub async fn stop_instance(
        &self,
        project: &str,
        zone: &str,
        instance: &str,
    ) -> Result<Operation, ApiError> {
        let url = format!("{}/stop", self.instance_url(project, zone, instance));
        debug!(url = %url, "POST instance stop");

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        handle_response(response).await
    }

    /// Change an instance's machine type. The instance must already be
    /// stopped; the API rejects the call otherwise.
    pub async fn set_machine_type(
        &self,
        project: &str,
        zone: &str,
        instance: &str,
        machine_type_path: &str,
    ) -> Result<Operation, ApiError> {
        let url = format!(
            "{}/setMachineType",
            self.instance_url(project, zone, instance)
        );
        debug!(url = %url, machine_type = %machine_type_path, "POST setMachineType");

        let body = SetMachineTypeRequest {
            machine_type: machine_type_path.to_string(),
        };
        let response = self.client.post(&url).json(&body).send().await?;
        handle_response(response).await
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SetMachineTypeRequest {
    machine_type: String,
}

/// A compute instance, reduced to the fields the toolkit reads.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub name: String,
    /// Lifecycle status. Values the enum does not know map to
    /// [`InstanceStatus::Unknown`].
    pub status: InstanceStatus,
    /// Full machine type URL, e.g. `.../zones/<zone>/machineTypes/e2-micro`.
    #[serde(default)]
    pub machine_type: String,
}

impl Instance {
    /// Bare machine type name, stripped of the URL prefix.
    pub fn machine_type_name(&self) -> &str {
        self.machine_type.rsplit('/').next().unwrap_or("")
    }
}

/// Long-running operation envelope returned by mutating calls.
///
/// The resize flow does not await operations; the fields are kept for
/// diagnostics.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub operation_type: String,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_deserializes_wire_format() {
        let json = r#"{
            "id": "4567890123456789",
            "name": "worker-1",
            "status": "RUNNING",
            "machineType": "https://www.googleapis.com/compute/v1/projects/p1/zones/us-central1-a/machineTypes/e2-medium",
            "zone": "https://www.googleapis.com/compute/v1/projects/p1/zones/us-central1-a"
        }"#;

        let instance: Instance = serde_json::from_str(json).unwrap();
        assert_eq!(instance.name, "worker-1");
        assert_eq!(instance.status, InstanceStatus::Running);
        assert_eq!(instance.machine_type_name(), "e2-medium");
    }

    #[test]
    fn test_unrecognized_status_maps_to_unknown() {
        let json = r#"{"name": "worker-1", "status": "DEFRAGMENTING"}"#;
        let instance: Instance = serde_json::from_str(json).unwrap();
        assert_eq!(instance.status, InstanceStatus::Unknown);
        assert_eq!(instance.machine_type_name(), "");
    }

    #[test]
    fn test_set_machine_type_body_uses_camel_case() {
        let body = SetMachineTypeRequest {
            machine_type: "zones/us-central1-a/machineTypes/e2-micro".to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"machineType": "zones/us-central1-a/machineTypes/e2-micro"})
        );
    }
}
