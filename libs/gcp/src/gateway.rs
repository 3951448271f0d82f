//! [`ComputeGateway`] implementation backed by the Compute Engine API.

use anyhow::Result;
use async_trait::async_trait;

use vmtailor_resize::{ComputeGateway, InstanceStatus};

use crate::compute::ComputeClient;
use crate::error::ApiError;

/// Gateway adapter over [`ComputeClient`].
///
/// Classification: transport failures, rate limiting, and 5xx responses
/// are transient; a 400 reporting the instance as not running marks a
/// stop as an idempotent no-op.
pub struct GcpComputeGateway {
    client: ComputeClient,
}

impl GcpComputeGateway {
    pub fn new(client: ComputeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ComputeGateway for GcpComputeGateway {
    async fn get_status(
        &self,
        project: &str,
        zone: &str,
        instance: &str,
    ) -> Result<InstanceStatus> {
        let details = self.client.get_instance(project, zone, instance).await?;
        Ok(details.status)
    }

    async fn stop(&self, project: &str, zone: &str, instance: &str) -> Result<()> {
        self.client.stop_instance(project, zone, instance).await?;
        Ok(())
    }

    async fn set_machine_type(
        &self,
        project: &str,
        zone: &str,
        instance: &str,
        machine_type_path: &str,
    ) -> Result<()> {
        self.client
            .set_machine_type(project, zone, instance, machine_type_path)
            .await?;
        Ok(())
    }

    fn is_idempotent_noop(&self, error: &anyhow::Error) -> bool {
        error
            .downcast_ref::<ApiError>()
            .map(ApiError::is_stop_noop)
            .unwrap_or(false)
    }

    fn is_transient(&self, error: &anyhow::Error) -> bool {
        error
            .downcast_ref::<ApiError>()
            .map(ApiError::is_transient)
            .unwrap_or(false)
    }
}
