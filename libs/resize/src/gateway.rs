//! Compute gateway interface and mock implementation.
//!
//! The gateway abstracts the provider control-plane operations the
//! orchestrator needs:
//! - Reading instance status
//! - Stopping an instance
//! - Changing an instance's machine type
//!
//! A mock implementation is provided for testing and development.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::status::InstanceStatus;

/// Provider control-plane operations used by the orchestrator.
///
/// Each call is synchronous from the orchestrator's viewpoint: when a
/// call returns Ok, the provider has accepted the operation. Errors are
/// opaque at this seam; the predicate pair below is the only
/// classification applied to them, and each adapter supplies it for its
/// provider.
#[async_trait]
pub trait ComputeGateway: Send + Sync {
    /// Fetch the current status of an instance.
    async fn get_status(
        &self,
        project: &str,
        zone: &str,
        instance: &str,
    ) -> Result<InstanceStatus>;

    /// Request that an instance stop.
    async fn stop(&self, project: &str, zone: &str, instance: &str) -> Result<()>;

    /// Change an instance's machine type. `machine_type_path` is the
    /// zone-qualified path, `zones/<zone>/machineTypes/<type>`.
    async fn set_machine_type(
        &self,
        project: &str,
        zone: &str,
        instance: &str,
        machine_type_path: &str,
    ) -> Result<()>;

    /// Whether an error from `stop` means the instance was already
    /// stopping or stopped, so the flow can safely continue.
    fn is_idempotent_noop(&self, _error: &anyhow::Error) -> bool {
        false
    }

    /// Whether an error is worth retrying within the poll budget.
    fn is_transient(&self, _error: &anyhow::Error) -> bool {
        false
    }
}

/// Marker error for stop calls against an already-stopped instance.
///
/// Used with [`MockGateway`] to exercise the no-op classification path.
#[derive(Debug, thiserror::Error)]
#[error("instance is already stopped")]
pub struct AlreadyStoppedError;

/// Marker error for retryable provider failures.
///
/// Used with [`MockGateway`] to exercise the transient retry path.
#[derive(Debug, thiserror::Error)]
#[error("transient provider error")]
pub struct TransientError;

/// Mock gateway for testing and development.
///
/// Status checks consume a scripted sequence of results; once the script
/// is exhausted, the most recent successful status repeats (a fresh mock
/// with no script reports `Terminated`). Stop and resize calls succeed
/// unless errors are queued for them. All calls are counted and the
/// machine-type paths passed to resize calls are recorded.
pub struct MockGateway {
    statuses: Mutex<VecDeque<Result<InstanceStatus>>>,
    repeat_status: Mutex<InstanceStatus>,
    stop_errors: Mutex<VecDeque<anyhow::Error>>,
    resize_errors: Mutex<VecDeque<anyhow::Error>>,
    status_calls: AtomicU32,
    stop_calls: AtomicU32,
    resize_calls: AtomicU32,
    resize_paths: Mutex<Vec<String>>,
}

impl MockGateway {
    /// Mock whose instance is already `Terminated`.
    pub fn new() -> Self {
        Self {
            statuses: Mutex::new(VecDeque::new()),
            repeat_status: Mutex::new(InstanceStatus::Terminated),
            stop_errors: Mutex::new(VecDeque::new()),
            resize_errors: Mutex::new(VecDeque::new()),
            status_calls: AtomicU32::new(0),
            stop_calls: AtomicU32::new(0),
            resize_calls: AtomicU32::new(0),
            resize_paths: Mutex::new(Vec::new()),
        }
    }

    /// Mock that reports the given statuses on successive checks; the
    /// last one repeats once the script is exhausted.
    pub fn with_statuses(statuses: impl IntoIterator<Item = InstanceStatus>) -> Self {
        let mock = Self::new();
        for status in statuses {
            mock.push_status(status);
        }
        mock
    }

    /// Append a status to the script.
    pub fn push_status(&self, status: InstanceStatus) {
        self.statuses.lock().unwrap().push_back(Ok(status));
    }

    /// Append a status-check error to the script.
    pub fn push_status_error(&self, error: anyhow::Error) {
        self.statuses.lock().unwrap().push_back(Err(error));
    }

    /// Queue an error for an upcoming stop call.
    pub fn fail_stop(&self, error: anyhow::Error) {
        self.stop_errors.lock().unwrap().push_back(error);
    }

    /// Queue an error for an upcoming resize call.
    pub fn fail_resize(&self, error: anyhow::Error) {
        self.resize_errors.lock().unwrap().push_back(error);
    }

    /// Number of status checks made.
    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    /// Number of stop calls made.
    pub fn stop_calls(&self) -> u32 {
        self.stop_calls.load(Ordering::SeqCst)
    }

    /// Number of resize calls made.
    pub fn resize_calls(&self) -> u32 {
        self.resize_calls.load(Ordering::SeqCst)
    }

    /// Machine-type paths passed to resize calls, in order.
    pub fn resize_paths(&self) -> Vec<String> {
        self.resize_paths.lock().unwrap().clone()
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ComputeGateway for MockGateway {
    async fn get_status(
        &self,
        _project: &str,
        _zone: &str,
        instance: &str,
    ) -> Result<InstanceStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);

        let next = self.statuses.lock().unwrap().pop_front();
        match next {
            Some(Ok(status)) => {
                *self.repeat_status.lock().unwrap() = status;
                debug!(instance = %instance, status = %status, "[MOCK] Instance status");
                Ok(status)
            }
            Some(Err(e)) => {
                debug!(instance = %instance, error = %e, "[MOCK] Status check failed");
                Err(e)
            }
            None => {
                let status = *self.repeat_status.lock().unwrap();
                debug!(instance = %instance, status = %status, "[MOCK] Instance status");
                Ok(status)
            }
        }
    }

    async fn stop(&self, _project: &str, _zone: &str, instance: &str) -> Result<()> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(e) = self.stop_errors.lock().unwrap().pop_front() {
            debug!(instance = %instance, error = %e, "[MOCK] Stop failed");
            return Err(e);
        }

        debug!(instance = %instance, "[MOCK] Stopping instance");
        Ok(())
    }

    async fn set_machine_type(
        &self,
        _project: &str,
        _zone: &str,
        instance: &str,
        machine_type_path: &str,
    ) -> Result<()> {
        self.resize_calls.fetch_add(1, Ordering::SeqCst);
        self.resize_paths
            .lock()
            .unwrap()
            .push(machine_type_path.to_string());

        if let Some(e) = self.resize_errors.lock().unwrap().pop_front() {
            debug!(instance = %instance, error = %e, "[MOCK] Machine type change failed");
            return Err(e);
        }

        debug!(
            instance = %instance,
            machine_type_path = %machine_type_path,
            "[MOCK] Changing machine type"
        );
        Ok(())
    }

    fn is_idempotent_noop(&self, error: &anyhow::Error) -> bool {
        error.downcast_ref::<AlreadyStoppedError>().is_some()
    }

    fn is_transient(&self, error: &anyhow::Error) -> bool {
        error.downcast_ref::<TransientError>().is_some()
    }
}
