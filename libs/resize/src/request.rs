//! Resize request construction and validation.

use serde::{Deserialize, Serialize};

use crate::error::RequestError;

/// A request to change the machine type of a single instance.
///
/// Immutable once constructed. One request corresponds to one
/// orchestration run and is discarded with its outcome; the only state
/// that survives a run is whatever the provider retains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeRequest {
    /// Project that owns the instance.
    pub project: String,

    /// Zone the instance lives in, e.g. `us-central1-a`.
    pub zone: String,

    /// Instance name.
    pub instance: String,

    /// Target machine type, e.g. `e2-micro`.
    pub target_machine_type: String,
}

impl ResizeRequest {
    /// Create a new resize request.
    pub fn new(
        project: impl Into<String>,
        zone: impl Into<String>,
        instance: impl Into<String>,
        target_machine_type: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            zone: zone.into(),
            instance: instance.into(),
            target_machine_type: target_machine_type.into(),
        }
    }

    /// Validate all fields.
    ///
    /// Every field must be non-empty and the target machine type must
    /// match the provider's naming grammar.
    pub fn validate(&self) -> Result<(), RequestError> {
        required("project", &self.project)?;
        required("zone", &self.zone)?;
        required("instance", &self.instance)?;
        required("target machine type", &self.target_machine_type)?;

        if !is_valid_machine_type(&self.target_machine_type) {
            return Err(RequestError::InvalidMachineType {
                value: self.target_machine_type.clone(),
            });
        }

        Ok(())
    }

    /// Zone-qualified machine type path in the exact form the provider
    /// expects: `zones/<zone>/machineTypes/<type>`.
    pub fn machine_type_path(&self) -> String {
        format!(
            "zones/{}/machineTypes/{}",
            self.zone, self.target_machine_type
        )
    }
}

impl std::fmt::Display for ResizeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{} -> {}",
            self.project, self.zone, self.instance, self.target_machine_type
        )
    }
}

fn required(field: &'static str, value: &str) -> Result<(), RequestError> {
    if value.is_empty() {
        Err(RequestError::EmptyField { field })
    } else {
        Ok(())
    }
}

/// Machine type names are lowercase alphanumeric segments separated by
/// `-`, at least two segments, first segment starting with a letter
/// (`e2-micro`, `n2-standard-4`).
fn is_valid_machine_type(value: &str) -> bool {
    let mut segments = 0u32;
    for segment in value.split('-') {
        if segment.is_empty() {
            return false;
        }
        if !segment
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return false;
        }
        segments += 1;
    }

    segments >= 2 && value.starts_with(|c: char| c.is_ascii_lowercase())
}

// =============================================================================
// Tests
// =============================================================================
