//! Instance lifecycle status as reported by the compute provider.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a compute instance.
///
/// `Terminated` is the provider's "fully stopped" state: the instance
/// still exists and can be restarted or resized. It does not mean the
/// instance was deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceStatus {
    Provisioning,
    Staging,
    Running,
    Stopping,
    Stopped,
    Terminated,
    Suspending,
    Suspended,

    /// Any status string this crate does not recognize.
    #[serde(other)]
    Unknown,
}

impl InstanceStatus {
    /// Parse a provider status string. Unrecognized values map to
    /// `Unknown` rather than erroring, so new provider states cannot
    /// break a poll.
    pub fn parse(value: &str) -> Self {
        match value {
            "PROVISIONING" => Self::Provisioning,
            "STAGING" => Self::Staging,
            "RUNNING" => Self::Running,
            "STOPPING" => Self::Stopping,
            "STOPPED" => Self::Stopped,
            "TERMINATED" => Self::Terminated,
            "SUSPENDING" => Self::Suspending,
            "SUSPENDED" => Self::Suspended,
            _ => Self::Unknown,
        }
    }

    /// Canonical provider string for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Provisioning => "PROVISIONING",
            Self::Staging => "STAGING",
            Self::Running => "RUNNING",
            Self::Stopping => "STOPPING",
            Self::Stopped => "STOPPED",
            Self::Terminated => "TERMINATED",
            Self::Suspending => "SUSPENDING",
            Self::Suspended => "SUSPENDED",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Returns true if the instance is fully stopped.
    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated)
    }
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
