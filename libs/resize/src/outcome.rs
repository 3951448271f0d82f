//! Terminal outcomes of a resize run.

use crate::error::RequestError;
use crate::status::InstanceStatus;

/// Step of the resize flow an outcome refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeStage {
    /// Issuing the stop call.
    Stop,

    /// Polling for the instance to reach `TERMINATED`.
    PollStop,

    /// Issuing the machine-type change.
    SetMachineType,
}

impl ResizeStage {
    /// Human-readable stage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::PollStop => "poll-stop",
            Self::SetMachineType => "set-machine-type",
        }
    }
}

impl std::fmt::Display for ResizeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a resize run failed.
#[derive(Debug)]
pub enum FailureCause {
    /// The request failed validation; no gateway call was made.
    InvalidRequest(RequestError),

    /// A gateway call failed with an error that was not classified as
    /// retryable. Carries the original error for diagnostics.
    Gateway(anyhow::Error),

    /// The caller cancelled the run.
    Cancelled,
}

impl std::fmt::Display for FailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest(e) => write!(f, "invalid request: {e}"),
            Self::Gateway(e) => write!(f, "{e:#}"),
            Self::Cancelled => write!(f, "cancelled by caller"),
        }
    }
}

/// Terminal result of a resize run.
///
/// Timeouts are a first-class outcome rather than an error: the stop the
/// orchestrator issued may still complete on the provider side, and the
/// caller decides whether to re-invoke or abandon.
#[derive(Debug)]
pub enum ResizeOutcome {
    /// The machine type was changed.
    Succeeded {
        /// The applied target machine type.
        machine_type: String,
    },

    /// The instance never reached `TERMINATED` within the poll budget.
    /// Re-invoking the resize later is safe.
    TimedOut {
        /// Most recent successfully observed status (`Unknown` if no
        /// poll succeeded).
        last_status: InstanceStatus,
    },

    /// The run failed at `stage`.
    Failed {
        stage: ResizeStage,
        cause: FailureCause,
    },
}

impl ResizeOutcome {
    /// Returns true if the machine type was changed.
    pub fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Returns true if the poll budget ran out.
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }

    /// Returns true if the run failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Returns true if the run was cancelled by the caller.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Failed {
                cause: FailureCause::Cancelled,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_predicates() {
        let succeeded = ResizeOutcome::Succeeded {
            machine_type: "e2-micro".to_string(),
        };
        assert!(succeeded.is_succeeded());
        assert!(!succeeded.is_failed());

        let timed_out = ResizeOutcome::TimedOut {
            last_status: InstanceStatus::Stopping,
        };
        assert!(timed_out.is_timed_out());
        assert!(!timed_out.is_cancelled());

        let cancelled = ResizeOutcome::Failed {
            stage: ResizeStage::PollStop,
            cause: FailureCause::Cancelled,
        };
        assert!(cancelled.is_failed());
        assert!(cancelled.is_cancelled());
    }

    #[test]
    fn test_cause_display() {
        let cause = FailureCause::Gateway(anyhow::anyhow!("quota exceeded"));
        assert_eq!(cause.to_string(), "quota exceeded");

        assert_eq!(FailureCause::Cancelled.to_string(), "cancelled by caller");
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(ResizeStage::Stop.to_string(), "stop");
        assert_eq!(ResizeStage::PollStop.to_string(), "poll-stop");
        assert_eq!(ResizeStage::SetMachineType.to_string(), "set-machine-type");
    }
}
