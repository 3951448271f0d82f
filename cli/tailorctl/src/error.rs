//! Error handling, display, and exit codes for the CLI.

use colored::Colorize;
use thiserror::Error;

use vmtailor_gcp::ApiError;
use vmtailor_resize::{InstanceStatus, ResizeStage};

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Not authenticated. Run `vmt auth login` to authenticate.")]
    NotAuthenticated,

    #[error("resize timed out waiting for the instance to stop; last observed status {last_status}")]
    ResizeTimedOut { last_status: InstanceStatus },

    #[error("resize cancelled")]
    ResizeCancelled,

    #[error("resize failed at {stage}: {message}")]
    ResizeFailed { stage: ResizeStage, message: String },
}

/// Map an error to the process exit code.
///
/// 0 success, 1 failure, 2 timed out, 130 cancelled. Timed out gets its
/// own code so schedulers can re-run without treating it as fatal.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<CliError>() {
        Some(CliError::ResizeTimedOut { .. }) => 2,
        Some(CliError::ResizeCancelled) => 130,
        _ => 1,
    }
}

/// Print an error with a follow-up hint where one helps.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);

    if let Some(hint) = hint_for(err) {
        eprintln!("\n{}", format!("Hint: {hint}").yellow());
    }
}

fn hint_for(err: &anyhow::Error) -> Option<&'static str> {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return match cli_err {
            CliError::ResizeTimedOut { .. } => Some(
                "The stop may still be in progress. Re-running the same command resumes safely.",
            ),
            _ => None,
        };
    }

    match err.downcast_ref::<ApiError>()? {
        ApiError::Api { status: 401, .. } => {
            Some("The access token may have expired. Run `vmt auth login` with a fresh one.")
        }
        ApiError::Api { status: 403, .. } => {
            Some("The token may lack permission for this operation in this project.")
        }
        ApiError::Http(_) => {
            Some("Could not reach the API. Check the network and any VMT_COMPUTE_URL override.")
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let timeout: anyhow::Error = CliError::ResizeTimedOut {
            last_status: InstanceStatus::Stopping,
        }
        .into();
        assert_eq!(exit_code(&timeout), 2);

        let cancelled: anyhow::Error = CliError::ResizeCancelled.into();
        assert_eq!(exit_code(&cancelled), 130);

        let failed: anyhow::Error = CliError::ResizeFailed {
            stage: ResizeStage::Stop,
            message: "boom".to_string(),
        }
        .into();
        assert_eq!(exit_code(&failed), 1);

        let other = anyhow::anyhow!("anything else");
        assert_eq!(exit_code(&other), 1);
    }
}
