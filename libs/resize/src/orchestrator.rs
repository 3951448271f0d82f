//! The resize state machine.
//!
//! Drives a single instance through stop, poll-until-stopped, and
//! set-machine-type against a [`ComputeGateway`], with bounded polling,
//! tolerance for already-stopped instances, and prompt cancellation.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::gateway::ComputeGateway;
use crate::outcome::{FailureCause, ResizeOutcome, ResizeStage};
use crate::policy::{PollBudget, PollPolicy};
use crate::request::ResizeRequest;
use crate::status::InstanceStatus;

/// Orchestrates machine-type changes through a [`ComputeGateway`].
///
/// Each [`resize`](Self::resize) call is a single-instance, single-task
/// run: no internal parallelism and no shared state between runs.
/// Concurrent runs against different instances are independent; callers
/// must not issue overlapping runs for the same instance.
pub struct ResizeOrchestrator<G> {
    gateway: G,
}

impl<G: ComputeGateway> ResizeOrchestrator<G> {
    /// Create an orchestrator over the given gateway.
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// Access the underlying gateway.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Run a resize to completion.
    ///
    /// Validates the request, issues the stop, polls until the instance
    /// reaches `TERMINATED` or the poll budget runs out, then issues the
    /// machine-type change. Always returns a terminal [`ResizeOutcome`];
    /// no gateway call is made after the outcome is produced.
    ///
    /// Sending `true` on `cancel` aborts the run within one poll
    /// interval. Re-invoking after a timeout or a stop-stage failure is
    /// safe: a stop reported as a no-op by the gateway (instance already
    /// stopping or stopped) is treated as success.
    pub async fn resize(
        &self,
        request: &ResizeRequest,
        policy: &PollPolicy,
        mut cancel: watch::Receiver<bool>,
    ) -> ResizeOutcome {
        if let Err(e) = request.validate() {
            debug!(error = %e, "Rejecting invalid resize request");
            return ResizeOutcome::Failed {
                stage: ResizeStage::Stop,
                cause: FailureCause::InvalidRequest(e),
            };
        }

        info!(
            project = %request.project,
            zone = %request.zone,
            instance = %request.instance,
            machine_type = %request.target_machine_type,
            "Stopping instance for resize"
        );

        if let Err(e) = self
            .gateway
            .stop(&request.project, &request.zone, &request.instance)
            .await
        {
            if self.gateway.is_idempotent_noop(&e) {
                warn!(
                    instance = %request.instance,
                    error = %e,
                    "Stop was a no-op, instance already stopping or stopped"
                );
            } else {
                return ResizeOutcome::Failed {
                    stage: ResizeStage::Stop,
                    cause: FailureCause::Gateway(e),
                };
            }
        }

        if let Err(outcome) = self.poll_until_stopped(request, policy, &mut cancel).await {
            return outcome;
        }

        let path = request.machine_type_path();
        info!(
            instance = %request.instance,
            machine_type_path = %path,
            "Instance stopped, changing machine type"
        );

        if let Err(e) = self
            .gateway
            .set_machine_type(&request.project, &request.zone, &request.instance, &path)
            .await
        {
            return ResizeOutcome::Failed {
                stage: ResizeStage::SetMachineType,
                cause: FailureCause::Gateway(e),
            };
        }

        info!(
            instance = %request.instance,
            machine_type = %request.target_machine_type,
            "Machine type changed"
        );

        ResizeOutcome::Succeeded {
            machine_type: request.target_machine_type.clone(),
        }
    }

    /// Poll until the instance reaches `TERMINATED`.
    ///
    /// Returns Err with the terminal outcome when the budget runs out,
    /// the run is cancelled, or a status check fails hard. Each status
    /// check consumes one budget attempt whether it succeeds or not.
    async fn poll_until_stopped(
        &self,
        request: &ResizeRequest,
        policy: &PollPolicy,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<(), ResizeOutcome> {
        let started = Instant::now();
        let mut attempts = 0u32;
        let mut transient_streak = 0u32;
        let mut last_status = InstanceStatus::Unknown;

        loop {
            if budget_exhausted(policy.budget, attempts, started.elapsed()) {
                info!(
                    instance = %request.instance,
                    attempts,
                    last_status = %last_status,
                    "Poll budget exhausted before instance stopped"
                );
                return Err(ResizeOutcome::TimedOut { last_status });
            }

            if !wait_interval(policy.interval, cancel).await {
                debug!(instance = %request.instance, "Resize cancelled while polling");
                return Err(ResizeOutcome::Failed {
                    stage: ResizeStage::PollStop,
                    cause: FailureCause::Cancelled,
                });
            }

            attempts += 1;
            match self
                .gateway
                .get_status(&request.project, &request.zone, &request.instance)
                .await
            {
                Ok(status) => {
                    transient_streak = 0;
                    last_status = status;
                    debug!(
                        instance = %request.instance,
                        attempt = attempts,
                        status = %status,
                        "Polled instance status"
                    );
                    if status.is_terminated() {
                        return Ok(());
                    }
                }
                Err(e) => {
                    if !self.gateway.is_transient(&e) {
                        return Err(ResizeOutcome::Failed {
                            stage: ResizeStage::PollStop,
                            cause: FailureCause::Gateway(e),
                        });
                    }
                    transient_streak += 1;
                    if transient_streak > policy.max_transient_polls {
                        warn!(
                            instance = %request.instance,
                            consecutive_failures = transient_streak,
                            "Giving up after repeated transient status-check failures"
                        );
                        return Err(ResizeOutcome::Failed {
                            stage: ResizeStage::PollStop,
                            cause: FailureCause::Gateway(e),
                        });
                    }
                    warn!(
                        instance = %request.instance,
                        error = %e,
                        consecutive_failures = transient_streak,
                        "Status check failed, will retry"
                    );
                }
            }
        }
    }
}

/// Sleep for `interval`, waking early on cancellation.
///
/// Returns false if cancellation was observed, true once the full
/// interval has elapsed. Cancellation already signalled at entry is
/// honored without sleeping.
async fn wait_interval(interval: Duration, cancel: &mut watch::Receiver<bool>) -> bool {
    if *cancel.borrow() {
        return false;
    }

    let sleep = tokio::time::sleep(interval);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            changed = cancel.changed() => {
                if changed.is_err() {
                    // Sender dropped: cancellation can no longer arrive.
                    sleep.as_mut().await;
                    return true;
                }
                if *cancel.borrow() {
                    return false;
                }
            }
        }
    }
}

fn budget_exhausted(budget: PollBudget, attempts: u32, elapsed: Duration) -> bool {
    match budget {
        PollBudget::MaxAttempts(max) => attempts >= max,
        PollBudget::MaxElapsed(max) => elapsed >= max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_exhausted_attempts() {
        let budget = PollBudget::MaxAttempts(3);
        assert!(!budget_exhausted(budget, 0, Duration::ZERO));
        assert!(!budget_exhausted(budget, 2, Duration::from_secs(100)));
        assert!(budget_exhausted(budget, 3, Duration::ZERO));
    }

    #[test]
    fn test_budget_exhausted_elapsed() {
        let budget = PollBudget::MaxElapsed(Duration::from_secs(10));
        assert!(!budget_exhausted(budget, 100, Duration::from_secs(9)));
        assert!(budget_exhausted(budget, 0, Duration::from_secs(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_interval_completes() {
        let (_cancel_tx, mut cancel_rx) = watch::channel(false);
        assert!(wait_interval(Duration::from_secs(1), &mut cancel_rx).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_interval_cancelled_before_entry() {
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        cancel_tx.send(true).unwrap();
        assert!(!wait_interval(Duration::from_secs(1), &mut cancel_rx).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_interval_survives_dropped_sender() {
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        drop(cancel_tx);
        assert!(wait_interval(Duration::from_secs(1), &mut cancel_rx).await);
    }
}
