//! Instance commands (status and resize).

use std::time::Duration;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use tokio::sync::watch;

use vmtailor_gcp::GcpComputeGateway;
use vmtailor_resize::{
    FailureCause, PollPolicy, ResizeOrchestrator, ResizeOutcome, ResizeRequest,
    DEFAULT_MAX_ATTEMPTS,
};

use crate::error::CliError;
use crate::output::{print_info, print_item, print_json, print_success, OutputFormat};

use super::CommandContext;

/// Instance commands.
#[derive(Debug, Args)]
pub struct InstancesCommand {
    #[command(subcommand)]
    command: InstancesSubcommand,
}

#[derive(Debug, Subcommand)]
enum InstancesSubcommand {
    /// Show an instance's status and machine type.
    Status(StatusArgs),

    /// Stop an instance and change its machine type.
    Resize(ResizeArgs),
}

#[derive(Debug, Args)]
struct StatusArgs {
    /// Instance name.
    instance: String,
}

#[derive(Debug, Args)]
struct ResizeArgs {
    /// Instance name.
    instance: String,

    /// Target machine type, e.g. e2-small.
    #[arg(long)]
    machine_type: String,

    #[command(flatten)]
    poll: PollArgs,
}

/// Polling knobs shared by every command that waits for a stop.
#[derive(Debug, Args)]
pub(crate) struct PollArgs {
    /// Seconds between status polls while waiting for the stop.
    #[arg(long, default_value_t = 1)]
    poll_interval_secs: u64,

    /// Maximum number of status polls before giving up.
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS, conflicts_with = "max_wait_secs")]
    max_attempts: u32,

    /// Overall wait budget in seconds, instead of a poll count.
    #[arg(long)]
    max_wait_secs: Option<u64>,
}

impl PollArgs {
    pub(crate) fn policy(&self) -> PollPolicy {
        let interval = Duration::from_secs(self.poll_interval_secs);
        match self.max_wait_secs {
            Some(secs) => PollPolicy::with_max_elapsed(interval, Duration::from_secs(secs)),
            None => PollPolicy::with_max_attempts(interval, self.max_attempts),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
struct InstanceView {
    #[tabled(rename = "Name")]
    name: String,

    #[tabled(rename = "Status")]
    status: String,

    #[tabled(rename = "Machine Type")]
    machine_type: String,
}

impl InstancesCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            InstancesSubcommand::Status(args) => status(ctx, args).await,
            InstancesSubcommand::Resize(args) => resize(ctx, args).await,
        }
    }
}

/// Show an instance's status.
async fn status(ctx: CommandContext, args: StatusArgs) -> Result<()> {
    let client = ctx.compute_client()?;
    let project = ctx.require_project()?;
    let zone = ctx.require_zone()?;

    let instance = client.get_instance(project, zone, &args.instance).await?;
    let view = InstanceView {
        name: instance.name.clone(),
        status: instance.status.to_string(),
        machine_type: instance.machine_type_name().to_string(),
    };
    print_item(&view, ctx.format);

    Ok(())
}

/// Resize an instance.
async fn resize(ctx: CommandContext, args: ResizeArgs) -> Result<()> {
    let project = ctx.require_project()?;
    let zone = ctx.require_zone()?;

    let request = ResizeRequest::new(project, zone, &args.instance, &args.machine_type);
    run_resize(&ctx, request, args.poll.policy()).await
}

/// Drive a resize to completion: stop, wait for TERMINATED, change the
/// machine type. Ctrl-C cancels between polls. Non-success outcomes map
/// to typed errors so `main` can pick the exit code.
pub(crate) async fn run_resize(
    ctx: &CommandContext,
    request: ResizeRequest,
    policy: PollPolicy,
) -> Result<()> {
    let gateway = GcpComputeGateway::new(ctx.compute_client()?);
    let orchestrator = ResizeOrchestrator::new(gateway);

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    if let OutputFormat::Table = ctx.format {
        print_info(&format!("Resizing {}", request));
    }

    let outcome = orchestrator.resize(&request, &policy, cancel_rx).await;
    ctrl_c.abort();

    match outcome {
        ResizeOutcome::Succeeded { machine_type } => {
            match ctx.format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "status": "succeeded",
                    "instance": request.instance,
                    "machine_type": machine_type,
                })),
                OutputFormat::Table => {
                    print_success(&format!("Resized {} to {}", request.instance, machine_type));
                }
            }
            Ok(())
        }
        ResizeOutcome::TimedOut { last_status } => {
            Err(CliError::ResizeTimedOut { last_status }.into())
        }
        ResizeOutcome::Failed { cause: FailureCause::Cancelled, .. } => {
            Err(CliError::ResizeCancelled.into())
        }
        ResizeOutcome::Failed { stage, cause } => Err(CliError::ResizeFailed {
            stage,
            message: cause.to_string(),
        }
        .into()),
    }
}
