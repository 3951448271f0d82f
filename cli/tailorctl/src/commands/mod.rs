//! CLI commands.

mod auth;
mod context;
mod instances;
mod recommendations;

use anyhow::Result;
use clap::{Parser, Subcommand};

use vmtailor_gcp::{ComputeClient, RecommenderClient};

use crate::config::{Config, Credentials};
use crate::error::CliError;
use crate::output::OutputFormat;

/// vmtailor CLI - rightsize compute instances from recommendations.
#[derive(Debug, Parser)]
#[command(name = "vmt")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(long, global = true, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Project ID.
    #[arg(long, global = true, env = "VMT_PROJECT")]
    project: Option<String>,

    /// Zone name, e.g. us-central1-a.
    #[arg(long, global = true, env = "VMT_ZONE")]
    zone: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Authenticate with the compute provider.
    Auth(auth::AuthCommand),

    /// Show or edit saved CLI context.
    Context(context::ContextCommand),

    /// List and apply machine-type recommendations.
    Recommendations(recommendations::RecommendationsCommand),

    /// Inspect and resize compute instances.
    Instances(instances::InstancesCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    /// Dispatch the parsed command.
    pub async fn run(self) -> Result<()> {
        let ctx = CommandContext {
            config: Config::load()?,
            credentials: Credentials::load()?,
            format: self.format,
            project: self.project,
            zone: self.zone,
        };

        match self.command {
            Commands::Auth(cmd) => cmd.run(ctx).await,
            Commands::Context(cmd) => cmd.run(ctx).await,
            Commands::Recommendations(cmd) => cmd.run(ctx).await,
            Commands::Instances(cmd) => cmd.run(ctx).await,
            Commands::Version => {
                println!("vmt {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}

/// State shared by every command: loaded config, stored credentials,
/// and the global flags.
pub struct CommandContext {
    pub config: Config,
    pub credentials: Option<Credentials>,
    pub format: OutputFormat,
    pub project: Option<String>,
    pub zone: Option<String>,
}

impl CommandContext {
    /// Access token from stored credentials.
    pub fn token(&self) -> Result<&str> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or(CliError::NotAuthenticated)?;
        Ok(creds.token.as_str())
    }

    /// Get an authenticated Compute Engine client.
    pub fn compute_client(&self) -> Result<ComputeClient> {
        Ok(ComputeClient::with_base_url(
            &self.config.compute_url,
            self.token()?,
        )?)
    }

    /// Get an authenticated Recommender client.
    pub fn recommender_client(&self) -> Result<RecommenderClient> {
        Ok(RecommenderClient::with_base_url(
            &self.config.recommender_url,
            self.token()?,
        )?)
    }

    /// Project from the `--project` flag, falling back to the saved
    /// context.
    pub fn resolve_project(&self) -> Option<&str> {
        self.project
            .as_deref()
            .or(self.config.context.project.as_deref())
    }

    /// Zone from the `--zone` flag, falling back to the saved context.
    pub fn resolve_zone(&self) -> Option<&str> {
        self.zone.as_deref().or(self.config.context.zone.as_deref())
    }

    /// Recommender location. Machine-type recommendations are zonal, so
    /// the zone is the fallback.
    pub fn resolve_location(&self) -> Option<&str> {
        self.config
            .context
            .location
            .as_deref()
            .or_else(|| self.resolve_zone())
    }

    /// Project, or an error when neither flag nor context has one.
    pub fn require_project(&self) -> Result<&str> {
        self.resolve_project().ok_or_else(|| {
            anyhow::anyhow!(
                "No project specified. Pass --project or run `vmt context set --project <id>`."
            )
        })
    }

    /// Zone, or an error when neither flag nor context has one.
    pub fn require_zone(&self) -> Result<&str> {
        self.resolve_zone().ok_or_else(|| {
            anyhow::anyhow!("No zone specified. Pass --zone or run `vmt context set --zone <zone>`.")
        })
    }

    /// Recommender location, or an error when nothing resolves one.
    pub fn require_location(&self) -> Result<&str> {
        self.resolve_location().ok_or_else(|| {
            anyhow::anyhow!(
                "No location specified. Pass --zone or run `vmt context set --location <loc>`."
            )
        })
    }
}
