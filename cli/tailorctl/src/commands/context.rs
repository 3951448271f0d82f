//! Context commands (saved defaults for project/zone/location).

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use serde::Serialize;

use crate::config::{CliContext, Config};
use crate::output::{print_json, print_success, OutputFormat};

use super::CommandContext;

/// Manage saved CLI context (defaults for project/zone/location).
#[derive(Debug, Args)]
pub struct ContextCommand {
    #[command(subcommand)]
    command: ContextSubcommand,
}

#[derive(Debug, Subcommand)]
enum ContextSubcommand {
    /// Show the saved context.
    Show,

    /// Save default values.
    Set(SetArgs),

    /// Clear the saved context.
    Clear,
}

#[derive(Debug, Args)]
struct SetArgs {
    /// Default project ID.
    #[arg(long)]
    project: Option<String>,

    /// Default zone.
    #[arg(long)]
    zone: Option<String>,

    /// Recommender location; defaults to the zone when unset.
    #[arg(long)]
    location: Option<String>,
}

/// What `show` renders: the saved defaults plus the endpoints they
/// apply to.
#[derive(Debug, Serialize)]
struct ContextView {
    project: Option<String>,
    zone: Option<String>,
    location: Option<String>,
    compute_url: String,
    recommender_url: String,
}

fn context_view(config: &Config) -> ContextView {
    ContextView {
        project: config.context.project.clone(),
        zone: config.context.zone.clone(),
        location: config.context.location.clone(),
        compute_url: config.compute_url.clone(),
        recommender_url: config.recommender_url.clone(),
    }
}

fn print_field(name: &str, value: Option<&str>) {
    match value {
        Some(v) => println!("{}: {}", name, v),
        None => println!("{}: {}", name, "(unset)".dimmed()),
    }
}

impl ContextCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            ContextSubcommand::Show => show(ctx).await,
            ContextSubcommand::Set(args) => set(ctx, args).await,
            ContextSubcommand::Clear => clear(ctx).await,
        }
    }
}

async fn show(ctx: CommandContext) -> Result<()> {
    let view = context_view(&ctx.config);

    match ctx.format {
        OutputFormat::Json => print_json(&view),
        OutputFormat::Table => {
            print_field("project", view.project.as_deref());
            print_field("zone", view.zone.as_deref());
            print_field("location", view.location.as_deref());
            print_field("compute_url", Some(&view.compute_url));
            print_field("recommender_url", Some(&view.recommender_url));
        }
    }

    Ok(())
}

async fn set(mut ctx: CommandContext, args: SetArgs) -> Result<()> {
    if args.project.is_none() && args.zone.is_none() && args.location.is_none() {
        anyhow::bail!("Nothing to set. Pass --project, --zone, or --location.");
    }

    let saved = &mut ctx.config.context;
    if let Some(project) = args.project {
        saved.project = Some(project);
    }
    if let Some(zone) = args.zone {
        saved.zone = Some(zone);
    }
    if let Some(location) = args.location {
        saved.location = Some(location);
    }
    ctx.config.save()?;

    match ctx.format {
        OutputFormat::Json => print_json(&context_view(&ctx.config)),
        OutputFormat::Table => print_success("Context saved."),
    }

    Ok(())
}

async fn clear(mut ctx: CommandContext) -> Result<()> {
    ctx.config.context = CliContext::default();
    ctx.config.save()?;

    match ctx.format {
        OutputFormat::Json => print_json(&context_view(&ctx.config)),
        OutputFormat::Table => print_success("Context cleared."),
    }

    Ok(())
}
