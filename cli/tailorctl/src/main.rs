//! tailorctl (vmt) - rightsize compute instances.
//!
//! Lists machine-type recommendations and applies them: stop the
//! instance, wait for it to reach TERMINATED, change the machine type.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod error;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = Cli::parse().run().await {
        error::print_error(&e);
        std::process::exit(error::exit_code(&e));
    }
}

/// Diagnostics go to stderr so table and JSON output stay clean.
/// `VMT_LOG` takes the usual filter directives, e.g. `vmtailor_resize=debug`.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("VMT_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
