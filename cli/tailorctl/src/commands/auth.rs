//! Authentication commands.
//!
//! Tokens are supplied by the user (for example from
//! `gcloud auth print-access-token`) and stored locally. No OAuth flow
//! runs here, so login records an expiry instead of refreshing.

use anyhow::Result;
use chrono::Utc;
use clap::{Args, Subcommand};
use colored::Colorize;

use crate::config::Credentials;
use crate::output::{print_info, print_success};

use super::CommandContext;

/// Authentication commands.
#[derive(Debug, Args)]
pub struct AuthCommand {
    #[command(subcommand)]
    command: AuthSubcommand,
}

#[derive(Debug, Subcommand)]
enum AuthSubcommand {
    /// Store an access token.
    Login(LoginArgs),

    /// Remove the stored token.
    Logout,

    /// Show current authentication status.
    Status,
}

#[derive(Debug, Args)]
struct LoginArgs {
    /// Access token to store.
    #[arg(long, env = "VMT_TOKEN")]
    token: Option<String>,

    /// Account the token belongs to (shown by `auth status`).
    #[arg(long)]
    account: Option<String>,

    /// Minutes until the token expires. Provider access tokens
    /// typically live for an hour.
    #[arg(long, default_value_t = 60)]
    expires_in_mins: i64,
}

impl AuthCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            AuthSubcommand::Login(args) => login(ctx, args).await,
            AuthSubcommand::Logout => logout(ctx).await,
            AuthSubcommand::Status => status(ctx).await,
        }
    }
}

/// Store an access token.
async fn login(_ctx: CommandContext, args: LoginArgs) -> Result<()> {
    let Some(token) = args.token else {
        anyhow::bail!(
            "No token supplied. Pass --token or set VMT_TOKEN; \
             a token can be minted with `gcloud auth print-access-token`."
        );
    };

    let mut creds = Credentials::new(token);
    creds.account = args.account;
    // chrono panics on durations that overflow; a week is plenty.
    let expires_in = chrono::Duration::minutes(args.expires_in_mins.clamp(1, 7 * 24 * 60));
    creds.expires_at = Some(Utc::now() + expires_in);
    creds.save()?;

    print_success("Token stored.");
    Ok(())
}

/// Remove the stored token.
async fn logout(_ctx: CommandContext) -> Result<()> {
    if Credentials::delete()? {
        print_success("Logged out.");
    } else {
        print_info("No stored credentials.");
    }
    Ok(())
}

/// Show authentication status.
async fn status(ctx: CommandContext) -> Result<()> {
    let Some(creds) = ctx.credentials else {
        println!("{} Not authenticated", "Status:".red().bold());
        println!("\nRun {} to log in.", "vmt auth login".cyan());
        return Ok(());
    };

    println!("{} Authenticated", "Status:".green().bold());
    if let Some(account) = &creds.account {
        println!("  Account: {}", account);
    }

    match creds.expires_at {
        Some(at) if creds.is_expired() => {
            println!(
                "  {} Token expired at {}. Run `vmt auth login` with a fresh token.",
                "Warning:".yellow(),
                at.format("%Y-%m-%d %H:%M UTC")
            );
        }
        Some(at) => {
            let left = at.signed_duration_since(Utc::now());
            println!(
                "  Expires: {} ({} minutes left)",
                at.format("%Y-%m-%d %H:%M UTC"),
                left.num_minutes().max(0)
            );
        }
        None => {}
    }

    Ok(())
}
