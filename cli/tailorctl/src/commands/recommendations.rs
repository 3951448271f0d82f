//! Recommendation commands (list and apply machine-type rightsizing).

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use vmtailor_gcp::{resize_request_from_recommendation, Recommendation, MACHINE_TYPE_RECOMMENDER};

use crate::output::{print_info, print_rows, OutputFormat};

use super::instances::PollArgs;
use super::CommandContext;

/// Recommendation commands.
#[derive(Debug, Args)]
pub struct RecommendationsCommand {
    #[command(subcommand)]
    command: RecommendationsSubcommand,
}

#[derive(Debug, Subcommand)]
enum RecommendationsSubcommand {
    /// List machine-type recommendations.
    List(ListArgs),

    /// Apply a recommendation: stop the instance, change its machine type.
    Apply(ApplyArgs),
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Recommender location; defaults to the configured zone.
    #[arg(long)]
    location: Option<String>,

    /// Recommender ID to query.
    #[arg(long, default_value = MACHINE_TYPE_RECOMMENDER)]
    recommender: String,

    /// Include recommendations in every state, not just ACTIVE.
    #[arg(long)]
    all: bool,
}

#[derive(Debug, Args)]
struct ApplyArgs {
    /// Recommendation ID (as shown by `vmt recommendations list`) or
    /// full resource name.
    recommendation: String,

    /// Recommender location; defaults to the configured zone.
    #[arg(long)]
    location: Option<String>,

    #[command(flatten)]
    poll: PollArgs,
}

/// Row for the recommendations table.
#[derive(Debug, Serialize, Tabled)]
struct RecommendationRow {
    #[tabled(rename = "ID")]
    id: String,

    #[tabled(rename = "Instance")]
    instance: String,

    #[tabled(rename = "Target Type")]
    target: String,

    #[tabled(rename = "State")]
    state: String,

    #[tabled(rename = "Est. Saving")]
    saving: String,

    #[tabled(rename = "Refreshed")]
    refreshed: String,
}

fn recommendation_row(recommendation: &Recommendation) -> RecommendationRow {
    let (instance, target) = match resize_request_from_recommendation(recommendation) {
        Ok(request) => (request.instance, request.target_machine_type),
        Err(_) => ("-".to_string(), "-".to_string()),
    };

    // Cost projections for rightsizing are negative; flip the sign to
    // report a saving.
    let saving = recommendation
        .primary_impact
        .as_ref()
        .filter(|impact| impact.category == "COST")
        .and_then(|impact| impact.cost_projection.as_ref())
        .and_then(|projection| projection.cost.as_ref())
        .map(|cost| format!("{:.2} {}", -cost.amount(), cost.currency_code))
        .unwrap_or_else(|| "-".to_string());

    let refreshed = recommendation
        .last_refresh_time
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());

    RecommendationRow {
        id: recommendation.id().to_string(),
        instance,
        target,
        state: recommendation.state().to_string(),
        saving,
        refreshed,
    }
}

impl RecommendationsCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        match self.command {
            RecommendationsSubcommand::List(args) => list(ctx, args).await,
            RecommendationsSubcommand::Apply(args) => apply(ctx, args).await,
        }
    }
}

/// List machine-type recommendations.
async fn list(ctx: CommandContext, args: ListArgs) -> Result<()> {
    let client = ctx.recommender_client()?;
    let project = ctx.require_project()?;
    let location = match args.location.as_deref() {
        Some(location) => location,
        None => ctx.require_location()?,
    };

    let recommendations = client
        .list_recommendations(project, location, &args.recommender)
        .await?;

    let rows: Vec<RecommendationRow> = recommendations
        .iter()
        .filter(|r| args.all || matches!(r.state(), "ACTIVE" | ""))
        .map(recommendation_row)
        .collect();

    let empty = if args.all {
        "No recommendations found."
    } else {
        "No active recommendations. Pass --all to include other states."
    };
    print_rows(&rows, ctx.format, empty);
    Ok(())
}

/// Apply a recommendation.
async fn apply(ctx: CommandContext, args: ApplyArgs) -> Result<()> {
    // A bare ID is qualified against the current project/location; a
    // full resource name is used as-is.
    let name = if args.recommendation.contains('/') {
        args.recommendation.clone()
    } else {
        let project = ctx.require_project()?;
        let location = match args.location.as_deref() {
            Some(location) => location,
            None => ctx.require_location()?,
        };
        format!(
            "projects/{project}/locations/{location}/recommenders/{MACHINE_TYPE_RECOMMENDER}/recommendations/{}",
            args.recommendation
        )
    };

    let recommendation = ctx.recommender_client()?.get_recommendation(&name).await?;
    let request = resize_request_from_recommendation(&recommendation)?;

    if let OutputFormat::Table = ctx.format {
        print_info(&format!("Applying {}: {}", recommendation.id(), request));
    }

    super::instances::run_resize(&ctx, request, args.poll.policy()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_recommendation() -> Recommendation {
        serde_json::from_value(serde_json::json!({
            "name": "projects/p1/locations/us-central1-a/recommenders/google.compute.instance.MachineTypeRecommender/recommendations/rec-1",
            "description": "Save cost by changing machine type.",
            "stateInfo": {"state": "ACTIVE"},
            "lastRefreshTime": "2026-08-20T07:00:00Z",
            "primaryImpact": {
                "category": "COST",
                "costProjection": {
                    "cost": {"currencyCode": "USD", "units": "-12", "nanos": -340000000}
                }
            },
            "content": {
                "operationGroups": [{
                    "operations": [{
                        "action": "replace",
                        "path": "/machineType",
                        "resource": "https://www.googleapis.com/compute/v1/projects/p1/zones/us-central1-a/instances/worker-1",
                        "resourceType": "compute.googleapis.com/Instance",
                        "value": "zones/us-central1-a/machineTypes/e2-small"
                    }]
                }]
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_row_from_recommendation() {
        let row = recommendation_row(&sample_recommendation());
        assert_eq!(row.id, "rec-1");
        assert_eq!(row.instance, "worker-1");
        assert_eq!(row.target, "e2-small");
        assert_eq!(row.state, "ACTIVE");
        assert_eq!(row.saving, "12.34 USD");
        assert_eq!(row.refreshed, "2026-08-20 07:00");
    }

    #[test]
    fn test_row_without_resize_content_dashes_out() {
        let mut recommendation = sample_recommendation();
        recommendation.content = None;
        recommendation.primary_impact = None;
        recommendation.last_refresh_time = None;

        let row = recommendation_row(&recommendation);
        assert_eq!(row.instance, "-");
        assert_eq!(row.target, "-");
        assert_eq!(row.saving, "-");
        assert_eq!(row.refreshed, "-");
    }
}
