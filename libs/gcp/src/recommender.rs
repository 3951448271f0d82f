//! Recommender v1 REST client.
//!
//! Lists machine-type rightsizing recommendations and translates a
//! recommendation's replace operation into a resize request.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use vmtailor_resize::{RequestError, ResizeRequest};

use crate::error::ApiError;
use crate::http::{build_http_client, handle_response};

/// Default Recommender API endpoint.
pub const DEFAULT_RECOMMENDER_URL: &str = "https://recommender.googleapis.com";

/// Recommender that produces machine-type rightsizing recommendations.
/// Its parent location is the instance's zone.
pub const MACHINE_TYPE_RECOMMENDER: &str = "google.compute.instance.MachineTypeRecommender";

/// Recommender API client.
#[derive(Debug, Clone)]
pub struct RecommenderClient {
    client: reqwest::Client,
    base_url: String,
}

impl RecommenderClient {
    /// Create a client against the default endpoint.
    pub fn new(token: &str) -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_RECOMMENDER_URL, token)
    }

    /// Create a client against a custom endpoint.
    pub fn with_base_url(base_url: impl Into<String>, token: &str) -> Result<Self, ApiError> {
        Ok(Self {
            client: build_http_client(token)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// List every recommendation under a recommender in a location,
    /// following pagination until the last page.
    pub async fn list_recommendations(
        &self,
        project: &str,
        location: &str,
        recommender_id: &str,
    ) -> Result<Vec<Recommendation>, ApiError> {
        let parent =
            format!("projects/{project}/locations/{location}/recommenders/{recommender_id}");
        let url = format!("{}/v1/{}/recommendations", self.base_url, parent);

        let mut recommendations = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.client.get(&url);
            if let Some(token) = page_token.as_deref() {
                request = request.query(&[("pageToken", token)]);
            }
            debug!(parent = %parent, "Listing recommendations");

            let response = request.send().await?;
            let page: ListRecommendationsResponse = handle_response(response).await?;
            recommendations.extend(page.recommendations);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(recommendations)
    }

    /// Fetch a single recommendation by its full resource name,
    /// `projects/<p>/locations/<l>/recommenders/<r>/recommendations/<id>`.
    pub async fn get_recommendation(&self, name: &str) -> Result<Recommendation, ApiError> {
        let url = format!("{}/v1/{}", self.base_url, name);
        debug!(name = %name, "Fetching recommendation");

        let response = self.client.get(&url).send().await?;
        handle_response(response).await
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListRecommendationsResponse {
    #[serde(default)]
    recommendations: Vec<Recommendation>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// A recommendation, reduced to the fields the toolkit uses.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Full resource name.
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub state_info: Option<StateInfo>,
    #[serde(default)]
    pub last_refresh_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub primary_impact: Option<Impact>,
    #[serde(default)]
    pub content: Option<RecommendationContent>,
}

impl Recommendation {
    /// Trailing ID segment of the resource name.
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Recommendation state, empty when the API omitted it.
    pub fn state(&self) -> &str {
        self.state_info.as_ref().map(|s| s.state.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateInfo {
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Impact {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub cost_projection: Option<CostProjection>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostProjection {
    #[serde(default)]
    pub cost: Option<Money>,
}

/// Money amount as the API encodes it: whole units as a string, plus
/// nanos. Cost projections for rightsizing are negative (a saving).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    #[serde(default)]
    pub currency_code: String,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub nanos: Option<i64>,
}

impl Money {
    /// Approximate amount in whole currency units.
    pub fn amount(&self) -> f64 {
        let units = self
            .units
            .as_deref()
            .and_then(|u| u.parse::<i64>().ok())
            .unwrap_or(0);
        units as f64 + self.nanos.unwrap_or(0) as f64 / 1_000_000_000.0
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationContent {
    #[serde(default)]
    pub operation_groups: Vec<OperationGroup>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationGroup {
    #[serde(default)]
    pub operations: Vec<RecommendationOperation>,
}

/// A single operation inside a recommendation. Machine-type changes
/// arrive as a `test` operation guarding the current type followed by a
/// `replace` carrying the new one.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationOperation {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub path: String,
    /// Full URL of the resource the operation applies to.
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub resource_type: String,
    /// Replacement value; its shape depends on `path`.
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

/// Errors translating a recommendation into a resize request.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// No `replace` of `/machineType` anywhere in the content.
    #[error("recommendation has no machine-type change operation")]
    NoMachineTypeChange,

    /// The operation's resource URL does not name a zonal instance.
    #[error("unrecognized resource path: {0}")]
    MalformedResource(String),

    /// The operation's value does not name a machine type.
    #[error("unrecognized machine type value: {0:?}")]
    MalformedMachineType(Option<serde_json::Value>),

    /// The extracted fields do not form a valid resize request.
    #[error(transparent)]
    InvalidRequest(#[from] RequestError),
}

/// Build a resize request from a machine-type recommendation.
///
/// Scans the operation groups for the first `replace` of `/machineType`,
/// recovers project, zone, and instance from the operation's resource
/// URL, and takes the target type from its value.
pub fn resize_request_from_recommendation(
    recommendation: &Recommendation,
) -> Result<ResizeRequest, ExtractError> {
    let operation = recommendation
        .content
        .iter()
        .flat_map(|c| &c.operation_groups)
        .flat_map(|g| &g.operations)
        .find(|op| op.action.eq_ignore_ascii_case("replace") && op.path == "/machineType")
        .ok_or(ExtractError::NoMachineTypeChange)?;

    let (project, zone, instance) = parse_instance_resource(&operation.resource)
        .ok_or_else(|| ExtractError::MalformedResource(operation.resource.clone()))?;

    let machine_type = operation
        .value
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(machine_type_from_value)
        .ok_or_else(|| ExtractError::MalformedMachineType(operation.value.clone()))?;

    let request = ResizeRequest::new(project, zone, instance, machine_type);
    request.validate()?;
    Ok(request)
}

/// Pull `(project, zone, instance)` out of a resource URL of the form
/// `.../projects/<p>/zones/<z>/instances/<name>`.
fn parse_instance_resource(resource: &str) -> Option<(&str, &str, &str)> {
    let mut project = None;
    let mut zone = None;
    let mut instance = None;

    let mut segments = resource.split('/');
    while let Some(segment) = segments.next() {
        match segment {
            "projects" => project = segments.next(),
            "zones" => zone = segments.next(),
            "instances" => instance = segments.next(),
            _ => {}
        }
    }

    match (project, zone, instance) {
        (Some(p), Some(z), Some(i)) if !p.is_empty() && !z.is_empty() && !i.is_empty() => {
            Some((p, z, i))
        }
        _ => None,
    }
}

/// Trailing type name from a `.../machineTypes/<type>` value. Accepts
/// both full URLs and bare `zones/...` paths.
fn machine_type_from_value(value: &str) -> Option<&str> {
    let marker = "/machineTypes/";
    value
        .rfind(marker)
        .map(|idx| &value[idx + marker.len()..])
        .filter(|name| !name.is_empty())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn machine_type_recommendation() -> Recommendation {
        serde_json::from_value(serde_json::json!({
            "name": "projects/p1/locations/us-central1-a/recommenders/google.compute.instance.MachineTypeRecommender/recommendations/rec-6043",
            "description": "Save cost by changing machine type from e2-medium to e2-small.",
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
                    "operations": [
                        {
                            "action": "test",
                            "path": "/machineType",
                            "resource": "https://www.googleapis.com/compute/v1/projects/p1/zones/us-central1-a/instances/worker-1",
                            "resourceType": "compute.googleapis.com/Instance",
                            "valueMatcher": {"matchesPattern": ".*zones/us-central1-a/machineTypes/e2-medium"}
                        },
                        {
                            "action": "replace",
                            "path": "/machineType",
                            "resource": "https://www.googleapis.com/compute/v1/projects/p1/zones/us-central1-a/instances/worker-1",
                            "resourceType": "compute.googleapis.com/Instance",
                            "value": "zones/us-central1-a/machineTypes/e2-small"
                        }
                    ]
                }]
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_extracts_resize_request() {
        let request = resize_request_from_recommendation(&machine_type_recommendation()).unwrap();
        assert_eq!(request.project, "p1");
        assert_eq!(request.zone, "us-central1-a");
        assert_eq!(request.instance, "worker-1");
        assert_eq!(request.target_machine_type, "e2-small");
    }

    #[test]
    fn test_extraction_skips_test_operation() {
        // The guard operation carries no value; extraction must land on
        // the replace operation, not error on the guard.
        let recommendation = machine_type_recommendation();
        let request = resize_request_from_recommendation(&recommendation).unwrap();
        assert_eq!(request.target_machine_type, "e2-small");
    }

    #[test]
    fn test_extraction_accepts_full_value_url() {
        let mut recommendation = machine_type_recommendation();
        let content = recommendation.content.as_mut().unwrap();
        content.operation_groups[0].operations[1].value = Some(serde_json::Value::String(
            "https://www.googleapis.com/compute/v1/projects/p1/zones/us-central1-a/machineTypes/e2-small".to_string(),
        ));

        let request = resize_request_from_recommendation(&recommendation).unwrap();
        assert_eq!(request.target_machine_type, "e2-small");
    }

    #[test]
    fn test_no_content_is_no_machine_type_change() {
        let mut recommendation = machine_type_recommendation();
        recommendation.content = None;

        let err = resize_request_from_recommendation(&recommendation).unwrap_err();
        assert!(matches!(err, ExtractError::NoMachineTypeChange));
    }

    #[test]
    fn test_malformed_resource_is_rejected() {
        let mut recommendation = machine_type_recommendation();
        let content = recommendation.content.as_mut().unwrap();
        content.operation_groups[0].operations[1].resource =
            "https://www.googleapis.com/compute/v1/projects/p1/global/snapshots/snap-1".to_string();

        let err = resize_request_from_recommendation(&recommendation).unwrap_err();
        assert!(matches!(err, ExtractError::MalformedResource(_)));
    }

    #[test]
    fn test_non_string_value_is_rejected() {
        let mut recommendation = machine_type_recommendation();
        let content = recommendation.content.as_mut().unwrap();
        content.operation_groups[0].operations[1].value =
            Some(serde_json::json!({"machineType": "e2-small"}));

        let err = resize_request_from_recommendation(&recommendation).unwrap_err();
        assert!(matches!(err, ExtractError::MalformedMachineType(_)));
    }

    #[test]
    fn test_value_without_machine_type_segment_is_rejected() {
        let mut recommendation = machine_type_recommendation();
        let content = recommendation.content.as_mut().unwrap();
        content.operation_groups[0].operations[1].value =
            Some(serde_json::Value::String("e2-small".to_string()));

        let err = resize_request_from_recommendation(&recommendation).unwrap_err();
        assert!(matches!(err, ExtractError::MalformedMachineType(_)));
    }

    #[test]
    fn test_parse_instance_resource() {
        assert_eq!(
            parse_instance_resource(
                "https://www.googleapis.com/compute/v1/projects/p1/zones/us-east1-b/instances/db-0"
            ),
            Some(("p1", "us-east1-b", "db-0"))
        );
        assert_eq!(
            parse_instance_resource("projects/p1/zones/us-east1-b/instances/db-0"),
            Some(("p1", "us-east1-b", "db-0"))
        );
        assert_eq!(parse_instance_resource("projects/p1/zones/us-east1-b"), None);
        assert_eq!(parse_instance_resource(""), None);
    }

    #[test]
    fn test_money_amount() {
        let cost: Money = serde_json::from_value(
            serde_json::json!({"currencyCode": "USD", "units": "-12", "nanos": -340000000}),
        )
        .unwrap();
        assert!((cost.amount() - (-12.34)).abs() < 1e-9);

        assert_eq!(Money::default().amount(), 0.0);
    }

    #[test]
    fn test_recommendation_accessors() {
        let recommendation = machine_type_recommendation();
        assert_eq!(recommendation.id(), "rec-6043");
        assert_eq!(recommendation.state(), "ACTIVE");
    }
}
