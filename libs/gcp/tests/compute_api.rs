//! Wire-level tests for the Compute Engine client and gateway adapter.
//!
//! Each test stands up a mock API server and verifies:
//! - Request shape: paths, bearer auth, JSON bodies
//! - Response decoding into the typed DTOs
//! - Error envelope parsing and transient / no-op classification as it
//!   flows through the gateway's `anyhow` boundary

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vmtailor_gcp::{ApiError, ComputeClient, GcpComputeGateway};
use vmtailor_resize::{ComputeGateway, InstanceStatus};

const TOKEN: &str = "test-token";

fn client(server: &MockServer) -> ComputeClient {
    ComputeClient::with_base_url(server.uri(), TOKEN).unwrap()
}

fn not_running_body() -> serde_json::Value {
    json!({
        "error": {
            "code": 400,
            "message": "The instance 'worker-1' is not running.",
            "errors": [
                {"message": "not running", "domain": "global", "reason": "badRequest"}
            ]
        }
    })
}

#[tokio::test]
async fn test_get_instance_sends_bearer_and_decodes_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(
            "/compute/v1/projects/p1/zones/us-central1-a/instances/worker-1",
        ))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "4567890123456789",
            "name": "worker-1",
            "status": "RUNNING",
            "machineType": "https://www.googleapis.com/compute/v1/projects/p1/zones/us-central1-a/machineTypes/e2-medium"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let instance = client(&server)
        .get_instance("p1", "us-central1-a", "worker-1")
        .await
        .unwrap();

    assert_eq!(instance.name, "worker-1");
    assert_eq!(instance.status, InstanceStatus::Running);
    assert_eq!(instance.machine_type_name(), "e2-medium");
}

#[tokio::test]
async fn test_stop_instance_posts_to_stop_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(
            "/compute/v1/projects/p1/zones/us-central1-a/instances/worker-1/stop",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operation-1758",
            "operationType": "stop",
            "status": "RUNNING"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let operation = client(&server)
        .stop_instance("p1", "us-central1-a", "worker-1")
        .await
        .unwrap();

    assert_eq!(operation.name, "operation-1758");
    assert_eq!(operation.operation_type, "stop");
}

#[tokio::test]
async fn test_set_machine_type_sends_relative_path_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(
            "/compute/v1/projects/p1/zones/us-central1-a/instances/worker-1/setMachineType",
        ))
        .and(body_json(json!({
            "machineType": "zones/us-central1-a/machineTypes/e2-micro"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operation-1759",
            "operationType": "setMachineType",
            "status": "PENDING"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let operation = client(&server)
        .set_machine_type(
            "p1",
            "us-central1-a",
            "worker-1",
            "zones/us-central1-a/machineTypes/e2-micro",
        )
        .await
        .unwrap();

    assert_eq!(operation.name, "operation-1759");
}

#[tokio::test]
async fn test_not_found_parses_error_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(
            "/compute/v1/projects/p1/zones/us-central1-a/instances/ghost",
        ))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "code": 404,
                "message": "The resource 'projects/p1/zones/us-central1-a/instances/ghost' was not found",
                "errors": [{"message": "not found", "domain": "global", "reason": "notFound"}]
            }
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .get_instance("p1", "us-central1-a", "ghost")
        .await
        .unwrap_err();

    match &err {
        ApiError::Api {
            status,
            message,
            reason,
        } => {
            assert_eq!(*status, 404);
            assert!(message.contains("was not found"));
            assert_eq!(reason.as_deref(), Some("notFound"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!err.is_transient());
    assert!(!err.is_stop_noop());
}

#[tokio::test]
async fn test_server_errors_classify_as_transient() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(
            "/compute/v1/projects/p1/zones/us-central1-a/instances/worker-1",
        ))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;

    let err = client(&server)
        .get_instance("p1", "us-central1-a", "worker-1")
        .await
        .unwrap_err();

    assert!(err.is_transient());
    assert_eq!(err.status(), Some(503));
}

#[tokio::test]
async fn test_gateway_reports_status_through_trait() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(
            "/compute/v1/projects/p1/zones/us-central1-a/instances/worker-1",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "worker-1",
            "status": "TERMINATED"
        })))
        .mount(&server)
        .await;

    let gateway = GcpComputeGateway::new(client(&server));
    let status = gateway
        .get_status("p1", "us-central1-a", "worker-1")
        .await
        .unwrap();

    assert_eq!(status, InstanceStatus::Terminated);
    assert!(status.is_terminated());
}

#[tokio::test]
async fn test_gateway_classifies_stop_noop_across_anyhow_boundary() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(
            "/compute/v1/projects/p1/zones/us-central1-a/instances/worker-1/stop",
        ))
        .respond_with(ResponseTemplate::new(400).set_body_json(not_running_body()))
        .mount(&server)
        .await;

    let gateway = GcpComputeGateway::new(client(&server));
    let err = gateway
        .stop("p1", "us-central1-a", "worker-1")
        .await
        .unwrap_err();

    assert!(gateway.is_idempotent_noop(&err));
    assert!(!gateway.is_transient(&err));
}

#[tokio::test]
async fn test_gateway_classifies_rate_limit_as_transient() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(
            "/compute/v1/projects/p1/zones/us-central1-a/instances/worker-1",
        ))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {
                "code": 429,
                "message": "Quota exceeded for quota metric 'Queries'",
                "errors": [{"message": "rate limited", "domain": "global", "reason": "rateLimitExceeded"}]
            }
        })))
        .mount(&server)
        .await;

    let gateway = GcpComputeGateway::new(client(&server));
    let err = gateway
        .get_status("p1", "us-central1-a", "worker-1")
        .await
        .unwrap_err();

    assert!(gateway.is_transient(&err));
    assert!(!gateway.is_idempotent_noop(&err));
}
