//! Integration tests for failure mapping into ApiError

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use payflow_api::ApiClient;
use payflow_core::domain::{RecordId, RecordPayload};
use payflow_core::ports::{ApiError, IDebtApi};

use crate::common;

fn api_error(err: &anyhow::Error) -> &ApiError {
    err.downcast_ref::<ApiError>()
        .unwrap_or_else(|| panic!("expected ApiError, got {err:?}"))
}

/// Returns a base URL on localhost where nothing is listening
async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api", addr)
}

// ============================================================================
// HTTP status errors
// ============================================================================

#[tokio::test]
async fn test_not_found_carries_server_message() {
    let (server, client) = common::setup_api_mock().await;

    Mock::given(method("PUT"))
        .and(path("/api/debts/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Debt not found"})))
        .mount(&server)
        .await;

    let id = RecordId::new("missing".to_string()).unwrap();
    let err = client
        .update_debt(&id, &RecordPayload::new().with("paid", true))
        .await
        .unwrap_err();

    let api = api_error(&err);
    assert!(api.is_not_found());
    assert_eq!(
        api.to_string(),
        "Request failed with status 404: Debt not found"
    );
}

#[tokio::test]
async fn test_validation_error() {
    let (server, client) = common::setup_api_mock().await;

    Mock::given(method("POST"))
        .and(path("/api/debts"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "Missing required fields"})),
        )
        .mount(&server)
        .await;

    let err = client
        .create_debt(&RecordPayload::new().with("name", "only name"))
        .await
        .unwrap_err();

    let api = api_error(&err);
    assert!(api.is_validation());
    assert_eq!(api.status(), Some(400));
}

#[tokio::test]
async fn test_server_error_without_json_body() {
    let (server, client) = common::setup_api_mock().await;

    Mock::given(method("GET"))
        .and(path("/api/debts"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let err = client.list_debts().await.unwrap_err();
    match api_error(&err) {
        ApiError::Status { status, message } => {
            assert_eq!(*status, 500);
            assert_eq!(message, "Internal Server Error");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_list_body() {
    let (server, client) = common::setup_api_mock().await;

    Mock::given(method("GET"))
        .and(path("/api/debts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"not": "a list"})))
        .mount(&server)
        .await;

    let err = client.list_debts().await.unwrap_err();
    assert!(matches!(api_error(&err), ApiError::InvalidResponse(_)));
}

// ============================================================================
// Transport errors
// ============================================================================

#[tokio::test]
async fn test_refused_connection_is_network_error() {
    let client = ApiClient::with_base_url(closed_port_url().await);

    let err = client.list_debts().await.unwrap_err();
    match api_error(&err) {
        ApiError::Network { code, .. } => assert!(code.is_some()),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_ping_false_when_unreachable() {
    let client = ApiClient::with_base_url(closed_port_url().await);
    assert!(!client.ping().await);
}

#[tokio::test]
async fn test_timeout_is_no_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/debts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client =
        ApiClient::new(format!("{}/api", server.uri()), Duration::from_millis(200)).unwrap();

    let err = client.list_debts().await.unwrap_err();
    assert!(matches!(api_error(&err), ApiError::NoResponse(_)));
}
