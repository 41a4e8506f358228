//! Integration tests for the debts resource operations

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use payflow_core::domain::{MutationMethod, RecordId, RecordPayload};
use payflow_core::ports::IDebtApi;

use crate::common;

fn rid(s: &str) -> RecordId {
    RecordId::new(s.to_string()).unwrap()
}

// ============================================================================
// List
// ============================================================================

#[tokio::test]
async fn test_list_debts_decodes_records() {
    let (server, client) = common::setup_api_mock().await;
    common::mount_list(
        &server,
        json!([
            common::debt_json("d2", "Sara", 15000),
            common::debt_json("d1", "Ali", 25000)
        ]),
    )
    .await;

    let debts = client.list_debts().await.expect("list failed");

    assert_eq!(debts.len(), 2);
    assert_eq!(debts[0].id().as_str(), "d2");
    assert_eq!(debts[1].field("name"), Some(&json!("Ali")));
    assert_eq!(debts[1].field("monthsDue"), Some(&json!(1)));
    assert!(!debts[0].paid());
}

#[tokio::test]
async fn test_list_debts_empty() {
    let (server, client) = common::setup_api_mock().await;
    common::mount_list(&server, json!([])).await;

    let debts = client.list_debts().await.unwrap();
    assert!(debts.is_empty());
}

// ============================================================================
// Writes
// ============================================================================

#[tokio::test]
async fn test_create_posts_payload() {
    let (server, client) = common::setup_api_mock().await;

    let payload = RecordPayload::new()
        .with("name", "Ali")
        .with("phone", "0770")
        .with("boxName", "Box 3")
        .with("amount", 25000);

    Mock::given(method("POST"))
        .and(path("/api/debts"))
        .and(body_json(json!({
            "name": "Ali",
            "phone": "0770",
            "boxName": "Box 3",
            "amount": 25000
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(common::debt_json(
            "new-1", "Ali", 25000,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let created = client.create_debt(&payload).await.unwrap().unwrap();
    assert_eq!(created["_id"], json!("new-1"));
}

#[tokio::test]
async fn test_update_puts_to_record_path() {
    let (server, client) = common::setup_api_mock().await;

    Mock::given(method("PUT"))
        .and(path("/api/debts/d1"))
        .and(body_json(json!({"paid": true})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"_id": "d1", "name": "Ali", "paid": true})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let payload = RecordPayload::new().with("paid", true);
    let updated = client.update_debt(&rid("d1"), &payload).await.unwrap().unwrap();
    assert_eq!(updated["paid"], json!(true));
}

#[tokio::test]
async fn test_delete_sends_no_body() {
    let (server, client) = common::setup_api_mock().await;

    Mock::given(method("DELETE"))
        .and(path("/api/debts/d1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Deleted"})))
        .expect(1)
        .mount(&server)
        .await;

    let body = client.delete_debt(&rid("d1")).await.unwrap();
    assert_eq!(body, Some(json!({"message": "Deleted"})));
}

#[tokio::test]
async fn test_send_with_empty_response_body() {
    let (server, client) = common::setup_api_mock().await;

    Mock::given(method("DELETE"))
        .and(path("/api/debts/d9"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let body = client
        .send(MutationMethod::Delete, "/debts/d9", None)
        .await
        .unwrap();
    assert!(body.is_none());
}

// ============================================================================
// Reachability probe
// ============================================================================

#[tokio::test]
async fn test_ping_true_for_any_response() {
    // No mock mounted: wiremock answers 404, which still proves reachability
    let (_server, client) = common::setup_api_mock().await;
    assert!(client.ping().await);
}

#[tokio::test]
async fn test_ping_hits_base_url_with_head() {
    let (server, client) = common::setup_api_mock().await;

    Mock::given(method("HEAD"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.ping().await);
}
