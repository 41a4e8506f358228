//! Shared test helpers for debts API integration tests
//!
//! Each helper mounts mock endpoints shaped like the PayFlow backend
//! (`{base}/api/debts...`) and returns a client pointing at them.

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use payflow_api::ApiClient;

/// Starts a mock server and returns a client whose base URL ends in `/api/`
pub async fn setup_api_mock() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::with_base_url(format!("{}/api/", server.uri()));
    (server, client)
}

/// A debt document as the server returns it
pub fn debt_json(id: &str, name: &str, amount: i64) -> Value {
    json!({
        "_id": id,
        "name": name,
        "phone": "07700000000",
        "boxName": "Box 1",
        "amount": amount,
        "paid": false,
        "date": "2026-03-01T00:00:00.000Z",
        "note": "",
        "monthsDue": 1,
        "createdAt": "2026-03-01T10:00:00.000Z",
        "updatedAt": "2026-03-01T10:00:00.000Z"
    })
}

/// Mounts `GET /api/debts` returning the given documents
pub async fn mount_list(server: &MockServer, debts: Value) {
    Mock::given(method("GET"))
        .and(path("/api/debts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(debts))
        .mount(server)
        .await;
}
