//! IDebtApi implementation for [`ApiClient`]
//!
//! Maps the port's [`MutationMethod`] onto HTTP verbs. A queued mutation
//! whose verb this build does not know is rejected without touching the
//! network.

use anyhow::{bail, Result};
use reqwest::Method;
use serde_json::Value;

use payflow_core::domain::{MutationMethod, Record, RecordPayload};
use payflow_core::ports::IDebtApi;

use crate::client::ApiClient;

fn http_method(method: MutationMethod) -> Option<Method> {
    match method {
        MutationMethod::Post => Some(Method::POST),
        MutationMethod::Put => Some(Method::PUT),
        MutationMethod::Delete => Some(Method::DELETE),
        MutationMethod::Unsupported => None,
    }
}

#[async_trait::async_trait]
impl IDebtApi for ApiClient {
    async fn list_debts(&self) -> Result<Vec<Record>> {
        self.get_debts().await
    }

    async fn send(
        &self,
        method: MutationMethod,
        path: &str,
        body: Option<&RecordPayload>,
    ) -> Result<Option<Value>> {
        let Some(http) = http_method(method) else {
            bail!("Unsupported mutation method for {}", path);
        };

        let body = if http == Method::DELETE { None } else { body };
        self.write(http, path, body).await
    }

    async fn ping(&self) -> bool {
        self.probe().await
    }
}
