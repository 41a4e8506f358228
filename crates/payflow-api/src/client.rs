//! PayFlow debts API client
//!
//! Provides a typed HTTP client for the `/debts` REST resource. Handles
//! base URL construction, JSON bodies and the translation of every failure
//! into [`ApiError`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use payflow_api::ApiClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = ApiClient::new("http://localhost:5000/api", Duration::from_secs(15))?;
//! let debts = client.get_debts().await?;
//! println!("{} debts", debts.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;

use payflow_core::config::DEFAULT_BASE_URL;
use payflow_core::domain::{Record, RecordPayload, DEBTS_PATH};
use payflow_core::ports::ApiError;

use crate::errors;

/// HTTP client for the PayFlow API
pub struct ApiClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL without a trailing slash, e.g. `http://localhost:5000/api`
    base_url: String,
}

impl ApiClient {
    /// Creates a client with a per-request timeout
    ///
    /// # Arguments
    /// * `base_url` - API root; one trailing `/` is trimmed
    /// * `timeout` - Total time allowed for each request
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: trim_base(base_url.into()),
        })
    }

    /// Creates a client with default reqwest settings (useful for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: trim_base(base_url.into()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates a request builder for the given method and path
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `path` - API path relative to the base URL (e.g. "/debts")
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, &url)
    }

    /// Sends a request and returns the response if its status is a success
    pub async fn execute(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await.map_err(errors::from_transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), "Request rejected by server");
        Err(errors::from_status(status, &body).into())
    }

    /// Reads a response body as JSON, `None` when it is empty
    pub async fn read_json(response: Response) -> Result<Option<Value>> {
        let bytes = response.bytes().await.map_err(errors::from_transport)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let value = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        Ok(Some(value))
    }

    /// `GET /debts`
    pub async fn get_debts(&self) -> Result<Vec<Record>> {
        debug!("Fetching debt list");

        let response = self.execute(self.request(Method::GET, DEBTS_PATH)).await?;
        let body = Self::read_json(response)
            .await?
            .ok_or_else(|| ApiError::InvalidResponse("empty debt list body".to_string()))?;

        let records: Vec<Record> = serde_json::from_value(body)
            .map_err(|e| ApiError::InvalidResponse(format!("malformed debt list: {e}")))?;

        debug!(count = records.len(), "Fetched debt list");
        Ok(records)
    }

    /// Sends a JSON write request to `path`
    pub async fn write(
        &self,
        method: Method,
        path: &str,
        body: Option<&RecordPayload>,
    ) -> Result<Option<Value>> {
        debug!(%method, path, "Sending write request");

        let mut builder = self.request(method, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = self.execute(builder).await?;
        Self::read_json(response).await
    }

    /// `HEAD {base}`: true when the server answered with any status
    pub async fn probe(&self) -> bool {
        match self.request(Method::HEAD, "").send().await {
            Ok(response) => {
                debug!(status = response.status().as_u16(), "Probe answered");
                true
            }
            Err(e) => {
                debug!(error = %e, "Probe failed");
                false
            }
        }
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }
}

fn trim_base(mut base_url: String) -> String {
    if base_url.ends_with('/') {
        base_url.pop();
    }
    base_url
}
