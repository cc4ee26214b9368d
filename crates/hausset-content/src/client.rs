//! HTTP client for the Hausset content API.
//!
//! One [`ContentClient`] owns one `reqwest::Client`; construct it once and
//! hand it to whatever needs content. Every request is logged at the call
//! site with its URL, status and outcome.

use std::time::Duration;

use hausset_core::{
    ContactReceipt, ContactSubmission, ContentBundle, ErrorBody, HealthStatus, ImageList,
    Problem, ProductCatalog, SiteConfig, SourceConfig, ValidationErrors,
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::{ContentError, Result, SubmitError};

/// Fallback message when the relay answers an error without a body.
const SEND_FAILED: &str = "Failed to send message. Please try again later.";

/// Build the shared `reqwest::Client` with a per-request timeout ceiling.
pub fn build_http(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("hausset/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ContentError::Client(e.to_string()))
}

/// GET `url` and decode the JSON body into `T`.
///
/// Non-success statuses, transport failures and bodies that do not match `T`
/// are all errors; nothing partial is returned.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    http: &reqwest::Client,
    url: &str,
) -> Result<T> {
    debug!(%url, "GET");

    let response = http
        .get(url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| ContentError::network(url, &e))?;

    let status = response.status();
    if !status.is_success() {
        debug!(%url, status = status.as_u16(), "non-success status");
        return Err(ContentError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| ContentError::network(url, &e))?;

    let value = serde_json::from_slice(&body).map_err(|source| ContentError::Parse {
        url: url.to_string(),
        source,
    })?;

    debug!(%url, status = status.as_u16(), bytes = body.len(), "response decoded");
    Ok(value)
}

/// Client for the same-origin content API (`{api_base}/content/...`).
#[derive(Debug, Clone)]
pub struct ContentClient {
    http: reqwest::Client,
    api_base: String,
}

impl ContentClient {
    /// Create a client for `api_base` with its own connection pool.
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self> {
        Ok(Self::with_http(build_http(timeout)?, api_base))
    }

    /// Create a client reusing an existing `reqwest::Client`.
    pub fn with_http(http: reqwest::Client, api_base: &str) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Create a client from the `[source]` configuration section.
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        Self::new(&config.api_base, Duration::from_secs(config.timeout_secs))
    }

    /// The underlying HTTP client, for sharing with other sources.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Full URL of an API path such as `content/all`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    /// `GET /content/all`: the whole bundle in one request.
    pub async fn all(&self) -> Result<ContentBundle> {
        fetch_json(&self.http, &self.url("content/all")).await
    }

    /// `GET /content/config`.
    pub async fn config(&self) -> Result<SiteConfig> {
        fetch_json(&self.http, &self.url("content/config")).await
    }

    /// `GET /content/problems`.
    pub async fn problems(&self) -> Result<Vec<Problem>> {
        fetch_json(&self.http, &self.url("content/problems")).await
    }

    /// `GET /content/products`.
    pub async fn products(&self) -> Result<ProductCatalog> {
        fetch_json(&self.http, &self.url("content/products")).await
    }

    /// `GET /content/images`.
    pub async fn images(&self) -> Result<ImageList> {
        fetch_json(&self.http, &self.url("content/images")).await
    }

    /// `GET /health`.
    pub async fn health(&self) -> Result<HealthStatus> {
        fetch_json(&self.http, &self.url("health")).await
    }

    /// `POST /contact`. Sent exactly once; callers show the error text as is.
    pub async fn submit_contact(
        &self,
        submission: &ContactSubmission,
    ) -> std::result::Result<ContactReceipt, SubmitError> {
        let url = self.url("contact");
        debug!(%url, "POST");

        let response = self
            .http
            .post(&url)
            .json(submission)
            .send()
            .await
            .map_err(|e| SubmitError::Network(ContentError::network(&url, &e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| SubmitError::Network(ContentError::network(&url, &e)))?;

        if status.is_success() {
            let receipt: ContactReceipt =
                serde_json::from_slice(&body).map_err(|source| {
                    SubmitError::Network(ContentError::Parse {
                        url: url.clone(),
                        source,
                    })
                })?;
            info!(%url, "contact submission accepted");
            return Ok(receipt);
        }

        let error_body: Option<ErrorBody> = serde_json::from_slice(&body).ok();
        warn!(%url, status = status.as_u16(), "contact submission rejected");

        Err(match (status, error_body) {
            (StatusCode::BAD_REQUEST, Some(ErrorBody { details: Some(details), .. })) => {
                SubmitError::Validation(ValidationErrors::from_fields(details))
            }
            (StatusCode::TOO_MANY_REQUESTS, Some(body)) => SubmitError::RateLimited(body.error),
            (StatusCode::TOO_MANY_REQUESTS, None) => SubmitError::RateLimited(
                "Too many contact form submissions. Please try again later.".to_string(),
            ),
            (_, Some(body)) => SubmitError::Delivery(body.error),
            (_, None) => SubmitError::Delivery(SEND_FAILED.to_string()),
        })
    }
}
