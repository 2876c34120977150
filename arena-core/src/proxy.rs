//! Pass-through calls to the external AI backend.
//!
//! Bodies are forwarded verbatim in both directions. Failures collapse into
//! two shapes: [`ArenaError::BackendRejected`] carrying the backend's own
//! status, and [`ArenaError::BackendUnavailable`] (502) when no response
//! arrived at all.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use tracing::{debug, error};

use crate::error::{ArenaError, ArenaResult};

const REQUIREMENTS_FAILED: &str = "Failed to generate requirements";
const REQUIREMENTS_UNAVAILABLE: &str = "Backend unavailable. Ensure BACKEND_URL is configured.";
const STATUS_FAILED: &str = "Failed to fetch status";
const DOWNLOAD_FAILED: &str = "Failed to download build";
const BUILD_START_FAILED: &str = "Failed to start build";
const UNAVAILABLE: &str = "Backend unavailable";

/// Turns a non-success response into [`ArenaError::BackendRejected`]. The
/// details are the response text, or the status reason when that is empty.
pub(crate) async fn ensure_success(response: Response, error: &str) -> ArenaResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let details = if text.is_empty() {
        status.canonical_reason().unwrap_or_default().to_string()
    } else {
        text
    };

    Err(ArenaError::BackendRejected {
        status: status.as_u16(),
        error: error.to_string(),
        details,
    })
}

#[derive(Debug, Clone)]
pub struct BackendProxy {
    http: Client,
    base_url: String,
}

impl BackendProxy {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ArenaResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn unreachable(
        route: &'static str,
        message: &'static str,
    ) -> impl FnOnce(reqwest::Error) -> ArenaError {
        move |err| {
            error!(route, error = %err, "Backend proxy failure");
            ArenaError::backend_unavailable_with_source(message, err)
        }
    }

    async fn post_json(
        &self,
        path: &str,
        body: Bytes,
        route: &'static str,
        rejected: &str,
        unavailable: &'static str,
    ) -> ArenaResult<Bytes> {
        let response = self
            .http
            .post(self.url(path))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(Self::unreachable(route, unavailable))?;

        let response = ensure_success(response, rejected).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(Self::unreachable(route, unavailable))?;
        debug!(route, len = bytes.len(), "Proxied response");
        Ok(bytes)
    }

    /// `POST {backend}/requirements`
    pub async fn requirements(&self, body: Bytes) -> ArenaResult<Bytes> {
        self.post_json(
            "/requirements",
            body,
            "requirements",
            REQUIREMENTS_FAILED,
            REQUIREMENTS_UNAVAILABLE,
        )
        .await
    }

    /// `POST {backend}/build/start`
    pub async fn build_start(&self, body: Bytes) -> ArenaResult<Bytes> {
        self.post_json(
            "/build/start",
            body,
            "build:start",
            BUILD_START_FAILED,
            UNAVAILABLE,
        )
        .await
    }

    /// `GET {backend}/build/status/{id}`
    pub async fn build_status(&self, build_id: &str) -> ArenaResult<Bytes> {
        let response = self
            .http
            .get(self.url(&format!("/build/status/{}", build_id)))
            .send()
            .await
            .map_err(Self::unreachable("build:status", UNAVAILABLE))?;

        let response = ensure_success(response, STATUS_FAILED).await?;
        response
            .bytes()
            .await
            .map_err(Self::unreachable("build:status", UNAVAILABLE))
    }

    /// `GET {backend}/build/download/{id}`. The successful response is
    /// returned unread so the caller can stream it onwards.
    pub async fn build_download(&self, build_id: &str) -> ArenaResult<Response> {
        let response = self
            .http
            .get(self.url(&format!("/build/download/{}", build_id)))
            .send()
            .await
            .map_err(Self::unreachable("build:download", UNAVAILABLE))?;

        ensure_success(response, DOWNLOAD_FAILED).await
    }
}
