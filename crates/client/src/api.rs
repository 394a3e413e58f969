//! REST API client for the map-poster backend.
//!
//! Wraps the backend HTTP API (themes, theme creation, geocoding,
//! generation, job status, poster download) using [`reqwest`]. All routes
//! live under `/api` on the configured base URL.

use std::path::Path;
use std::time::Duration;

use maptoposter_core::generation::GenerationConfig;
use maptoposter_core::theme::{GeocodeResult, ThemeDetail, ThemeDraft, ThemeSummary};
use serde::Deserialize;

use crate::job::{JobStatusReport, PosterArtifact};

/// HTTP client for a single backend instance.
#[derive(Debug, Clone)]
pub struct PosterApi {
    client: reqwest::Client,
    base_url: String,
}

/// Response of `POST /api/theme/create`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedTheme {
    #[serde(default)]
    pub theme_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    job_id: String,
}

/// Errors from the backend REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum PosterApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Backend error ({status}): {message}")]
    Api {
        status: u16,
        /// The `error` field of a JSON body, or the raw body.
        message: String,
    },

    /// The backend answered 2xx but reported `success: false`.
    #[error("{0}")]
    Rejected(String),

    /// The response body did not have the expected shape.
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Writing a downloaded file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PosterApi {
    /// Create a new API client for a backend.
    ///
    /// * `base_url` - Base HTTP URL, e.g. `http://localhost:5000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create an API client whose requests give up after `timeout`.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PosterApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of a backend route such as `/api/themes`.
    pub fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    /// List the theme catalogue (`GET /api/themes`).
    pub async fn list_themes(&self) -> Result<Vec<ThemeSummary>, PosterApiError> {
        let response = self.client.get(self.url("/api/themes")).send().await?;
        Self::parse_response(response).await
    }

    /// Fetch one theme in full (`GET /api/theme/{id}`).
    pub async fn get_theme(&self, theme_id: &str) -> Result<ThemeDetail, PosterApiError> {
        let response = self
            .client
            .get(self.url(&format!("/api/theme/{theme_id}")))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Submit a new theme (`POST /api/theme/create`).
    pub async fn create_theme(&self, draft: &ThemeDraft) -> Result<CreatedTheme, PosterApiError> {
        let response = self
            .client
            .post(self.url("/api/theme/create"))
            .json(draft)
            .send()
            .await?;

        Self::parse_envelope(response).await
    }

    /// Resolve an address to coordinates (`POST /api/geocode`).
    pub async fn geocode(&self, address: &str) -> Result<GeocodeResult, PosterApiError> {
        let response = self
            .client
            .post(self.url("/api/geocode"))
            .json(&serde_json::json!({ "address": address }))
            .send()
            .await?;

        Self::parse_envelope(response).await
    }

    /// Start a generation job (`POST /api/generate`). Returns the job ID.
    pub async fn submit_generation(
        &self,
        config: &GenerationConfig,
    ) -> Result<String, PosterApiError> {
        let response = self
            .client
            .post(self.url("/api/generate"))
            .json(config)
            .send()
            .await?;

        let body: GenerateResponse = Self::parse_envelope(response).await?;
        Ok(body.job_id)
    }

    /// Fetch the status of a job (`GET /api/status/{job_id}`).
    pub async fn job_status(&self, job_id: &str) -> Result<JobStatusReport, PosterApiError> {
        let response = self
            .client
            .get(self.url(&format!("/api/status/{job_id}")))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Download the full-resolution poster to `dest`. Returns the number
    /// of bytes written.
    pub async fn download_poster(
        &self,
        artifact: &PosterArtifact,
        dest: &Path,
    ) -> Result<u64, PosterApiError> {
        let response = self
            .client
            .get(self.url(&artifact.download_path()))
            .send()
            .await?;

        let bytes = Self::ensure_success(response).await?.bytes().await?;
        tokio::fs::write(dest, &bytes).await?;

        tracing::info!(
            file = %artifact.file_name(),
            dest = %dest.display(),
            bytes = bytes.len(),
            "Poster downloaded",
        );
        Ok(bytes.len() as u64)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`PosterApiError::Api`]
    /// carrying the backend's error message on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, PosterApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(PosterApiError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PosterApiError> {
        let response = Self::ensure_success(response).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Parse a `{success, error?, ...}` body, rejecting `success: false`.
    async fn parse_envelope<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PosterApiError> {
        let value: serde_json::Value = Self::parse_response(response).await?;

        let success = value
            .get("success")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);
        if !success {
            let reason = value
                .get("error")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("Request was not successful");
            return Err(PosterApiError::Rejected(reason.to_string()));
        }

        Ok(serde_json::from_value(value)?)
    }
}

/// The `error` field of a JSON error body, or the trimmed body itself.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
