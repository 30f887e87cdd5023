//! HTTP client for the analysis service.
//!
//! The service exposes `GET /health` and `POST /upload` (multipart CSV).
//! This client only moves bytes; interpreting the result is the job of
//! [`crate::ingest::normalize`].

use crate::config::ServiceConfig;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Body of a successful `/health` call.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// Error body returned by the service on 4xx/5xx.
#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    error: String,
}

/// A raw analysis result plus the client-side wall time it took.
#[derive(Debug, Clone)]
pub struct UploadResult {
    pub payload: Value,
    pub elapsed: Duration,
}

/// Client for one analysis service instance.
pub struct ServiceClient {
    base_url: String,
    timeout_seconds: u64,
    http_client: reqwest::Client,
}

impl ServiceClient {
    /// Create a client. Fails if the URL is not http(s) or the HTTP stack cannot start.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let base_url = config.url.trim_end_matches('/').to_string();
        let parsed = reqwest::Url::parse(&base_url)
            .with_context(|| format!("Invalid service URL: {}", config.url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("Service URL must start with 'http://' or 'https://'");
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url,
            timeout_seconds: config.timeout_seconds,
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the service is up.
    pub async fn health(&self) -> Result<HealthStatus> {
        let url = format!("{}/health", self.base_url);
        debug!("Checking health at {}", url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.describe_send_error(e))?;

        if !response.status().is_success() {
            anyhow::bail!("Service health check failed: HTTP {}", response.status());
        }

        response
            .json::<HealthStatus>()
            .await
            .context("Failed to parse health response")
    }

    /// Upload a transactions CSV and return the raw analysis payload.
    pub async fn upload(&self, csv_path: &Path) -> Result<UploadResult> {
        let bytes = tokio::fs::read(csv_path)
            .await
            .with_context(|| format!("Failed to read {}", csv_path.display()))?;

        let file_name = csv_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "transactions.csv".to_string());

        info!("Uploading {} ({} bytes)", file_name, bytes.len());

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("text/csv")
            .context("Failed to build upload part")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let url = format!("{}/upload", self.base_url);
        let start = Instant::now();

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.describe_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Server error {}: {}",
                status,
                service_error_message(&body)
            ));
        }

        let payload: Value = response
            .json()
            .await
            .context("Failed to parse analysis response")?;
        let elapsed = start.elapsed();
        debug!("Analysis returned after {:.1}s", elapsed.as_secs_f64());

        Ok(UploadResult { payload, elapsed })
    }

    fn describe_send_error(&self, e: reqwest::Error) -> anyhow::Error {
        if e.is_timeout() {
            anyhow::anyhow!("Request timed out after {}s", self.timeout_seconds)
        } else if e.is_connect() {
            anyhow::anyhow!(
                "Cannot connect to analysis service at {}. Is it running?",
                self.base_url
            )
        } else {
            anyhow::anyhow!("Failed to send request: {}", e)
        }
    }
}

/// Pull the `error` field out of a service error body, falling back to the raw text.
fn service_error_message(body: &str) -> String {
    match serde_json::from_str::<ServiceErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.trim().is_empty() => "no response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}
