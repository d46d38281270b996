//! Detection Backend Client
//!
//! HTTP client for the SafeSite detection backend.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;

use super::types::{DetectionReply, RawDetectionReply, SensorReading};
use super::TelemetrySource;

/// Detection backend REST client
pub struct BackendClient {
    client: Client,
    config: BackendConfig,
}

/// Configuration for the backend client
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the backend (e.g., "http://127.0.0.1:5001")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5001".to_string(),
            request_timeout_ms: 5000,
        }
    }
}

impl BackendClient {
    /// Create a new backend client with the given configuration
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, BackendError> {
        self.client.get(url).send().await.map_err(classify)
    }
}

#[async_trait]
impl TelemetrySource for BackendClient {
    async fn fetch_reading(&self) -> Result<SensorReading, BackendError> {
        let url = self.endpoint("get_data");
        let response = self.get(&url).await?;

        let status = response.status();
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            return Err(BackendError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }

        let body = response.text().await.map_err(classify)?;
        serde_json::from_str(&body).map_err(|e| BackendError::Malformed(e.to_string()))
    }

    async fn run_detection(&self) -> Result<DetectionReply, BackendError> {
        let url = self.endpoint("run_ai");
        let response = self.get(&url).await?;

        // Error replies (404/500) still carry a status/message body
        let status = response.status();
        let body = response.text().await.map_err(classify)?;
        tracing::debug!(status = status.as_u16(), "Detection run answered");

        let raw: RawDetectionReply =
            serde_json::from_str(&body).map_err(|e| BackendError::Malformed(e.to_string()))?;

        raw.interpret()
            .ok_or_else(|| BackendError::Malformed("success reply without data".to_string()))
    }
}

fn classify(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else if e.is_connect() {
        BackendError::Unavailable
    } else {
        BackendError::Request(e)
    }
}

// ============================================
// Errors
// ============================================

/// Errors that can occur when talking to the detection backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Backend unavailable")]
    Unavailable,

    #[error("Request timeout")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}
