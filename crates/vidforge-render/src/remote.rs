//! Remote rendering service client.
//!
//! Submits a render request, then polls the job's progress handle until
//! it reports an output file or a terminal error. Failures are returned
//! as typed values so retriable conditions (rate limits, transient
//! faults) stay distinguishable from genuinely fatal ones.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use vidforge_models::RenderRequest;

/// Typed failure classification for one remote render attempt.
///
/// Retriable conditions are values, not exceptions: the dispatcher
/// matches on the variant to pick its retry policy.
#[derive(Debug, Clone, Error)]
pub enum RemoteRenderError {
    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("audio playback failure: {0}")]
    AudioPlayback(String),

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("render failed: {0}")]
    Fatal(String),
}

impl RemoteRenderError {
    /// Classify a renderer-reported error message by its signature.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        const RATE_SIGNATURES: &[&str] = &[
            "rate exceeded",
            "rate limit",
            "concurrency limit",
            "too many requests",
            "429",
        ];
        const AUDIO_SIGNATURES: &[&str] =
            &["cannot play audio", "audio playback", "decodeaudiodata"];
        const TRANSIENT_SIGNATURES: &[&str] = &[
            "timeout",
            "timed out",
            "connection reset",
            "econnreset",
            "socket hang up",
            "network",
            "502",
            "503",
        ];

        if RATE_SIGNATURES.iter().any(|s| lower.contains(s)) {
            Self::RateLimited(message)
        } else if AUDIO_SIGNATURES.iter().any(|s| lower.contains(s)) {
            Self::AudioPlayback(message)
        } else if TRANSIENT_SIGNATURES.iter().any(|s| lower.contains(s)) {
            Self::Transient(message)
        } else {
            Self::Fatal(message)
        }
    }

    pub fn is_retriable(&self) -> bool {
        !matches!(self, Self::Fatal(_))
    }
}

/// Completed remote render.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// Location of the rendered artifact
    pub artifact_url: String,
}

/// A remote rendering backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteRenderer: Send + Sync {
    /// Render one request to completion.
    async fn render(&self, request: &RenderRequest) -> Result<RenderOutput, RemoteRenderError>;
}

/// Response to a render submission.
#[derive(Debug, Deserialize, Serialize)]
struct SubmitResponse {
    job_id: String,
}

/// Pollable progress handle state.
#[derive(Debug, Deserialize, Serialize)]
struct JobStatus {
    /// Overall progress fraction in [0,1]
    #[serde(default)]
    overall_progress: f64,
    /// Set once rendering finished
    #[serde(default)]
    done: bool,
    /// Output location, present once done
    #[serde(default)]
    output_url: Option<String>,
    /// Terminal errors reported by the renderer
    #[serde(default)]
    errors: Vec<String>,
}

/// HTTP client for the remote rendering service.
pub struct HttpRenderClient {
    http: reqwest::Client,
    base_url: String,
    poll_interval: Duration,
    poll_timeout: Duration,
}

impl HttpRenderClient {
    pub fn new(base_url: impl Into<String>, poll_interval: Duration, poll_timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            poll_interval,
            poll_timeout,
        }
    }

    async fn submit(&self, request: &RenderRequest) -> Result<String, RemoteRenderError> {
        let url = format!("{}/renders", self.base_url);
        debug!(composition = %request.composition_id, "Submitting render request");

        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteRenderError::classify(format!(
                "submit returned {}: {}",
                status, body
            )));
        }

        let submitted: SubmitResponse = response
            .json()
            .await
            .map_err(|e| RemoteRenderError::Fatal(format!("invalid submit response: {}", e)))?;
        Ok(submitted.job_id)
    }

    async fn poll(&self, job_id: &str) -> Result<JobStatus, RemoteRenderError> {
        let url = format!("{}/renders/{}", self.base_url, job_id);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteRenderError::classify(format!(
                "poll returned {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| RemoteRenderError::Fatal(format!("invalid job status: {}", e)))
    }
}

#[async_trait]
impl RemoteRenderer for HttpRenderClient {
    async fn render(&self, request: &RenderRequest) -> Result<RenderOutput, RemoteRenderError> {
        let job_id = self.submit(request).await?;
        let deadline = Instant::now() + self.poll_timeout;

        loop {
            let status = self.poll(&job_id).await?;

            if !status.errors.is_empty() {
                let joined = status.errors.join("; ");
                warn!(job_id = %job_id, errors = %joined, "Remote render reported errors");
                return Err(RemoteRenderError::classify(joined));
            }

            if status.done {
                if let Some(artifact_url) = status.output_url {
                    info!(job_id = %job_id, "Remote render complete");
                    return Ok(RenderOutput { artifact_url });
                }
                return Err(RemoteRenderError::Fatal(
                    "job finished without an output file".to_string(),
                ));
            }

            debug!(
                job_id = %job_id,
                progress = status.overall_progress,
                "Remote render in progress"
            );

            if Instant::now() + self.poll_interval > deadline {
                // Let the dispatcher's retry budget decide what a stuck
                // job means, rather than deciding terminality here.
                return Err(RemoteRenderError::Transient(format!(
                    "render polling timed out after {:?}",
                    self.poll_timeout
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Map HTTP-layer failures into the typed classification.
fn map_reqwest_error(e: reqwest::Error) -> RemoteRenderError {
    if e.is_timeout() || e.is_connect() {
        RemoteRenderError::Transient(e.to_string())
    } else if e.status().map(|s| s.as_u16()) == Some(429) {
        RemoteRenderError::RateLimited(e.to_string())
    } else {
        RemoteRenderError::Fatal(e.to_string())
    }
}
