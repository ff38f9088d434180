//! HTTP client for the remote question-answering service: one POST per
//! question, answer read from the `response` field.

use std::time::Duration;

use crate::config::{self, Config};
use crate::messages::{AskRequest, AskResponse};

/// Per-request QA settings. The web UI can override each field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaSettings {
    pub url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl QaSettings {
    /// Defaults for a process: endpoint from `MCM_URL`, the rest from config.
    pub fn from_config(url: String, cfg: &Config) -> Self {
        Self {
            url,
            api_key: cfg.api_key(),
            timeout: Duration::from_secs(cfg.timeout_secs()),
        }
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(config::clamp_timeout_secs(secs));
        self
    }
}

/// Remote QA call failure. None of these are retried.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("QA request timed out after {0:?}")]
    Timeout(Duration),
    #[error("QA request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("QA service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("QA service returned invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("QA service response has no `response` field")]
    MissingResponse,
}

impl ClientError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Timeout(_))
    }
}

/// Remote QA client. Cheap to clone; connections are pooled.
#[derive(Debug, Clone, Default)]
pub struct QaClient {
    http: reqwest::Client,
}

impl QaClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Send `question` and return the complete answer text.
    pub async fn ask(&self, question: &str, settings: &QaSettings) -> Result<String, ClientError> {
        tracing::debug!(url = %settings.url, question_len = question.len(), "asking QA service");

        let result = self.send(question, settings).await;
        if let Err(e) = &result {
            tracing::warn!(url = %settings.url, error = %e, "QA request failed");
        }
        result
    }

    async fn send(&self, question: &str, settings: &QaSettings) -> Result<String, ClientError> {
        let body = AskRequest::new(question, &settings.api_key);
        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                ClientError::Timeout(settings.timeout)
            } else {
                ClientError::Request(e)
            }
        };

        let response = self
            .http
            .post(&settings.url)
            .json(&body)
            .timeout(settings.timeout)
            .send()
            .await
            .map_err(map_err)?;

        let status = response.status();
        let text = response.text().await.map_err(map_err)?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let value: serde_json::Value = serde_json::from_str(&text)?;
        AskResponse::from_json(&value)
            .map(|r| r.response)
            .ok_or(ClientError::MissingResponse)
    }
}
