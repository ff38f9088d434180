//! Settings form shared with the page: the QA endpoint, API key and timeout
//! the user can change at runtime.

use std::time::Duration;

use axum::http::Uri;
use serde::{Deserialize, Serialize};

use ivy_chat_client::config::{self, MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS, TIMEOUT_STEP_SECS};
use ivy_chat_client::QaSettings;

use crate::error::ChatError;

/// JSON-friendly settings values sent to/from the page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingsForm {
    pub mcm_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl From<&QaSettings> for SettingsForm {
    fn from(s: &QaSettings) -> Self {
        Self {
            mcm_url: s.url.clone(),
            api_key: s.api_key.clone(),
            timeout_secs: s.timeout.as_secs(),
        }
    }
}

impl TryFrom<SettingsForm> for QaSettings {
    type Error = ChatError;

    /// Validate the URL and snap the timeout onto the slider's range.
    fn try_from(f: SettingsForm) -> Result<Self, Self::Error> {
        let url = f.mcm_url.trim();
        let uri: Uri = url
            .parse()
            .map_err(|e| ChatError::InvalidSettings(format!("MCM URL {:?}: {}", url, e)))?;
        match uri.scheme_str() {
            Some("http") | Some("https") if uri.host().is_some() => {}
            _ => {
                return Err(ChatError::InvalidSettings(format!(
                    "MCM URL {:?} must be an http(s) URL",
                    url
                )))
            }
        }

        Ok(QaSettings {
            url: url.to_string(),
            api_key: f.api_key,
            timeout: Duration::from_secs(config::clamp_timeout_secs(f.timeout_secs)),
        })
    }
}

/// Timeout slider bounds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeoutRange {
    pub min: u64,
    pub max: u64,
    pub step: u64,
}

impl Default for TimeoutRange {
    fn default() -> Self {
        Self {
            min: MIN_TIMEOUT_SECS,
            max: MAX_TIMEOUT_SECS,
            step: TIMEOUT_STEP_SECS,
        }
    }
}

/// Payload of `GET /api/settings`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingsResponse {
    pub settings: SettingsForm,
    pub username: String,
    pub session_id: String,
    pub timeout_range: TimeoutRange,
}
