//! Per-request identity. Every handler gets an explicit [`SessionContext`]
//! instead of reading process-wide placeholders.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

pub const USERNAME_HEADER: &str = "x-ivy-username";
pub const SESSION_HEADER: &str = "x-ivy-session";

/// The acting user and session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub username: String,
    pub session_id: String,
}

impl SessionContext {
    pub fn new(username: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            session_id: session_id.into(),
        }
    }

    /// Read identity headers, falling back to `defaults` for any that are
    /// absent or blank.
    pub fn from_headers(headers: &HeaderMap, defaults: &SessionContext) -> Result<Self, ApiError> {
        let read = |name: &str, fallback: &str| -> Result<String, ApiError> {
            match headers.get(name) {
                Some(v) => {
                    let s = v
                        .to_str()
                        .map_err(|_| ApiError::BadRequest(format!("header {} is not valid text", name)))?
                        .trim();
                    Ok(if s.is_empty() { fallback } else { s }.to_string())
                }
                None => Ok(fallback.to_string()),
            }
        };

        Ok(Self {
            username: read(USERNAME_HEADER, &defaults.username)?,
            session_id: read(SESSION_HEADER, &defaults.session_id)?,
        })
    }
}

impl FromRequestParts<AppState> for SessionContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        SessionContext::from_headers(&parts.headers, &state.default_session)
    }
}
