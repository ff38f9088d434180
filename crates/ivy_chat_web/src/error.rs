//! Error types: orchestrator failures, startup failures, and the JSON error
//! response every API route returns.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use ivy_chat_client::{ClientError, ConfigError};
use ivy_chat_store::StoreError;

/// A chat turn, reaction, or export that could not complete.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("question cannot be empty")]
    EmptyQuestion,
    #[error("username cannot be empty")]
    EmptyUsername,
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error(transparent)]
    Remote(#[from] ClientError),
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Reasons the server refuses to start.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot open store: {0}")]
    Store(#[from] StoreError),
    #[error("cannot determine a store path; pass --store or --memory")]
    NoStorePath,
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "bad_gateway").
    pub error: String,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    /// 400 - missing or invalid input.
    BadRequest(String),
    /// 500 - store or file failure.
    Internal(String),
    /// 502 - the QA service failed or answered garbage.
    BadGateway(String),
    /// 504 - the QA service did not answer within the timeout.
    GatewayTimeout(String),
}

impl ApiError {
    /// Status code and JSON body for this error.
    pub fn parts(self) -> (StatusCode, ErrorBody) {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "bad_gateway", msg),
            ApiError::GatewayTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, "gateway_timeout", msg),
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
        };
        (status, body)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.parts();
        (status, Json(body)).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match &err {
            ChatError::EmptyQuestion | ChatError::EmptyUsername | ChatError::InvalidSettings(_) => {
                ApiError::BadRequest(err.to_string())
            }
            ChatError::Remote(e) if e.is_timeout() => ApiError::GatewayTimeout(err.to_string()),
            ChatError::Remote(_) => ApiError::BadGateway(err.to_string()),
            ChatError::Store(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
