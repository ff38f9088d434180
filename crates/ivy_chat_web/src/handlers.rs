//! Route handler functions for the chat page and its JSON API.

use std::convert::Infallible;
use std::path::Path;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};

use ivy_chat_client::QaSettings;
use ivy_chat_store::{ChatTurn, Reaction, TurnId};

use crate::error::{ApiError, ChatError};
use crate::orchestrator::{ReactionOutcome, TurnRef};
use crate::session::SessionContext;
use crate::settings::{SettingsForm, SettingsResponse, TimeoutRange};
use crate::state::AppState;
use crate::ui;

// =============================================================================
// Request / response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionRequest {
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    /// Overrides the server defaults for this request only.
    #[serde(default)]
    pub settings: Option<SettingsForm>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReactRequest {
    #[serde(default)]
    pub turn_id: Option<TurnId>,
    pub question: String,
    pub response: String,
    pub reaction: Reaction,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub turns: Vec<ChatTurn>,
}

fn resolve_settings(state: &AppState, form: Option<SettingsForm>) -> Result<QaSettings, ApiError> {
    match form {
        Some(f) => Ok(QaSettings::try_from(f)?),
        None => Ok(state.default_settings.clone()),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// GET / - the chat page.
pub async fn index() -> Html<&'static str> {
    Html(ui::CHAT_HTML)
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/settings - defaults for the settings form and the caller's identity.
pub async fn get_settings(
    State(state): State<AppState>,
    session: SessionContext,
) -> Json<SettingsResponse> {
    Json(SettingsResponse {
        settings: SettingsForm::from(&state.default_settings),
        username: session.username,
        session_id: session.session_id,
        timeout_range: TimeoutRange::default(),
    })
}

/// POST /api/session - stub login.
pub async fn start_session(
    State(state): State<AppState>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<SessionContext>, ApiError> {
    let session = state.orchestrator.start_session(&req.username)?;
    Ok(Json(session))
}

/// POST /api/chat - ask, log, and return the turn.
pub async fn chat(
    State(state): State<AppState>,
    session: SessionContext,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatTurn>, ApiError> {
    let settings = resolve_settings(&state, req.settings)?;
    let turn = state
        .orchestrator
        .submit(&session, &req.question, &settings, None)
        .await?;
    Ok(Json(turn))
}

/// POST /api/chat/stream - like `/api/chat`, but as Server-Sent Events:
/// `typing` frames with the cumulative answer, then `turn` or `error`.
pub async fn chat_stream(
    State(state): State<AppState>,
    session: SessionContext,
    Json(req): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let settings = resolve_settings(&state, req.settings)?;
    if req.question.trim().is_empty() {
        return Err(ChatError::EmptyQuestion.into());
    }

    let (events_tx, events_rx) = mpsc::channel::<Event>(64);
    let orchestrator = state.orchestrator.clone();

    tokio::spawn(async move {
        let (progress_tx, mut progress_rx) = mpsc::channel::<String>(32);
        let typing_tx = events_tx.clone();
        let forward = async move {
            while let Some(text) = progress_rx.recv().await {
                // SSE data lines cannot carry CR.
                let frame = Event::default().event("typing").data(text.replace('\r', ""));
                if typing_tx.send(frame).await.is_err() {
                    break;
                }
            }
        };

        let (result, ()) = tokio::join!(
            orchestrator.submit(&session, &req.question, &settings, Some(progress_tx)),
            forward
        );

        let last = match result {
            Ok(turn) => Event::default().event("turn").json_data(&turn),
            Err(e) => {
                let (_, body) = ApiError::from(e).parts();
                Event::default().event("error").json_data(&body)
            }
        };
        match last {
            Ok(event) => {
                // The turn is already logged; a gone client only misses the event.
                let _ = events_tx.send(event).await;
            }
            Err(e) => tracing::warn!(error = %e, "failed to encode final chat event"),
        }
    });

    let stream = ReceiverStream::new(events_rx).map(Ok::<_, Infallible>);
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// POST /api/react - like, dislike or flag a turn.
pub async fn react(
    State(state): State<AppState>,
    session: SessionContext,
    Json(req): Json<ReactRequest>,
) -> Result<Json<ReactionOutcome>, ApiError> {
    let target = TurnRef {
        turn_id: req.turn_id,
        question: req.question,
        response: req.response,
    };
    let outcome = state.orchestrator.react(&session, target, req.reaction)?;
    Ok(Json(outcome))
}

/// GET /api/history - the session's turns, oldest first.
pub async fn history(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<HistoryResponse>, ApiError> {
    let turns = state.orchestrator.history(&session)?;
    Ok(Json(HistoryResponse { turns }))
}

/// GET /api/export - download the session's flagged turns as CSV.
///
/// 204 when nothing is flagged. The file is removed once read, so each
/// download is one-shot.
pub async fn export(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Response, ApiError> {
    let path = match state.orchestrator.export_flagged(&session)? {
        Some(p) => p,
        None => return Ok(StatusCode::NO_CONTENT.into_response()),
    };

    let body = take_export(&path).await?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("flagged.csv");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    )
        .into_response())
}

/// Read an export file and remove it, whether or not the read succeeded.
async fn take_export(path: &Path) -> Result<Vec<u8>, ApiError> {
    let read = tokio::fs::read(path).await;
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove export file");
    }
    read.map_err(|e| ApiError::Internal(format!("cannot read export {}: {}", path.display(), e)))
}
