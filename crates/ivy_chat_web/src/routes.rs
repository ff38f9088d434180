//! Router setup and the server loop.

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the router for the chat page and its API.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/settings", get(handlers::get_settings))
        .route("/session", post(handlers::start_session))
        .route("/chat", post(handlers::chat))
        .route("/chat/stream", post(handlers::chat_stream))
        .route("/react", post(handlers::react))
        .route("/history", get(handlers::history))
        .route("/export", get(handlers::export));

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `host:port` and serve `router` until the process exits.
pub async fn serve(host: &str, port: u16, router: Router) -> std::io::Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Ivy chat listening");
    axum::serve(listener, router).await
}
