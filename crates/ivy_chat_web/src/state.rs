//! Application state shared across all route handlers.

use std::sync::Arc;

use ivy_chat_client::QaSettings;

use crate::orchestrator::ChatOrchestrator;
use crate::session::SessionContext;

/// Shared application state. Cheap to clone; handlers get it via `State`.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ChatOrchestrator>,
    /// Settings used when a request carries none.
    pub default_settings: QaSettings,
    /// Identity used when a request carries no identity headers.
    pub default_session: SessionContext,
}

impl AppState {
    pub fn new(
        orchestrator: ChatOrchestrator,
        default_settings: QaSettings,
        default_session: SessionContext,
    ) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            default_settings,
            default_session,
        }
    }
}
