//! Ivy chat web server: the chat orchestrator, simulated typing, and the
//! axum API plus embedded page that drive them.

pub mod cli;
pub mod clock;
pub mod error;
pub mod handlers;
pub mod orchestrator;
pub mod routes;
pub mod session;
pub mod settings;
pub mod state;
pub mod typing;
pub mod ui;

use std::sync::Arc;
use std::time::Duration;

use ivy_chat_client::{config, Config, QaClient, QaSettings};
use ivy_chat_store::{InteractionStore, LoginStore, MemoryStore, SqliteStore};

pub use cli::CliArgs;
pub use error::{ApiError, ChatError, StartupError};
pub use orchestrator::{ChatOrchestrator, ReactionOutcome, TurnRef};
pub use routes::create_router;
pub use session::SessionContext;
pub use state::AppState;

/// Start the server. Fails before binding anything when `MCM_URL` is unset.
pub async fn run(args: CliArgs) -> Result<(), StartupError> {
    let qa_url = config::required_qa_url()?;

    let cfg = match args.resolve_config_path() {
        Some(path) => {
            let cfg = config::load_or_default(&path)?;
            tracing::info!(path = %path.display(), "Configuration loaded");
            cfg
        }
        None => Config::default(),
    };

    let state = build_state(&args, &cfg, qa_url)?;
    let host = args.resolve_host(&cfg);
    let port = args.resolve_port(&cfg);

    routes::serve(&host, port, create_router(state)).await?;
    Ok(())
}

/// Open the stores and assemble the shared state.
pub fn build_state(args: &CliArgs, cfg: &Config, qa_url: String) -> Result<AppState, StartupError> {
    let (interactions, logins) = open_stores(args, cfg)?;

    let orchestrator = ChatOrchestrator::new(QaClient::new(), interactions, logins, cfg.export_dir())
        .with_typewriter(typing::Typewriter::new(Duration::from_millis(cfg.typing_delay_ms())));

    Ok(AppState::new(
        orchestrator,
        QaSettings::from_config(qa_url, cfg),
        SessionContext::new(cfg.username(), cfg.session_id()),
    ))
}

fn open_stores(
    args: &CliArgs,
    cfg: &Config,
) -> Result<(Arc<dyn InteractionStore>, Arc<dyn LoginStore>), StartupError> {
    if args.memory {
        tracing::info!("Using in-memory store");
        let store = Arc::new(MemoryStore::new());
        let interactions: Arc<dyn InteractionStore> = store.clone();
        let logins: Arc<dyn LoginStore> = store;
        return Ok((interactions, logins));
    }

    let path = args.resolve_store(cfg).ok_or(StartupError::NoStorePath)?;
    let store = Arc::new(SqliteStore::open(&path)?);
    let interactions: Arc<dyn InteractionStore> = store.clone();
    let logins: Arc<dyn LoginStore> = store;
    Ok((interactions, logins))
}
