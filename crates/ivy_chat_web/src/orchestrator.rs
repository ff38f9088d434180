//! Chat orchestration: asks the QA service, replays the answer through the
//! typewriter, and logs turns, reactions and logins to the stores.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use ivy_chat_client::{QaClient, QaSettings};
use ivy_chat_store::{export, ChatTurn, InteractionStore, LoginEvent, LoginStore, Reaction, TurnId};

use crate::clock::{Clock, SystemClock};
use crate::error::ChatError;
use crate::session::SessionContext;
use crate::typing::Typewriter;

/// What the page knows about the turn a reaction is for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRef {
    #[serde(default)]
    pub turn_id: Option<TurnId>,
    pub question: String,
    pub response: String,
}

/// Result of [`ChatOrchestrator::react`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "turn", rename_all = "snake_case")]
pub enum ReactionOutcome {
    /// An existing turn had its reaction replaced.
    Updated(ChatTurn),
    /// No turn matched; a new one carrying the reaction was logged.
    Inserted(ChatTurn),
}

impl ReactionOutcome {
    pub fn turn(&self) -> &ChatTurn {
        match self {
            ReactionOutcome::Updated(t) | ReactionOutcome::Inserted(t) => t,
        }
    }
}

pub struct ChatOrchestrator {
    qa: QaClient,
    interactions: Arc<dyn InteractionStore>,
    logins: Arc<dyn LoginStore>,
    clock: Arc<dyn Clock>,
    typewriter: Typewriter,
    export_dir: PathBuf,
}

impl ChatOrchestrator {
    pub fn new(
        qa: QaClient,
        interactions: Arc<dyn InteractionStore>,
        logins: Arc<dyn LoginStore>,
        export_dir: PathBuf,
    ) -> Self {
        Self {
            qa,
            interactions,
            logins,
            clock: Arc::new(SystemClock),
            typewriter: Typewriter::default(),
            export_dir,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_typewriter(mut self, typewriter: Typewriter) -> Self {
        self.typewriter = typewriter;
        self
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Stub login: mint a session id and record the login.
    pub fn start_session(&self, username: &str) -> Result<SessionContext, ChatError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ChatError::EmptyUsername);
        }

        let session = SessionContext::new(username, Uuid::new_v4().to_string());
        let event = LoginEvent::new(&session.username, &session.session_id, &self.clock.now());
        self.logins.record_login(&event)?;

        info!(username = %session.username, session_id = %session.session_id, "Session started");
        Ok(session)
    }

    /// Ask the QA service and log the turn with no reaction.
    ///
    /// Nothing is written when the remote call fails. When `progress` is
    /// given, the answer is replayed into it before the turn is logged; a
    /// closed receiver only cuts the replay short.
    pub async fn submit(
        &self,
        session: &SessionContext,
        question: &str,
        settings: &QaSettings,
        progress: Option<mpsc::Sender<String>>,
    ) -> Result<ChatTurn, ChatError> {
        if question.trim().is_empty() {
            return Err(ChatError::EmptyQuestion);
        }

        let response = match self.qa.ask(question, settings).await {
            Ok(r) => r,
            Err(e) => {
                warn!(
                    username = %session.username,
                    session_id = %session.session_id,
                    error = %e,
                    "Turn aborted, nothing logged"
                );
                return Err(e.into());
            }
        };

        if let Some(tx) = progress {
            let frames = self.typewriter.replay(&response, &tx).await;
            debug!(frames, "typing replay finished");
        }

        let turn = ChatTurn::record(
            &session.username,
            &session.session_id,
            question,
            response,
            Reaction::NoReaction,
            &self.clock.now(),
        );
        self.interactions.put_turn(&turn)?;

        info!(
            turn_id = %turn.turn_id,
            username = %turn.username,
            session_id = %turn.session_id,
            "Turn logged"
        );
        Ok(turn)
    }

    /// Apply `reaction` to the referenced turn, or log a new turn carrying
    /// it when the reference does not resolve to a turn of this session.
    /// Turns of other sessions are never modified.
    pub fn react(
        &self,
        session: &SessionContext,
        target: TurnRef,
        reaction: Reaction,
    ) -> Result<ReactionOutcome, ChatError> {
        if let Some(id) = target.turn_id {
            match self.interactions.get_turn(&id)? {
                Some(mut turn)
                    if turn.username == session.username && turn.session_id == session.session_id =>
                {
                    if self.interactions.update_reaction(&id, reaction)? {
                        turn.reaction = reaction;
                        info!(turn_id = %id, %reaction, "Reaction updated");
                        return Ok(ReactionOutcome::Updated(turn));
                    }
                    debug!(turn_id = %id, "turn vanished before update, inserting a new record");
                }
                Some(_) => {
                    warn!(turn_id = %id, username = %session.username, "turn belongs to another session, inserting a new record");
                }
                None => debug!(turn_id = %id, "unknown turn id, inserting a new record"),
            }
        }

        let turn = ChatTurn::record(
            &session.username,
            &session.session_id,
            target.question,
            target.response,
            reaction,
            &self.clock.now(),
        );
        self.interactions.put_turn(&turn)?;

        info!(turn_id = %turn.turn_id, %reaction, "Reaction logged as new turn");
        Ok(ReactionOutcome::Inserted(turn))
    }

    /// The session's turns, oldest first.
    pub fn history(&self, session: &SessionContext) -> Result<Vec<ChatTurn>, ChatError> {
        Ok(self
            .interactions
            .session_turns(&session.username, &session.session_id)?)
    }

    /// Write the session's flagged turns to a CSV file in the export
    /// directory. `None` when nothing is flagged.
    pub fn export_flagged(&self, session: &SessionContext) -> Result<Option<PathBuf>, ChatError> {
        Ok(export::export_flagged(
            self.interactions.as_ref(),
            &session.username,
            &session.session_id,
            &self.export_dir,
            self.clock.now().with_timezone(&chrono::Utc),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ivy_chat_store::MemoryStore;

    fn orchestrator(store: Arc<MemoryStore>) -> ChatOrchestrator {
        ChatOrchestrator::new(
            QaClient::new(),
            store.clone(),
            store,
            std::env::temp_dir(),
        )
        .with_typewriter(Typewriter::instant())
    }

    fn unreachable_settings() -> QaSettings {
        QaSettings {
            url: "http://127.0.0.1:9/ask".into(),
            api_key: "k".into(),
            timeout: std::time::Duration::from_secs(5),
        }
    }

    #[test]
    fn start_session_records_login() {
        let store = Arc::new(MemoryStore::new());
        let orch = orchestrator(store.clone());

        let session = orch.start_session(" alice ").unwrap();
        assert_eq!(session.username, "alice");
        assert!(Uuid::parse_str(&session.session_id).is_ok());

        let logins = store.logins().unwrap();
        assert_eq!(logins.len(), 1);
        assert_eq!(logins[0].session_id, session.session_id);
    }

    #[test]
    fn blank_username_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let err = orchestrator(store.clone()).start_session("  ").unwrap_err();
        assert!(matches!(err, ChatError::EmptyUsername));
        assert!(store.logins().unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_question_is_rejected_before_any_call() {
        let store = Arc::new(MemoryStore::new());
        let orch = orchestrator(store.clone());
        let session = SessionContext::new("alice", "s1");

        let err = orch
            .submit(&session, " \n", &unreachable_settings(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::EmptyQuestion));
        assert!(store.turns().unwrap().is_empty());
    }

    #[test]
    fn reaction_without_id_inserts() {
        let store = Arc::new(MemoryStore::new());
        let orch = orchestrator(store.clone());
        let session = SessionContext::new("alice", "s1");

        let outcome = orch
            .react(
                &session,
                TurnRef {
                    turn_id: None,
                    question: "q".into(),
                    response: "r".into(),
                },
                Reaction::Flagged,
            )
            .unwrap();

        assert!(matches!(outcome, ReactionOutcome::Inserted(_)));
        assert_eq!(outcome.turn().reaction, Reaction::Flagged);
        assert_eq!(store.turns().unwrap().len(), 1);
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let at = chrono::Utc::now();
        let turn = ChatTurn::record("a", "s", "q", "r", Reaction::Liked, &at);
        let json = serde_json::to_value(ReactionOutcome::Updated(turn)).unwrap();
        assert_eq!(json["outcome"], "updated");
        assert_eq!(json["turn"]["reaction"], "liked");
    }
}
