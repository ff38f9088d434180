//! Store traits. Implementations are synchronous and shared across handler
//! tasks behind `Arc`.

use crate::error::StoreError;
use crate::model::{ChatTurn, LoginEvent, Reaction, TurnId};

/// Table of chat turns keyed by [`TurnId`].
pub trait InteractionStore: Send + Sync {
    /// Insert `turn`, overwriting any record with the same id.
    fn put_turn(&self, turn: &ChatTurn) -> Result<(), StoreError>;

    fn get_turn(&self, turn_id: &TurnId) -> Result<Option<ChatTurn>, StoreError>;

    /// Set the reaction of an existing turn. Returns `false` and writes
    /// nothing when no turn has this id.
    fn update_reaction(&self, turn_id: &TurnId, reaction: Reaction) -> Result<bool, StoreError>;

    /// Flagged turns for one user and session, oldest first.
    fn flagged_turns(&self, username: &str, session_id: &str) -> Result<Vec<ChatTurn>, StoreError>;

    /// All turns for one user and session, oldest first.
    fn session_turns(&self, username: &str, session_id: &str) -> Result<Vec<ChatTurn>, StoreError>;
}

/// Append-only table of session starts.
pub trait LoginStore: Send + Sync {
    fn record_login(&self, event: &LoginEvent) -> Result<(), StoreError>;
}
