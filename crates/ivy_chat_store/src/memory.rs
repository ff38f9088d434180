//! In-memory store. Linear scans; meant for tests and throwaway sessions.

use std::sync::{Mutex, MutexGuard};

use crate::error::StoreError;
use crate::model::{ChatTurn, LoginEvent, Reaction, TurnId};
use crate::store::{InteractionStore, LoginStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    turns: Mutex<Vec<ChatTurn>>,
    logins: Mutex<Vec<LoginEvent>>,
}

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    m.lock().map_err(|e| StoreError::Lock(e.to_string()))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored turn in insertion order.
    pub fn turns(&self) -> Result<Vec<ChatTurn>, StoreError> {
        Ok(lock(&self.turns)?.clone())
    }

    pub fn logins(&self) -> Result<Vec<LoginEvent>, StoreError> {
        Ok(lock(&self.logins)?.clone())
    }

    fn select(
        &self,
        pred: impl Fn(&ChatTurn) -> bool,
    ) -> Result<Vec<ChatTurn>, StoreError> {
        let mut out: Vec<ChatTurn> = lock(&self.turns)?
            .iter()
            .filter(|t| pred(t))
            .cloned()
            .collect();
        out.sort_by_key(|t| t.created_at);
        Ok(out)
    }
}

impl InteractionStore for MemoryStore {
    fn put_turn(&self, turn: &ChatTurn) -> Result<(), StoreError> {
        let mut turns = lock(&self.turns)?;
        match turns.iter_mut().find(|t| t.turn_id == turn.turn_id) {
            Some(existing) => *existing = turn.clone(),
            None => turns.push(turn.clone()),
        }
        Ok(())
    }

    fn get_turn(&self, turn_id: &TurnId) -> Result<Option<ChatTurn>, StoreError> {
        Ok(lock(&self.turns)?
            .iter()
            .find(|t| t.turn_id == *turn_id)
            .cloned())
    }

    fn update_reaction(&self, turn_id: &TurnId, reaction: Reaction) -> Result<bool, StoreError> {
        let mut turns = lock(&self.turns)?;
        match turns.iter_mut().find(|t| t.turn_id == *turn_id) {
            Some(t) => {
                t.reaction = reaction;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn flagged_turns(&self, username: &str, session_id: &str) -> Result<Vec<ChatTurn>, StoreError> {
        self.select(|t| {
            t.username == username && t.session_id == session_id && t.reaction == Reaction::Flagged
        })
    }

    fn session_turns(&self, username: &str, session_id: &str) -> Result<Vec<ChatTurn>, StoreError> {
        self.select(|t| t.username == username && t.session_id == session_id)
    }
}

impl LoginStore for MemoryStore {
    fn record_login(&self, event: &LoginEvent) -> Result<(), StoreError> {
        lock(&self.logins)?.push(event.clone());
        Ok(())
    }
}
