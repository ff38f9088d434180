//! SQLite-backed interaction and login store.
//!
//! Wraps a single rusqlite Connection in a Mutex. Configures WAL mode and
//! runs migrations on open.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

use crate::error::StoreError;
use crate::migrations;
use crate::model::{ChatTurn, LoginEvent, Reaction, TurnId};
use crate::store::{InteractionStore, LoginStore};

const TURN_COLUMNS: &str =
    "turn_id, username, session_id, timestamp, question, response, reaction, created_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        info!("Store opened at {}", path.display());
        Self::init(conn)
    }

    /// Open an in-memory store.
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` with the connection held.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))?;
        f(&conn)
    }

    fn query_turns(&self, sql: &str, username: &str, session_id: &str) -> Result<Vec<ChatTurn>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map(params![username, session_id], |row| Ok(row_to_turn(row)))?;

            let mut turns = Vec::new();
            for row in rows {
                turns.push(row??);
            }
            Ok(turns)
        })
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish()
    }
}

fn encode_instant(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn row_to_turn(row: &Row<'_>) -> Result<ChatTurn, StoreError> {
    let turn_id: String = row.get(0)?;
    let reaction: String = row.get(6)?;
    let created_at: String = row.get(7)?;

    Ok(ChatTurn {
        turn_id: turn_id
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("turn_id {}: {}", turn_id, e)))?,
        username: row.get(1)?,
        session_id: row.get(2)?,
        timestamp: row.get(3)?,
        question: row.get(4)?,
        response: row.get(5)?,
        reaction: reaction.parse()?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| StoreError::Corrupt(format!("created_at {}: {}", created_at, e)))?
            .with_timezone(&Utc),
    })
}

impl InteractionStore for SqliteStore {
    fn put_turn(&self, turn: &ChatTurn) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO chat_history
                 (turn_id, username, session_id, timestamp, question, response, reaction, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    turn.turn_id.to_string(),
                    turn.username,
                    turn.session_id,
                    turn.timestamp,
                    turn.question,
                    turn.response,
                    turn.reaction.as_str(),
                    encode_instant(&turn.created_at),
                ],
            )?;
            Ok(())
        })
    }

    fn get_turn(&self, turn_id: &TurnId) -> Result<Option<ChatTurn>, StoreError> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM chat_history WHERE turn_id = ?1", TURN_COLUMNS);
            let found = conn
                .query_row(&sql, params![turn_id.to_string()], |row| Ok(row_to_turn(row)))
                .optional()?;
            found.transpose()
        })
    }

    fn update_reaction(&self, turn_id: &TurnId, reaction: Reaction) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE chat_history SET reaction = ?1 WHERE turn_id = ?2",
                params![reaction.as_str(), turn_id.to_string()],
            )?;
            Ok(changed > 0)
        })
    }

    fn flagged_turns(&self, username: &str, session_id: &str) -> Result<Vec<ChatTurn>, StoreError> {
        let sql = format!(
            "SELECT {} FROM chat_history
             WHERE reaction = 'flagged' AND username = ?1 AND session_id = ?2
             ORDER BY created_at ASC, rowid ASC",
            TURN_COLUMNS
        );
        self.query_turns(&sql, username, session_id)
    }

    fn session_turns(&self, username: &str, session_id: &str) -> Result<Vec<ChatTurn>, StoreError> {
        let sql = format!(
            "SELECT {} FROM chat_history
             WHERE username = ?1 AND session_id = ?2
             ORDER BY created_at ASC, rowid ASC",
            TURN_COLUMNS
        );
        self.query_turns(&sql, username, session_id)
    }
}

impl LoginStore for SqliteStore {
    fn record_login(&self, event: &LoginEvent) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO user_login (username, session_id, timestamp, logged_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    event.username,
                    event.session_id,
                    event.timestamp,
                    encode_instant(&event.logged_at),
                ],
            )?;
            Ok(())
        })
    }
}
