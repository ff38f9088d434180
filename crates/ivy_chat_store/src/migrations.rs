//! Schema migrations for the SQLite store.

use rusqlite::Connection;
use tracing::info;

use crate::error::StoreError;

/// Apply every migration newer than the recorded schema version.
pub fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )?;

    let current_version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: chat_history + user_login");
    }

    Ok(())
}

/// Version 1: chat history keyed by turn id, login events keyed by session.
fn apply_v1(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS chat_history (
            turn_id     TEXT PRIMARY KEY NOT NULL,
            username    TEXT NOT NULL,
            session_id  TEXT NOT NULL,
            timestamp   TEXT NOT NULL,
            question    TEXT NOT NULL,
            response    TEXT NOT NULL,
            reaction    TEXT NOT NULL DEFAULT 'no_reaction'
                        CHECK (reaction IN ('no_reaction', 'liked', 'disliked', 'flagged')),
            created_at  TEXT NOT NULL
        );

        -- Export lookups: flagged turns for one user + session.
        CREATE INDEX IF NOT EXISTS idx_chat_history_reaction
            ON chat_history (reaction, username, session_id, created_at);

        CREATE INDEX IF NOT EXISTS idx_chat_history_session
            ON chat_history (username, session_id, created_at);

        CREATE TABLE IF NOT EXISTS user_login (
            username    TEXT NOT NULL,
            session_id  TEXT NOT NULL,
            timestamp   TEXT NOT NULL,
            logged_at   TEXT NOT NULL,
            PRIMARY KEY (username, session_id)
        );

        INSERT INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )?;
    Ok(())
}
