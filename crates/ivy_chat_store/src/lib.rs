//! Ivy chat persistence: chat-turn and login records, the store traits with
//! in-memory and SQLite implementations, and the flagged-turn CSV export.

pub mod error;
pub mod export;
pub mod memory;
pub mod migrations;
pub mod model;
pub mod sqlite;
pub mod store;

pub use error::StoreError;
pub use export::{export_flagged, CsvExporter, CSV_HEADERS};
pub use memory::MemoryStore;
pub use model::{minute_stamp, ChatTurn, LoginEvent, Reaction, TurnId, MINUTE_FORMAT};
pub use sqlite::SqliteStore;
pub use store::{InteractionStore, LoginStore};
