//! Flagged-turn CSV export.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::StoreError;
use crate::model::ChatTurn;
use crate::store::InteractionStore;

/// Column order of every export.
pub const CSV_HEADERS: [&str; 6] = [
    "Username",
    "SessionId",
    "Timestamp",
    "Question",
    "Response",
    "Reaction",
];

/// CSV renderer for chat turns.
pub struct CsvExporter {
    delimiter: char,
    include_headers: bool,
}

impl CsvExporter {
    pub fn new() -> Self {
        Self {
            delimiter: ',',
            include_headers: true,
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_headers(mut self, include_headers: bool) -> Self {
        self.include_headers = include_headers;
        self
    }

    /// Quote a field if it holds the delimiter, a quote, CR or LF.
    fn escape_field(&self, field: &str) -> String {
        if field.contains(self.delimiter)
            || field.contains('"')
            || field.contains('\n')
            || field.contains('\r')
        {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn turn_to_row(&self, turn: &ChatTurn) -> String {
        [
            turn.username.as_str(),
            turn.session_id.as_str(),
            turn.timestamp.as_str(),
            turn.question.as_str(),
            turn.response.as_str(),
            turn.reaction.as_str(),
        ]
        .iter()
        .map(|f| self.escape_field(f))
        .collect::<Vec<_>>()
        .join(&self.delimiter.to_string())
    }

    /// Render `turns` in order. Rows end with CRLF.
    pub fn render(&self, turns: &[ChatTurn]) -> String {
        let mut out = String::new();
        if self.include_headers {
            out.push_str(&CSV_HEADERS.join(&self.delimiter.to_string()));
            out.push_str("\r\n");
        }
        for turn in turns {
            out.push_str(&self.turn_to_row(turn));
            out.push_str("\r\n");
        }
        out
    }
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Keep file names portable whatever the username holds.
fn file_safe(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "user".to_string()
    } else {
        cleaned
    }
}

/// Write the flagged turns of one user + session to a uniquely named CSV
/// file in `dir`. Returns `None` when nothing is flagged; no file is created
/// in that case.
pub fn export_flagged(
    store: &dyn InteractionStore,
    username: &str,
    session_id: &str,
    dir: &Path,
    at: DateTime<Utc>,
) -> Result<Option<PathBuf>, StoreError> {
    let turns = store.flagged_turns(username, session_id)?;
    if turns.is_empty() {
        return Ok(None);
    }

    std::fs::create_dir_all(dir)?;
    let prefix = format!("{}_{}_", file_safe(username), at.format("%Y-%m-%dT%H-%M-%S"));
    let mut file = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix("_flagged.csv")
        .rand_bytes(6)
        .tempfile_in(dir)?;

    file.write_all(CsvExporter::new().render(&turns).as_bytes())?;
    file.flush()?;
    let (_, path) = file.keep().map_err(|e| StoreError::Io(e.error))?;

    info!(path = %path.display(), rows = turns.len(), "Flagged turns exported");
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Reaction;
    use chrono::TimeZone;

    fn turn(question: &str, response: &str) -> ChatTurn {
        let at = Utc.with_ymd_and_hms(2025, 2, 3, 4, 5, 6).unwrap();
        ChatTurn::record("Dummy Username", "0", question, response, Reaction::Flagged, &at)
    }

    #[test]
    fn header_comes_first_in_fixed_order() {
        let csv = CsvExporter::new().render(&[turn("q", "r")]);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("Username,SessionId,Timestamp,Question,Response,Reaction")
        );
        assert_eq!(
            lines.next(),
            Some("Dummy Username,0,Feb-03-2025_04:05,q,r,flagged")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn special_characters_are_quoted() {
        let exporter = CsvExporter::new();
        assert_eq!(exporter.escape_field("plain"), "plain");
        assert_eq!(exporter.escape_field(""), "");
        assert_eq!(exporter.escape_field("a,b"), "\"a,b\"");
        assert_eq!(exporter.escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(exporter.escape_field("two\nlines"), "\"two\nlines\"");
        assert_eq!(exporter.escape_field("tab\there"), "tab\there");
    }

    #[test]
    fn custom_delimiter_changes_quoting() {
        let exporter = CsvExporter::new().with_delimiter('\t').with_headers(false);
        let csv = exporter.render(&[turn("a,b", "c\td")]);
        assert_eq!(csv, "Dummy Username\t0\tFeb-03-2025_04:05\ta,b\t\"c\td\"\tflagged\r\n");
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(file_safe("Dummy Username"), "Dummy_Username");
        assert_eq!(file_safe("../etc"), "___etc");
        assert_eq!(file_safe(""), "user");
    }
}
