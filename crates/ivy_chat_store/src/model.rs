//! Records kept by the interaction and login stores.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

/// Minute-granularity clock time shown in the UI and the CSV export,
/// e.g. `Mar-04-2025_14:07`.
pub const MINUTE_FORMAT: &str = "%b-%d-%Y_%H:%M";

/// Format `at` with [`MINUTE_FORMAT`].
pub fn minute_stamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    at.format(MINUTE_FORMAT).to_string()
}

/// Unique identity of one chat turn, assigned at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(pub Uuid);

impl TurnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TurnId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(TurnId)
    }
}

/// The user's reaction to a turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reaction {
    #[default]
    NoReaction,
    Liked,
    Disliked,
    Flagged,
}

impl Reaction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reaction::NoReaction => "no_reaction",
            Reaction::Liked => "liked",
            Reaction::Disliked => "disliked",
            Reaction::Flagged => "flagged",
        }
    }

    /// Map a like/dislike toggle to its reaction.
    pub fn from_like(liked: bool) -> Self {
        if liked {
            Reaction::Liked
        } else {
            Reaction::Disliked
        }
    }
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Reaction {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no_reaction" => Ok(Reaction::NoReaction),
            "liked" => Ok(Reaction::Liked),
            "disliked" => Ok(Reaction::Disliked),
            "flagged" => Ok(Reaction::Flagged),
            other => Err(StoreError::InvalidReaction(other.to_string())),
        }
    }
}

/// One logged question/response pair and the reaction it received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub turn_id: TurnId,
    pub username: String,
    pub session_id: String,
    /// Minute-granularity local time; display only, not an identity.
    pub timestamp: String,
    pub question: String,
    pub response: String,
    pub reaction: Reaction,
    pub created_at: DateTime<Utc>,
}

impl ChatTurn {
    /// A fresh turn with a new id, stamped with `at`.
    pub fn record<Tz: TimeZone>(
        username: impl Into<String>,
        session_id: impl Into<String>,
        question: impl Into<String>,
        response: impl Into<String>,
        reaction: Reaction,
        at: &DateTime<Tz>,
    ) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        Self {
            turn_id: TurnId::new(),
            username: username.into(),
            session_id: session_id.into(),
            timestamp: minute_stamp(at),
            question: question.into(),
            response: response.into(),
            reaction,
            created_at: at.with_timezone(&Utc),
        }
    }
}

/// A session start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginEvent {
    pub username: String,
    pub session_id: String,
    pub timestamp: String,
    pub logged_at: DateTime<Utc>,
}

impl LoginEvent {
    pub fn new<Tz: TimeZone>(
        username: impl Into<String>,
        session_id: impl Into<String>,
        at: &DateTime<Tz>,
    ) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        Self {
            username: username.into(),
            session_id: session_id.into(),
            timestamp: minute_stamp(at),
            logged_at: at.with_timezone(&Utc),
        }
    }
}
