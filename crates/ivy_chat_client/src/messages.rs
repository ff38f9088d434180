//! JSON bodies exchanged with the remote QA endpoint.

use serde::{Deserialize, Serialize};

/// Client → QA service: one question.
#[derive(Debug, Clone, Serialize)]
pub struct AskRequest<'a> {
    pub question: &'a str,
    pub api_key: &'a str,
    /// Always sent empty; the service keeps its own episodic memory.
    #[serde(rename = "Episodic_Knowledge")]
    pub episodic_knowledge: serde_json::Map<String, serde_json::Value>,
}

impl<'a> AskRequest<'a> {
    pub fn new(question: &'a str, api_key: &'a str) -> Self {
        Self {
            question,
            api_key,
            episodic_knowledge: serde_json::Map::new(),
        }
    }
}

/// QA service → client: the answer text.
#[derive(Debug, Clone, Deserialize)]
pub struct AskResponse {
    pub response: String,
}

impl AskResponse {
    /// Pull the `response` string out of an arbitrary JSON body.
    /// Other fields the service sends are ignored.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        value
            .get("response")
            .and_then(|r| r.as_str())
            .map(|r| AskResponse {
                response: r.to_string(),
            })
    }
}
