use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Session state returned by `POST /session/start`. History entries are kept
/// loosely typed; only those with string content become turns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub history: Vec<Value>,
}

impl SessionState {
    pub fn turns(&self) -> Vec<ConversationTurn> {
        self.history
            .iter()
            .filter(|item| item.get("content").map(Value::is_string).unwrap_or(false))
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SessionStartResponse {
    #[serde(default)]
    pub state: SessionState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    #[serde(default)]
    pub requirements_state: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceTurn {
    pub transcript: String,
    pub reply: String,
    #[serde(default)]
    pub audio_b64: Option<String>,
    #[serde(default)]
    pub requirements_state: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedRequirements {
    pub requirements: Value,
    pub markdown: String,
}
