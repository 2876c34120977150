use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ArenaError, ArenaResult};
use crate::models::{ArchitecturePlan, CodeFile, Message};

/// One unit of the debate stream, framed as `{type, data?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DebateEvent {
    DebateStart,
    Message(Message),
    PlanReady(ArchitecturePlan),
    DebateEnd,
    CodeGenerated(CodeFile),
    Error { error: String },
}

impl DebateEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            DebateEvent::DebateStart => "debate_start",
            DebateEvent::Message(_) => "message",
            DebateEvent::PlanReady(_) => "plan_ready",
            DebateEvent::DebateEnd => "debate_end",
            DebateEvent::CodeGenerated(_) => "code_generated",
            DebateEvent::Error { .. } => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DebateEvent::DebateEnd | DebateEvent::Error { .. })
    }
}

/// Loosely typed frame payload. Decoding goes through this first so that
/// frames with an unrecognised `type` can be skipped instead of failing.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl StreamEnvelope {
    /// `Ok(None)` for unknown types, an error when a known type carries a bad payload.
    pub fn into_event(self) -> ArenaResult<Option<DebateEvent>> {
        fn payload<T: serde::de::DeserializeOwned>(
            kind: &str,
            data: Option<Value>,
        ) -> ArenaResult<T> {
            let data = data.ok_or_else(|| {
                ArenaError::FrameDecode(format!("'{}' frame without data", kind))
            })?;
            serde_json::from_value(data)
                .map_err(|e| ArenaError::FrameDecode(format!("'{}' payload: {}", kind, e)))
        }

        let event = match self.kind.as_str() {
            "debate_start" => DebateEvent::DebateStart,
            "debate_end" => DebateEvent::DebateEnd,
            "message" => DebateEvent::Message(payload(&self.kind, self.data)?),
            "plan_ready" => DebateEvent::PlanReady(payload(&self.kind, self.data)?),
            "code_generated" => DebateEvent::CodeGenerated(payload(&self.kind, self.data)?),
            "error" => {
                let error = self
                    .data
                    .as_ref()
                    .and_then(|d| d.get("error"))
                    .and_then(Value::as_str)
                    .unwrap_or("Debate stream failed")
                    .to_string();
                DebateEvent::Error { error }
            }
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}
