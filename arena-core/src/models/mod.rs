mod agent;
mod build;
mod graph;
mod intake;
mod message;
mod plan;

pub use agent::{Agent, AgentRole, AgentStatus};
pub use build::{BuildRecord, BuildStarted, BuildStatus};
pub use graph::{GraphLink, GraphNode};
pub use intake::{
    ChatReply, ConversationTurn, FinalizedRequirements, SessionState, TurnRole, VoiceTurn,
};
pub(crate) use intake::SessionStartResponse;
pub use message::Message;
pub use plan::{ArchitecturePlan, CodeFile};

/// Milliseconds since the Unix epoch, the timestamp unit used on the wire.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
