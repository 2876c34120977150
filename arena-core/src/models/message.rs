use serde::{Deserialize, Serialize};

use super::{now_millis, Agent, AgentRole};

/// One utterance in the debate transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub agent_id: String,
    pub agent_name: String,
    pub agent_role: AgentRole,
    pub content: String,
    /// Unix milliseconds.
    pub timestamp: i64,
    pub color: String,
}

impl Message {
    pub fn from_agent(agent: &Agent, content: impl Into<String>) -> Self {
        let timestamp = now_millis();
        Self {
            id: format!("msg-{}-{}-{}", agent.id, timestamp, rand::random::<u32>()),
            agent_id: agent.id.clone(),
            agent_name: agent.name.clone(),
            agent_role: agent.role,
            content: content.into(),
            timestamp,
            color: agent.color.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_wire_shape() {
        let agent = Agent::new("agent-pm-1-0", AgentRole::Pm);
        let message = Message::from_agent(&agent, "Let's scope the MVP.");
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(value["agentId"], "agent-pm-1-0");
        assert_eq!(value["agentName"], "PM Agent");
        assert_eq!(value["agentRole"], "PM");
        assert_eq!(value["color"], "#3b82f6");
        assert!(value["id"].as_str().unwrap().starts_with("msg-agent-pm-1-0-"));
    }
}
