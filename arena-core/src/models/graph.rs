use serde::{Deserialize, Serialize};

use super::{Agent, AgentRole};

/// Projection of an agent for the force-directed graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub name: String,
    pub role: AgentRole,
    pub color: String,
}

impl From<&Agent> for GraphNode {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id.clone(),
            name: agent.name.clone(),
            role: agent.role,
            color: agent.color.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    pub value: u32,
}
