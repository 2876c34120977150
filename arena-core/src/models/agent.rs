use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentRole {
    #[serde(rename = "PM")]
    Pm,
    #[serde(rename = "Dev")]
    Dev,
    #[serde(rename = "UX")]
    Ux,
    #[serde(rename = "QA")]
    Qa,
}

impl AgentRole {
    /// Every role, in roster order.
    pub const ALL: [AgentRole; 4] = [AgentRole::Pm, AgentRole::Dev, AgentRole::Ux, AgentRole::Qa];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Pm => "PM",
            AgentRole::Dev => "Dev",
            AgentRole::Ux => "UX",
            AgentRole::Qa => "QA",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            AgentRole::Pm => "#3b82f6",
            AgentRole::Dev => "#10b981",
            AgentRole::Ux => "#f59e0b",
            AgentRole::Qa => "#ef4444",
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} Agent", self.as_str())
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AgentRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PM" => Ok(AgentRole::Pm),
            "DEV" => Ok(AgentRole::Dev),
            "UX" => Ok(AgentRole::Ux),
            "QA" => Ok(AgentRole::Qa),
            other => Err(format!("unknown agent role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Idle,
    Thinking,
    Speaking,
    Listening,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub role: AgentRole,
    pub color: String,
    #[serde(default)]
    pub status: AgentStatus,
}

impl Agent {
    pub fn new(id: impl Into<String>, role: AgentRole) -> Self {
        Self {
            id: id.into(),
            name: role.display_name(),
            role,
            color: role.color().to_string(),
            status: AgentStatus::Idle,
        }
    }
}
