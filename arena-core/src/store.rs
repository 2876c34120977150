//! Session state for a debate consumer.
//!
//! Fields are private; every write goes through a named mutator. The store is
//! owned by whoever drives the client, and the client writes to it through
//! the [`SwarmEventHandler`] impl below.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::SwarmEventHandler;
use crate::error::ArenaError;
use crate::models::{
    Agent, AgentStatus, ArchitecturePlan, CodeFile, GraphLink, GraphNode, Message,
};
use crate::roster::Roster;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanningStatus {
    #[default]
    Idle,
    InProgress,
    Done,
}

#[derive(Debug, Clone, Default)]
pub struct SwarmStore {
    agents: Vec<Agent>,
    messages: Vec<Message>,
    graph_nodes: Vec<GraphNode>,
    graph_links: Vec<GraphLink>,
    architecture_plan: Option<ArchitecturePlan>,
    code_files: Vec<CodeFile>,
    swarm_doc_markdown: Option<String>,
    is_connected: bool,
    is_debating: bool,
    debate_finished: bool,
    planning_status: PlanningStatus,
    project_brief: String,
    project_requirements: Option<Value>,
    session_id: Option<String>,
    last_error: Option<String>,
}

impl SwarmStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn graph_nodes(&self) -> &[GraphNode] {
        &self.graph_nodes
    }

    pub fn graph_links(&self) -> &[GraphLink] {
        &self.graph_links
    }

    pub fn architecture_plan(&self) -> Option<&ArchitecturePlan> {
        self.architecture_plan.as_ref()
    }

    pub fn code_files(&self) -> &[CodeFile] {
        &self.code_files
    }

    pub fn swarm_doc_markdown(&self) -> Option<&str> {
        self.swarm_doc_markdown.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.is_connected
    }

    pub fn is_debating(&self) -> bool {
        self.is_debating
    }

    pub fn debate_finished(&self) -> bool {
        self.debate_finished
    }

    pub fn planning_status(&self) -> PlanningStatus {
        self.planning_status
    }

    pub fn project_brief(&self) -> &str {
        &self.project_brief
    }

    pub fn project_requirements(&self) -> Option<&Value> {
        self.project_requirements.as_ref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn set_agents(&mut self, agents: Vec<Agent>) {
        self.agents = agents;
    }

    pub fn set_agent_status(&mut self, agent_id: &str, status: AgentStatus) {
        if let Some(agent) = self.agents.iter_mut().find(|a| a.id == agent_id) {
            agent.status = status;
        }
    }

    /// Appends in arrival order. Once a roster is loaded, messages from
    /// agents outside it are dropped; returns whether the message was kept.
    pub fn add_message(&mut self, message: Message) -> bool {
        if !self.agents.is_empty() && !self.agents.iter().any(|a| a.id == message.agent_id) {
            warn!(agent = %message.agent_id, "Dropping message from unknown agent");
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Replaces the graph wholesale.
    pub fn update_graph(&mut self, nodes: Vec<GraphNode>, links: Vec<GraphLink>) {
        self.graph_nodes = nodes;
        self.graph_links = links;
    }

    pub fn set_architecture_plan(&mut self, plan: ArchitecturePlan) {
        self.architecture_plan = Some(plan);
    }

    /// Keeps every file and mirrors the newest one as the swarm document.
    pub fn add_code_file(&mut self, file: CodeFile) {
        self.swarm_doc_markdown = Some(file.content.clone());
        self.code_files.push(file);
    }

    pub fn set_swarm_doc_markdown(&mut self, markdown: impl Into<String>) {
        self.swarm_doc_markdown = Some(markdown.into());
    }

    pub fn set_is_connected(&mut self, connected: bool) {
        self.is_connected = connected;
    }

    pub fn set_is_debating(&mut self, debating: bool) {
        self.is_debating = debating;
    }

    pub fn set_debate_finished(&mut self, finished: bool) {
        self.debate_finished = finished;
    }

    pub fn set_planning_status(&mut self, status: PlanningStatus) {
        self.planning_status = status;
    }

    pub fn set_project_brief(&mut self, brief: impl Into<String>) {
        self.project_brief = brief.into();
    }

    pub fn set_project_requirements(&mut self, requirements: Value) {
        self.project_requirements = Some(requirements);
    }

    pub fn set_session_id(&mut self, session_id: impl Into<String>) {
        self.session_id = Some(session_id.into());
    }

    /// Loads a roster and its graph in one step.
    pub fn apply_roster(&mut self, roster: Roster) {
        self.set_agents(roster.agents);
        self.update_graph(roster.nodes, roster.links);
    }

    /// Clears everything derived from the current run. The brief,
    /// requirements, session id and connection flag survive.
    pub fn reset(&mut self) {
        *self = Self {
            is_connected: self.is_connected,
            project_brief: std::mem::take(&mut self.project_brief),
            project_requirements: self.project_requirements.take(),
            session_id: self.session_id.take(),
            ..Self::default()
        };
    }
}

impl SwarmEventHandler for SwarmStore {
    fn on_connect(&mut self) {
        self.set_is_connected(true);
    }

    fn on_disconnect(&mut self) {
        self.set_is_connected(false);
    }

    fn on_message(&mut self, message: Message) {
        self.add_message(message);
    }

    fn on_agents_generated(&mut self, roster: Roster) {
        debug!(agents = roster.agents.len(), "Store received roster");
        self.apply_roster(roster);
    }

    fn on_debate_start(&mut self) {
        self.set_is_debating(true);
        self.set_debate_finished(false);
        self.set_planning_status(PlanningStatus::InProgress);
    }

    fn on_debate_end(&mut self) {
        self.set_is_debating(false);
        self.set_debate_finished(true);
    }

    fn on_plan_ready(&mut self, plan: ArchitecturePlan) {
        self.set_architecture_plan(plan);
        self.set_planning_status(PlanningStatus::Done);
    }

    fn on_code_generated(&mut self, file: CodeFile) {
        self.add_code_file(file);
    }

    fn on_error(&mut self, error: &ArenaError) {
        self.set_is_debating(false);
        self.set_planning_status(PlanningStatus::Idle);
        self.last_error = Some(error.to_string());
    }
}
