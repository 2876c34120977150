//! Fixed-role team generation and its star-graph projection.

use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{now_millis, Agent, AgentRole, GraphLink, GraphNode};

/// A generated team plus the graph view derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub agents: Vec<Agent>,
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Current millis, bumped so that two rosters generated within the same
/// millisecond still get distinct ids.
fn unique_stamp() -> i64 {
    let now = now_millis();
    let mut last = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_STAMP.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// Builds the four-agent team. The brief does not influence the result; an
/// empty brief still yields a full roster.
pub fn generate_roster(brief: &str) -> Roster {
    let stamp = unique_stamp();
    let agents: Vec<Agent> = AgentRole::ALL
        .iter()
        .enumerate()
        .map(|(index, role)| {
            let id = format!("agent-{}-{}-{}", role.as_str().to_lowercase(), stamp, index);
            Agent::new(id, *role)
        })
        .collect();

    debug!(brief_len = brief.len(), stamp, "Generated roster");

    let (nodes, links) = graph_projection(&agents);
    Roster {
        agents,
        nodes,
        links,
    }
}

/// Every agent becomes a node; every non-PM agent is linked to the PM hub.
/// Without a PM there is no hub and no links.
pub fn graph_projection(agents: &[Agent]) -> (Vec<GraphNode>, Vec<GraphLink>) {
    let nodes = agents.iter().map(GraphNode::from).collect();

    let links = match agents.iter().find(|a| a.role == AgentRole::Pm) {
        Some(hub) => agents
            .iter()
            .filter(|a| a.role != AgentRole::Pm)
            .map(|a| GraphLink {
                source: hub.id.clone(),
                target: a.id.clone(),
                value: 1,
            })
            .collect(),
        None => Vec::new(),
    };

    (nodes, links)
}
