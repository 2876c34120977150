use futures::StreamExt;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info, warn};

use super::handler::{dispatch_event, SwarmEventHandler};
use crate::debate::DebateEvent;
use crate::error::{ArenaError, ArenaResult};
use crate::models::{Agent, ArchitecturePlan};
use crate::roster::Roster;
use crate::sse::{parse_event, FrameDecoder};

/// What a drained debate stream produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebateOutcome {
    pub messages: usize,
    pub plan: Option<ArchitecturePlan>,
    pub finished: bool,
}

/// One-shot request/stream client for the arena HTTP server. There is no
/// persistent connection; `connect` and `disconnect` only drive the
/// lifecycle callbacks.
#[derive(Debug, Clone)]
pub struct SwarmSseClient {
    http: Client,
    base_url: String,
    connected: bool,
}

impl SwarmSseClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            connected: false,
        }
    }

    pub fn connect<H: SwarmEventHandler + ?Sized>(&mut self, handler: &mut H) {
        self.connected = true;
        handler.on_connect();
    }

    pub fn disconnect<H: SwarmEventHandler + ?Sized>(&mut self, handler: &mut H) {
        self.connected = false;
        handler.on_disconnect();
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// `POST /api/agents/generate`. Failures are reported to `on_error` and
    /// returned.
    pub async fn generate_agents<H: SwarmEventHandler + ?Sized>(
        &self,
        handler: &mut H,
        brief: &str,
    ) -> ArenaResult<Roster> {
        match self.fetch_roster(brief).await {
            Ok(roster) => {
                info!(agents = roster.agents.len(), "Team generated");
                handler.on_agents_generated(roster.clone());
                Ok(roster)
            }
            Err(err) => {
                err.log();
                handler.on_error(&err);
                Err(err)
            }
        }
    }

    async fn fetch_roster(&self, brief: &str) -> ArenaResult<Roster> {
        let response = self
            .http
            .post(format!("{}/api/agents/generate", self.base_url))
            .json(&json!({ "projectBrief": brief }))
            .send()
            .await
            .map_err(|e| ArenaError::RosterRequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ArenaError::RosterRequestFailed(format!(
                "server answered {}",
                response.status()
            )));
        }

        response
            .json::<Roster>()
            .await
            .map_err(|e| ArenaError::RosterRequestFailed(e.to_string()))
    }

    /// `POST /api/debate/start`, then reads the event stream to its end,
    /// dispatching each frame as it completes. Unknown event types are
    /// skipped; a malformed frame or an `error` event aborts the read.
    pub async fn start_debate<H: SwarmEventHandler + ?Sized>(
        &self,
        handler: &mut H,
        brief: &str,
        agents: &[Agent],
    ) -> ArenaResult<DebateOutcome> {
        let result = self.drain_debate(handler, brief, agents).await;
        if let Err(err) = &result {
            err.log();
            // Error events were already dispatched by the stream itself.
            if !matches!(err, ArenaError::DebateAborted(_)) {
                handler.on_error(err);
            }
        }
        result
    }

    async fn drain_debate<H: SwarmEventHandler + ?Sized>(
        &self,
        handler: &mut H,
        brief: &str,
        agents: &[Agent],
    ) -> ArenaResult<DebateOutcome> {
        let response = self
            .http
            .post(format!("{}/api/debate/start", self.base_url))
            .json(&json!({ "projectBrief": brief, "agents": agents }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArenaError::StreamRejected {
                status: status.as_u16(),
            });
        }

        let mut body = response.bytes_stream();
        let mut decoder = FrameDecoder::new();
        let mut outcome = DebateOutcome::default();

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            for payload in decoder.push(&chunk) {
                Self::handle_frame(handler, &payload, &mut outcome)?;
            }
        }
        if let Some(payload) = decoder.finish() {
            Self::handle_frame(handler, &payload, &mut outcome)?;
        }

        debug!(
            messages = outcome.messages,
            finished = outcome.finished,
            "Debate stream drained"
        );
        Ok(outcome)
    }

    fn handle_frame<H: SwarmEventHandler + ?Sized>(
        handler: &mut H,
        payload: &str,
        outcome: &mut DebateOutcome,
    ) -> ArenaResult<()> {
        let event = match parse_event(payload)? {
            Some(event) => event,
            None => {
                warn!(payload, "Unknown stream event");
                return Ok(());
            }
        };

        match &event {
            DebateEvent::Message(_) => outcome.messages += 1,
            DebateEvent::PlanReady(plan) => outcome.plan = Some(plan.clone()),
            DebateEvent::DebateEnd => outcome.finished = true,
            _ => {}
        }

        let aborted = match &event {
            DebateEvent::Error { error } => Some(error.clone()),
            _ => None,
        };
        dispatch_event(handler, event);

        match aborted {
            Some(error) => Err(ArenaError::DebateAborted(error)),
            None => Ok(()),
        }
    }
}
