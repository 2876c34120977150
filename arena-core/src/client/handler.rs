use crate::debate::DebateEvent;
use crate::error::ArenaError;
use crate::models::{ArchitecturePlan, CodeFile, Message};
use crate::roster::Roster;

/// Callbacks fired by the realtime clients. Every method defaults to a no-op
/// so implementors only override what they care about.
pub trait SwarmEventHandler: Send {
    fn on_connect(&mut self) {}

    fn on_disconnect(&mut self) {}

    fn on_message(&mut self, _message: Message) {}

    fn on_agents_generated(&mut self, _roster: Roster) {}

    fn on_debate_start(&mut self) {}

    fn on_debate_end(&mut self) {}

    fn on_plan_ready(&mut self, _plan: ArchitecturePlan) {}

    fn on_code_generated(&mut self, _file: CodeFile) {}

    fn on_error(&mut self, _error: &ArenaError) {}
}

/// Routes a decoded stream event to its callback.
pub fn dispatch_event<H: SwarmEventHandler + ?Sized>(handler: &mut H, event: DebateEvent) {
    match event {
        DebateEvent::DebateStart => handler.on_debate_start(),
        DebateEvent::Message(message) => handler.on_message(message),
        DebateEvent::PlanReady(plan) => handler.on_plan_ready(plan),
        DebateEvent::DebateEnd => handler.on_debate_end(),
        DebateEvent::CodeGenerated(file) => handler.on_code_generated(file),
        DebateEvent::Error { error } => handler.on_error(&ArenaError::DebateAborted(error)),
    }
}
