//! Simulated multi-round debate between the generated agents.

mod emitter;
mod event;
mod phrases;
mod plan;

pub use emitter::{DebateEmitter, DebateTiming};
pub use event::{DebateEvent, StreamEnvelope};
pub use phrases::PhraseTable;
pub use plan::synthesize_plan;
