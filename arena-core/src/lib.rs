//! Core library for the Swarm Arena: a simulated PM/Dev/UX/QA team that
//! debates a project brief over a live event stream.

pub mod client;
pub mod config;
pub mod debate;
pub mod error;
pub mod http;
pub mod models;
pub mod proxy;
pub mod roster;
pub mod sse;
pub mod store;

pub use client::{
    archive_file_name, BuildTracker, DebateOutcome, IntakeClient, SocketFrame, SocketHandle,
    SwarmEventHandler, SwarmSocketClient, SwarmSseClient,
};
pub use config::ArenaConfig;
pub use debate::{synthesize_plan, DebateEmitter, DebateEvent, DebateTiming, PhraseTable};
pub use error::{ArenaError, ArenaResult, CliErrorDisplay, RetryConfig};
pub use models::*;
pub use proxy::BackendProxy;
pub use roster::{generate_roster, graph_projection, Roster};
pub use store::{PlanningStatus, SwarmStore};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
