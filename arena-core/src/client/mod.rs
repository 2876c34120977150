//! Consumers of the arena server and the AI backend.

mod build_tracker;
mod handler;
mod intake;
mod socket;
mod sse_client;

pub use build_tracker::{archive_file_name, BuildTracker};
pub use handler::{dispatch_event, SwarmEventHandler};
pub use intake::IntakeClient;
pub use socket::{SocketFrame, SocketHandle, SwarmSocketClient};
pub use sse_client::{DebateOutcome, SwarmSseClient};
