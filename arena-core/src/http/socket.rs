use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::StreamExt;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::AppState;
use crate::client::SocketFrame;
use crate::debate::DebateEvent;
use crate::roster::{generate_roster, Roster};

pub(super) async fn upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| session(socket, state))
}

fn brief_of(data: &Value) -> String {
    data.get("brief")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Socket event name for each stream event.
fn frame_for(event: DebateEvent) -> SocketFrame {
    let (name, data) = match event {
        DebateEvent::DebateStart => ("debate_start", Value::Null),
        DebateEvent::Message(m) => ("agent_message", json!(m)),
        DebateEvent::PlanReady(p) => ("plan_ready", json!(p)),
        DebateEvent::DebateEnd => ("debate_end", Value::Null),
        DebateEvent::CodeGenerated(f) => ("code_generated", json!(f)),
        DebateEvent::Error { error } => ("error", json!({ "error": error })),
    };
    SocketFrame::new(name, data)
}

async fn send(socket: &mut WebSocket, frame: &SocketFrame) -> bool {
    let text = match serde_json::to_string(frame) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "Failed to encode socket frame");
            return true;
        }
    };
    socket.send(Message::Text(text.into())).await.is_ok()
}

/// One connection: `generate_team` answers with the roster, `start_debate`
/// streams a full run for the last generated roster (generating one first
/// if needed). Frames are handled one at a time.
async fn session(mut socket: WebSocket, state: AppState) {
    info!("Socket client connected");
    let mut roster: Option<Roster> = None;

    while let Some(Ok(message)) = socket.recv().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let frame: SocketFrame = match serde_json::from_str(text.as_str()) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "Failed to parse socket frame");
                continue;
            }
        };

        match frame.event.as_str() {
            "generate_team" => {
                let generated = generate_roster(&brief_of(&frame.data));
                let reply = SocketFrame::new("agents_generated", json!(generated));
                roster = Some(generated);
                if !send(&mut socket, &reply).await {
                    break;
                }
            }
            "start_debate" => {
                let brief = brief_of(&frame.data);
                let agents = match &roster {
                    Some(r) => r.agents.clone(),
                    None => {
                        let generated = generate_roster(&brief);
                        let reply = SocketFrame::new("agents_generated", json!(generated));
                        let agents = generated.agents.clone();
                        roster = Some(generated);
                        if !send(&mut socket, &reply).await {
                            break;
                        }
                        agents
                    }
                };

                let mut events = state.emitter.stream(&brief, agents);
                let mut open = true;
                while let Some(event) = events.next().await {
                    if !send(&mut socket, &frame_for(event)).await {
                        open = false;
                        break;
                    }
                }
                if !open {
                    break;
                }
            }
            other => debug!(event = other, "Unknown socket event"),
        }
    }

    info!("Socket client disconnected");
}
