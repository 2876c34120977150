use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};

use super::handler::SwarmEventHandler;
use crate::error::{ArenaError, ArenaResult, RetryConfig};
use crate::models::{ArchitecturePlan, Message};
use crate::roster::Roster;

/// `{event, data}` frame exchanged over the socket in both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl SocketFrame {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }
}

#[derive(Debug)]
enum SocketCommand {
    Send(SocketFrame),
    Disconnect,
}

enum SessionEnd {
    Closed,
    Stopped,
}

/// Cheap handle for talking to a running [`SwarmSocketClient`].
#[derive(Debug, Clone)]
pub struct SocketHandle {
    commands: mpsc::UnboundedSender<SocketCommand>,
    connected: Arc<AtomicBool>,
}

impl SocketHandle {
    /// Queues a frame. While disconnected the frame is dropped and
    /// [`ArenaError::NotConnected`] is returned.
    pub fn send(&self, event: &str, data: Value) -> ArenaResult<()> {
        if !self.is_connected() {
            warn!(event, "Socket is not connected, dropping frame");
            return Err(ArenaError::NotConnected);
        }
        self.commands
            .send(SocketCommand::Send(SocketFrame::new(event, data)))
            .map_err(|_| ArenaError::NotConnected)
    }

    /// Closes the socket and cancels any pending reconnect.
    pub fn disconnect(&self) {
        let _ = self.commands.send(SocketCommand::Disconnect);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// Long-lived socket client with exponential backoff reconnection.
pub struct SwarmSocketClient {
    url: String,
    retry: RetryConfig,
    connected: Arc<AtomicBool>,
    commands_tx: mpsc::UnboundedSender<SocketCommand>,
    commands_rx: mpsc::UnboundedReceiver<SocketCommand>,
}

impl SwarmSocketClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_retry(url, RetryConfig::for_socket_reconnection())
    }

    pub fn with_retry(url: impl Into<String>, retry: RetryConfig) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        Self {
            url: url.into(),
            retry,
            connected: Arc::new(AtomicBool::new(false)),
            commands_tx,
            commands_rx,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn handle(&self) -> SocketHandle {
        SocketHandle {
            commands: self.commands_tx.clone(),
            connected: Arc::clone(&self.connected),
        }
    }

    /// Connects and keeps the session alive until [`SocketHandle::disconnect`]
    /// is called. A successful connection resets the attempt counter; once
    /// `max_attempts` reconnects fail in a row the run ends with
    /// [`ArenaError::ReconnectExhausted`].
    pub async fn run<H: SwarmEventHandler + ?Sized>(mut self, handler: &mut H) -> ArenaResult<()> {
        let mut attempts: u32 = 0;

        loop {
            match connect_async(self.url.as_str()).await {
                Ok((ws, _)) => {
                    info!(url = %self.url, "Socket connected");
                    attempts = 0;
                    self.connected.store(true, Ordering::SeqCst);
                    handler.on_connect();

                    let end = self.session(ws, handler).await;

                    self.connected.store(false, Ordering::SeqCst);
                    info!(url = %self.url, "Socket disconnected");
                    handler.on_disconnect();

                    if let SessionEnd::Stopped = end {
                        return Ok(());
                    }
                }
                Err(e) => {
                    let err = ArenaError::SocketConnectFailed {
                        url: self.url.clone(),
                        message: e.to_string(),
                    };
                    warn!(error = %err, "Socket connection failed");
                    handler.on_error(&err);
                }
            }

            if attempts >= self.retry.max_attempts {
                let err = ArenaError::ReconnectExhausted(self.retry.max_attempts);
                warn!("Max reconnection attempts reached");
                handler.on_error(&err);
                return Err(err);
            }

            attempts += 1;
            let delay = self.retry.delay_for_attempt(attempts);
            info!(attempt = attempts, delay_ms = delay.as_millis() as u64, "Reconnecting");

            if !self.wait_before_reconnect(delay).await {
                return Ok(());
            }
        }
    }

    /// Sleeps out the backoff delay. Returns false if a disconnect arrived
    /// meanwhile; sends are dropped since nothing is connected.
    async fn wait_before_reconnect(&mut self, delay: std::time::Duration) -> bool {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                command = self.commands_rx.recv() => match command {
                    Some(SocketCommand::Send(frame)) => {
                        warn!(event = %frame.event, "Socket is not connected, dropping frame");
                    }
                    Some(SocketCommand::Disconnect) | None => return false,
                },
            }
        }
    }

    async fn session<S, H>(&mut self, ws: S, handler: &mut H) -> SessionEnd
    where
        S: futures::Stream<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>>
            + futures::Sink<WsMessage, Error = tokio_tungstenite::tungstenite::Error>
            + Unpin,
        H: SwarmEventHandler + ?Sized,
    {
        let (mut sink, mut stream) = ws.split();

        loop {
            tokio::select! {
                incoming = stream.next() => match incoming {
                    Some(Ok(WsMessage::Text(text))) => dispatch_frame(handler, text.as_str()),
                    Some(Ok(WsMessage::Close(_))) | None => return SessionEnd::Closed,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        let err = ArenaError::SocketConnectFailed {
                            url: self.url.clone(),
                            message: e.to_string(),
                        };
                        handler.on_error(&err);
                        return SessionEnd::Closed;
                    }
                },
                command = self.commands_rx.recv() => match command {
                    Some(SocketCommand::Send(frame)) => {
                        let text = match serde_json::to_string(&frame) {
                            Ok(text) => text,
                            Err(e) => {
                                handler.on_error(&e.into());
                                continue;
                            }
                        };
                        if let Err(e) = sink.send(WsMessage::Text(text.into())).await {
                            warn!(error = %e, "Socket send failed");
                            return SessionEnd::Closed;
                        }
                    }
                    Some(SocketCommand::Disconnect) | None => {
                        let _ = sink.send(WsMessage::Close(None)).await;
                        return SessionEnd::Stopped;
                    }
                },
            }
        }
    }
}

/// Decodes one incoming text frame and fires the matching callback.
fn dispatch_frame<H: SwarmEventHandler + ?Sized>(handler: &mut H, text: &str) {
    let frame: SocketFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, "Failed to parse socket frame");
            return;
        }
    };

    fn payload<T: serde::de::DeserializeOwned>(frame: &SocketFrame) -> Option<T> {
        match serde_json::from_value(frame.data.clone()) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(event = %frame.event, error = %e, "Bad socket payload");
                None
            }
        }
    }

    match frame.event.as_str() {
        "agent_message" => {
            if let Some(message) = payload::<Message>(&frame) {
                handler.on_message(message);
            }
        }
        "agents_generated" => {
            if let Some(roster) = payload::<Roster>(&frame) {
                handler.on_agents_generated(roster);
            }
        }
        "debate_start" => handler.on_debate_start(),
        "debate_end" => handler.on_debate_end(),
        "plan_ready" => {
            if let Some(plan) = payload::<ArchitecturePlan>(&frame) {
                handler.on_plan_ready(plan);
            }
        }
        "error" => {
            let message = frame
                .data
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("Socket error")
                .to_string();
            handler.on_error(&ArenaError::DebateAborted(message));
        }
        other => debug!(event = other, "Unknown socket event"),
    }
}
