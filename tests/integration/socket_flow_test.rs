use arena_core::http::{serve_listener, AppStateInner};
use arena_core::{
    ArenaError, BackendProxy, DebateEmitter, DebateTiming, Message, PhraseTable, PlanningStatus,
    RetryConfig, Roster, SocketHandle, SwarmEventHandler, SwarmSocketClient, SwarmStore,
};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message as WsMessage;

async fn spawn_arena() -> String {
    let state = AppStateInner::new(
        DebateEmitter::new(DebateTiming::instant(), PhraseTable::default()),
        BackendProxy::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap(),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = serve_listener(listener, state).await;
    });
    format!("ws://{}/ws", addr)
}

async fn dead_socket_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("ws://{}/ws", addr)
}

/// Socket server that answers `start_debate` with `debate_start` and an
/// `error` frame, then keeps the connection open until the client leaves.
async fn spawn_aborting_socket() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut ws = match tokio_tungstenite::accept_async(stream).await {
                    Ok(ws) => ws,
                    Err(_) => return,
                };
                while let Some(Ok(message)) = ws.next().await {
                    let text = match message {
                        WsMessage::Text(text) => text,
                        WsMessage::Close(_) => break,
                        _ => continue,
                    };
                    let frame: Value = serde_json::from_str(text.as_str()).unwrap();
                    if frame["event"] != "start_debate" {
                        continue;
                    }
                    for reply in [
                        json!({ "event": "debate_start" }),
                        json!({ "event": "error", "data": { "error": "planner crashed" } }),
                    ] {
                        if ws.send(WsMessage::Text(reply.to_string().into())).await.is_err() {
                            return;
                        }
                    }
                }
            });
        }
    });
    format!("ws://{}", addr)
}

fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        backoff_multiplier: 2.0,
        jitter: false,
    }
}

/// Asks for a debate as soon as the socket is up and hangs up when it ends.
struct Driver {
    handle: SocketHandle,
    brief: &'static str,
    generate_first: bool,
    store: SwarmStore,
    rosters: usize,
    errors: Vec<String>,
}

impl Driver {
    fn new(handle: SocketHandle, brief: &'static str) -> Self {
        Self {
            handle,
            brief,
            generate_first: false,
            store: SwarmStore::new(),
            rosters: 0,
            errors: Vec::new(),
        }
    }
}

impl SwarmEventHandler for Driver {
    fn on_connect(&mut self) {
        self.store.on_connect();
        let data = json!({ "brief": self.brief });
        if self.generate_first {
            self.handle.send("generate_team", data.clone()).unwrap();
        }
        self.handle.send("start_debate", data).unwrap();
    }

    fn on_disconnect(&mut self) {
        self.store.on_disconnect();
    }

    fn on_message(&mut self, message: Message) {
        self.store.on_message(message);
    }

    fn on_agents_generated(&mut self, roster: Roster) {
        self.rosters += 1;
        self.store.on_agents_generated(roster);
    }

    fn on_debate_start(&mut self) {
        self.store.on_debate_start();
    }

    fn on_debate_end(&mut self) {
        self.store.on_debate_end();
        self.handle.disconnect();
    }

    fn on_plan_ready(&mut self, plan: arena_core::ArchitecturePlan) {
        self.store.on_plan_ready(plan);
    }

    fn on_error(&mut self, error: &ArenaError) {
        self.errors.push(error.error_code().to_string());
    }
}

#[derive(Default)]
struct ErrorLog {
    codes: Vec<String>,
}

impl SwarmEventHandler for ErrorLog {
    fn on_error(&mut self, error: &ArenaError) {
        self.codes.push(error.error_code().to_string());
    }
}

mod socket_session_tests {
    use super::*;

    #[tokio::test]
    async fn test_debate_over_socket_without_roster() {
        let url = spawn_arena().await;
        let client = SwarmSocketClient::with_retry(url, fast_retry(2));
        let mut driver = Driver::new(client.handle(), "Build a pet social app");

        tokio::time::timeout(Duration::from_secs(10), client.run(&mut driver))
            .await
            .expect("socket run timed out")
            .unwrap();

        // the server builds a team on its own when none was requested
        assert_eq!(driver.rosters, 1);
        assert!(driver.errors.is_empty());
        assert_eq!(driver.store.agents().len(), 4);
        assert_eq!(driver.store.messages().len(), 8);
        assert!(driver.store.debate_finished());
        assert!(!driver.store.is_connected());
        assert_eq!(driver.store.planning_status(), PlanningStatus::Done);
        assert_eq!(
            driver.store.architecture_plan().unwrap().project_name,
            "Build a pet social app..."
        );
    }

    #[tokio::test]
    async fn test_generate_team_then_debate() {
        let url = spawn_arena().await;
        let client = SwarmSocketClient::with_retry(url, fast_retry(2));
        let mut driver = Driver::new(client.handle(), "Ship a todo list");
        driver.generate_first = true;

        tokio::time::timeout(Duration::from_secs(10), client.run(&mut driver))
            .await
            .expect("socket run timed out")
            .unwrap();

        // the requested roster is reused for the debate
        assert_eq!(driver.rosters, 1);
        let agent_ids: Vec<&str> = driver.store.agents().iter().map(|a| a.id.as_str()).collect();
        assert!(driver
            .store
            .messages()
            .iter()
            .all(|m| agent_ids.contains(&m.agent_id.as_str())));
        assert_eq!(driver.store.messages().len(), 8);
    }

    #[tokio::test]
    async fn test_send_while_disconnected() {
        let client = SwarmSocketClient::new("ws://127.0.0.1:9/ws");
        let handle = client.handle();

        assert!(!handle.is_connected());
        let err = handle.send("start_debate", json!({})).unwrap_err();
        assert!(matches!(err, ArenaError::NotConnected));
    }
}

mod reconnect_tests {
    use super::*;

    #[tokio::test]
    async fn test_reconnect_gives_up_after_max_attempts() {
        let url = dead_socket_url().await;
        let client = SwarmSocketClient::with_retry(url, fast_retry(2));
        let mut log = ErrorLog::default();

        let err = tokio::time::timeout(Duration::from_secs(10), client.run(&mut log))
            .await
            .expect("socket run timed out")
            .unwrap_err();

        assert!(matches!(err, ArenaError::ReconnectExhausted(2)));
        assert_eq!(log.codes, vec!["E4002", "E4002", "E4002", "E4004"]);
    }

    #[tokio::test]
    async fn test_disconnect_cancels_reconnect() {
        let url = dead_socket_url().await;
        let client = SwarmSocketClient::with_retry(url, fast_retry(5));
        client.handle().disconnect();
        let mut log = ErrorLog::default();

        tokio::time::timeout(Duration::from_secs(10), client.run(&mut log))
            .await
            .expect("socket run timed out")
            .unwrap();

        assert_eq!(log.codes, vec!["E4002"]);
    }
}

mod watch_command_tests {
    use super::*;

    #[tokio::test]
    async fn test_watch_hangs_up_after_error_frame() {
        let url = spawn_aborting_socket().await;
        let home = tempfile::TempDir::new().unwrap();

        let run = tokio::process::Command::new(env!("CARGO_BIN_EXE_arena"))
            .args(["watch", "Build a pet social app", "--url", &url, "--format", "json"])
            .current_dir(home.path())
            .env("HOME", home.path())
            .env("XDG_CONFIG_HOME", home.path().join(".config"))
            .env_remove("RUST_LOG")
            .env_remove("BACKEND_URL")
            .kill_on_drop(true)
            .output();
        let output = tokio::time::timeout(Duration::from_secs(15), run)
            .await
            .expect("arena watch kept waiting after the debate aborted")
            .unwrap();

        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let events: Vec<Value> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        let names: Vec<&str> = events.iter().map(|e| e["event"].as_str().unwrap()).collect();

        assert_eq!(names, vec!["debate_start", "error"]);
        assert_eq!(events[1]["data"]["code"], "E2003");
        assert!(events[1]["data"]["error"]
            .as_str()
            .unwrap()
            .contains("planner crashed"));
    }
}
