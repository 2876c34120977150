use arena_core::http::{serve_listener, AppStateInner};
use arena_core::{
    ArenaError, BackendProxy, DebateEmitter, DebateTiming, PhraseTable, PlanningStatus,
    SwarmEventHandler, SwarmSseClient, SwarmStore,
};
use std::time::Duration;
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn spawn_arena() -> String {
    spawn_arena_with(DebateEmitter::new(DebateTiming::instant(), PhraseTable::default())).await
}

async fn spawn_arena_with(emitter: DebateEmitter) -> String {
    let state = AppStateInner::new(
        emitter,
        BackendProxy::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap(),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = serve_listener(listener, state).await;
    });
    format!("http://{}", addr)
}

/// Records callback order next to the store it forwards to.
#[derive(Default)]
struct Recorder {
    store: SwarmStore,
    calls: Vec<&'static str>,
}

impl SwarmEventHandler for Recorder {
    fn on_connect(&mut self) {
        self.calls.push("connect");
        self.store.on_connect();
    }

    fn on_disconnect(&mut self) {
        self.calls.push("disconnect");
        self.store.on_disconnect();
    }

    fn on_message(&mut self, message: arena_core::Message) {
        self.calls.push("message");
        self.store.on_message(message);
    }

    fn on_agents_generated(&mut self, roster: arena_core::Roster) {
        self.calls.push("agents");
        self.store.on_agents_generated(roster);
    }

    fn on_debate_start(&mut self) {
        self.calls.push("start");
        self.store.on_debate_start();
    }

    fn on_debate_end(&mut self) {
        self.calls.push("end");
        self.store.on_debate_end();
    }

    fn on_plan_ready(&mut self, plan: arena_core::ArchitecturePlan) {
        self.calls.push("plan");
        self.store.on_plan_ready(plan);
    }

    fn on_code_generated(&mut self, file: arena_core::CodeFile) {
        self.calls.push("code");
        self.store.on_code_generated(file);
    }

    fn on_error(&mut self, error: &ArenaError) {
        self.calls.push("error");
        self.store.on_error(error);
    }
}

fn sse_body(frames: &[&str]) -> String {
    frames.iter().map(|f| format!("data: {}\n\n", f)).collect()
}

mod sse_flow_tests {
    use super::*;

    #[tokio::test]
    async fn test_client_hangup_stops_server_run() {
        let timing = DebateTiming {
            min_delay: Duration::from_millis(50),
            max_delay: Duration::from_millis(60),
            ..DebateTiming::default()
        };
        let emitter = DebateEmitter::new(timing, PhraseTable::default());
        let arena = spawn_arena_with(emitter.clone()).await;

        let roster = arena_core::generate_roster("brief");
        let mut response = reqwest::Client::new()
            .post(format!("{}/api/debate/start", arena))
            .json(&serde_json::json!({ "projectBrief": "brief", "agents": roster.agents }))
            .send()
            .await
            .unwrap();
        assert!(response.chunk().await.unwrap().is_some());
        assert_eq!(emitter.active_runs(), 1);
        drop(response);

        // a full run needs over 1.4s (eight messages plus the plan delay)
        let deadline = tokio::time::Instant::now() + Duration::from_millis(1000);
        while emitter.active_runs() > 0 {
            assert!(
                tokio::time::Instant::now() < deadline,
                "server kept emitting after the client hung up"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_pet_social_app_scenario() {
        let arena = spawn_arena().await;
        let mut client = SwarmSseClient::new(arena);
        let mut recorder = Recorder::default();

        client.connect(&mut recorder);
        assert!(client.is_connected());

        let roster = client
            .generate_agents(&mut recorder, "Build a pet social app")
            .await
            .unwrap();
        let names: Vec<&str> = roster.agents.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["PM Agent", "Dev Agent", "UX Agent", "QA Agent"]);

        let outcome = client
            .start_debate(&mut recorder, "Build a pet social app", &roster.agents)
            .await
            .unwrap();
        client.disconnect(&mut recorder);

        assert_eq!(outcome.messages, 8);
        assert!(outcome.finished);
        assert!(outcome
            .plan
            .as_ref()
            .unwrap()
            .project_name
            .starts_with("Build a pet social app"));

        let mut expected = vec!["connect", "agents", "start"];
        expected.extend(std::iter::repeat("message").take(8));
        expected.extend(["plan", "end", "disconnect"]);
        assert_eq!(recorder.calls, expected);

        let store = &recorder.store;
        assert_eq!(store.messages().len(), 8);
        assert_eq!(store.graph_links().len(), 3);
        assert!(store.debate_finished());
        assert!(!store.is_debating());
        assert!(!store.is_connected());
        assert_eq!(store.planning_status(), PlanningStatus::Done);
    }

    #[tokio::test]
    async fn test_roster_failure_reaches_error_callback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/agents/generate"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = SwarmSseClient::new(server.uri());
        let mut recorder = Recorder::default();
        let err = client
            .generate_agents(&mut recorder, "brief")
            .await
            .unwrap_err();

        assert!(matches!(err, ArenaError::RosterRequestFailed(_)));
        assert_eq!(recorder.calls, vec!["error"]);
        assert!(recorder.store.last_error().unwrap().contains("E4001"));
    }

    #[tokio::test]
    async fn test_unknown_frames_are_skipped() {
        let server = MockServer::start().await;
        let body = sse_body(&[
            r#"{"type":"debate_start"}"#,
            r#"{"type":"agent_thought","data":{"content":"hmm"}}"#,
            r##"{"type":"code_generated","data":{"path":"README.md","content":"# Pets","language":"markdown","timestamp":1}}"##,
            r#"{"type":"debate_end"}"#,
        ]);
        Mock::given(method("POST"))
            .and(path("/api/debate/start"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&server)
            .await;

        let client = SwarmSseClient::new(server.uri());
        let mut recorder = Recorder::default();
        let outcome = client
            .start_debate(&mut recorder, "brief", &[])
            .await
            .unwrap();

        assert!(outcome.finished);
        assert_eq!(recorder.calls, vec!["start", "code", "end"]);
        assert_eq!(recorder.store.swarm_doc_markdown(), Some("# Pets"));
    }

    #[tokio::test]
    async fn test_error_frame_aborts_stream() {
        let server = MockServer::start().await;
        let body = sse_body(&[
            r#"{"type":"debate_start"}"#,
            r#"{"type":"error","data":{"error":"emitter crashed"}}"#,
            r#"{"type":"debate_end"}"#,
        ]);
        Mock::given(method("POST"))
            .and(path("/api/debate/start"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let client = SwarmSseClient::new(server.uri());
        let mut recorder = Recorder::default();
        let err = client
            .start_debate(&mut recorder, "brief", &[])
            .await
            .unwrap_err();

        assert!(matches!(err, ArenaError::DebateAborted(ref m) if m == "emitter crashed"));
        // reported once, and nothing after the error frame is dispatched
        assert_eq!(recorder.calls, vec!["start", "error"]);
        assert_eq!(recorder.store.planning_status(), PlanningStatus::Idle);
    }

    #[tokio::test]
    async fn test_malformed_frame_aborts_stream() {
        let server = MockServer::start().await;
        let body = sse_body(&[r#"{"type":"debate_start"}"#, "{broken"]);
        Mock::given(method("POST"))
            .and(path("/api/debate/start"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let client = SwarmSseClient::new(server.uri());
        let mut recorder = Recorder::default();
        let err = client
            .start_debate(&mut recorder, "brief", &[])
            .await
            .unwrap_err();

        assert!(matches!(err, ArenaError::FrameDecode(_)));
        assert_eq!(recorder.calls, vec!["start", "error"]);
    }

    #[tokio::test]
    async fn test_rejected_stream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/debate/start"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let client = SwarmSseClient::new(server.uri());
        let mut recorder = Recorder::default();
        let err = client
            .start_debate(&mut recorder, "brief", &[])
            .await
            .unwrap_err();

        assert!(matches!(err, ArenaError::StreamRejected { status: 400 }));
        assert_eq!(recorder.calls, vec!["error"]);
    }

    #[tokio::test]
    async fn test_reset_between_runs() {
        let arena = spawn_arena().await;
        let client = SwarmSseClient::new(arena);
        let mut recorder = Recorder::default();
        recorder.store.set_project_brief("Build a pet social app");
        recorder.store.set_session_id("s-1");

        let roster = client
            .generate_agents(&mut recorder, "Build a pet social app")
            .await
            .unwrap();
        client
            .start_debate(&mut recorder, "Build a pet social app", &roster.agents)
            .await
            .unwrap();

        recorder.store.reset();
        assert!(recorder.store.messages().is_empty());
        assert!(recorder.store.architecture_plan().is_none());
        assert_eq!(recorder.store.project_brief(), "Build a pet social app");
        assert_eq!(recorder.store.session_id(), Some("s-1"));
    }
}
