use anyhow::Result;
use arena_core::client::dispatch_event;
use arena_core::{
    generate_roster, ArchitecturePlan, ArenaConfig, ArenaError, CodeFile, DebateEmitter,
    DebateTiming, Message, PhraseTable, Roster, SocketHandle, SwarmEventHandler,
    SwarmSocketClient, SwarmSseClient, SwarmStore,
};
use colored::Colorize;
use futures::StreamExt;
use serde_json::json;

use crate::output;

/// Prints events as they arrive and keeps the session in a [`SwarmStore`].
struct TerminalView {
    store: SwarmStore,
    json: bool,
    socket: Option<SocketHandle>,
}

impl TerminalView {
    fn new(brief: &str, format: &str) -> Self {
        let mut store = SwarmStore::new();
        store.set_project_brief(brief);
        Self {
            store,
            json: format == "json",
            socket: None,
        }
    }

    /// On connect the view asks the socket for a team and a debate; it hangs
    /// up once the debate ends.
    fn with_socket(mut self, socket: SocketHandle) -> Self {
        self.socket = Some(socket);
        self
    }

    fn emit(&self, event: &str, data: serde_json::Value) {
        println!("{}", json!({ "event": event, "data": data }));
    }

    fn summary(&self) {
        if self.json {
            return;
        }
        println!();
        println!(
            "{} {} messages from {} agents",
            "✓".green().bold(),
            self.store.messages().len(),
            self.store.agents().len()
        );
        if let Some(error) = self.store.last_error() {
            println!("{} {}", "!".yellow().bold(), error);
        }
    }
}

impl SwarmEventHandler for TerminalView {
    fn on_connect(&mut self) {
        self.store.on_connect();
        if let Some(socket) = &self.socket {
            let brief = json!({ "brief": self.store.project_brief() });
            let sent = socket
                .send("generate_team", brief.clone())
                .and_then(|_| socket.send("start_debate", brief));
            if let Err(e) = sent {
                e.log();
            }
        }
        if !self.json {
            println!("{} Connected", "→".blue());
        }
    }

    fn on_disconnect(&mut self) {
        self.store.on_disconnect();
    }

    fn on_message(&mut self, message: Message) {
        if self.json {
            self.emit("message", json!(message));
        } else {
            output::print_message(&message);
        }
        self.store.on_message(message);
    }

    fn on_agents_generated(&mut self, roster: Roster) {
        if self.json {
            self.emit("agents_generated", json!(roster));
        } else {
            output::print_roster(&roster);
            println!();
        }
        self.store.on_agents_generated(roster);
    }

    fn on_debate_start(&mut self) {
        if self.json {
            self.emit("debate_start", serde_json::Value::Null);
        } else {
            println!("{}", "Debate started".cyan().bold());
        }
        self.store.on_debate_start();
    }

    fn on_debate_end(&mut self) {
        if self.json {
            self.emit("debate_end", serde_json::Value::Null);
        }
        self.store.on_debate_end();
        if let Some(socket) = &self.socket {
            socket.disconnect();
        }
    }

    fn on_plan_ready(&mut self, plan: ArchitecturePlan) {
        if self.json {
            self.emit("plan_ready", json!(plan));
        } else {
            output::print_plan(&plan);
        }
        self.store.on_plan_ready(plan);
    }

    fn on_code_generated(&mut self, file: CodeFile) {
        if self.json {
            self.emit("code_generated", json!(file));
        } else {
            println!("{} {} ({})", "+".green(), file.path, file.language);
        }
        self.store.on_code_generated(file);
    }

    fn on_error(&mut self, error: &ArenaError) {
        if self.json {
            self.emit(
                "error",
                json!({ "code": error.error_code(), "error": error.to_string() }),
            );
        } else {
            eprintln!("{} {}", "✗".red().bold(), error);
        }
        self.store.on_error(error);

        // An aborted debate is as final as debate_end. Connection failures
        // are left to the reconnect loop.
        if let (ArenaError::DebateAborted(_), Some(socket)) = (error, &self.socket) {
            socket.disconnect();
        }
    }
}

pub async fn cmd_run(
    config: &ArenaConfig,
    brief: &str,
    server: Option<String>,
    offline: bool,
    fast: bool,
    format: &str,
) -> Result<()> {
    let mut view = TerminalView::new(brief, format);

    if offline {
        let timing = if fast {
            DebateTiming {
                rounds: config.debate.rounds,
                ..DebateTiming::instant()
            }
        } else {
            DebateTiming::from_config(&config.debate)
        };
        let roster = generate_roster(brief);
        let agents = roster.agents.clone();
        view.on_agents_generated(roster);

        let emitter = DebateEmitter::new(timing, PhraseTable::default());
        let mut events = emitter.stream(brief, agents);
        while let Some(event) = events.next().await {
            dispatch_event(&mut view, event);
        }
    } else {
        let server = server.unwrap_or_else(|| config.client.server_url.clone());
        let mut client = SwarmSseClient::new(server);
        client.connect(&mut view);

        let result = async {
            let roster = client.generate_agents(&mut view, brief).await?;
            client.start_debate(&mut view, brief, &roster.agents).await
        }
        .await;

        client.disconnect(&mut view);
        result?;
    }

    view.summary();
    Ok(())
}

/// `http://host:port` → `ws://host:port/ws`
fn server_socket_url(server_url: &str) -> String {
    let base = server_url.trim_end_matches('/');
    let swapped = if let Some(rest) = base.strip_prefix("https") {
        format!("wss{}", rest)
    } else if let Some(rest) = base.strip_prefix("http") {
        format!("ws{}", rest)
    } else {
        base.to_string()
    };
    format!("{}/ws", swapped)
}

pub async fn cmd_watch(
    config: &ArenaConfig,
    brief: &str,
    url: Option<String>,
    backend: bool,
    format: &str,
) -> Result<()> {
    let url = match url {
        Some(url) => url,
        None if backend => config.backend.ws_url(),
        None => server_socket_url(&config.client.server_url),
    };

    if format != "json" {
        println!("{} Connecting to {}", "→".blue(), url);
    }

    let client = SwarmSocketClient::new(url);
    let handle = client.handle();
    let mut view = TerminalView::new(brief, format).with_socket(handle.clone());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.disconnect();
        }
    });

    client.run(&mut view).await?;
    view.summary();
    Ok(())
}
