//! axum server hosting the arena API, the debate stream and the socket endpoint.

mod routes;
mod socket;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::{self, TraceLayer};
use tracing::{info, Level};

use crate::config::ArenaConfig;
use crate::debate::{DebateEmitter, DebateTiming, PhraseTable};
use crate::error::ArenaResult;
use crate::proxy::BackendProxy;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub emitter: DebateEmitter,
    pub proxy: BackendProxy,
}

impl AppStateInner {
    pub fn new(emitter: DebateEmitter, proxy: BackendProxy) -> AppState {
        Arc::new(Self { emitter, proxy })
    }

    pub fn from_config(config: &ArenaConfig) -> ArenaResult<AppState> {
        let emitter = DebateEmitter::new(
            DebateTiming::from_config(&config.debate),
            PhraseTable::default(),
        );
        let proxy = BackendProxy::new(&config.backend.url, config.backend.request_timeout())?;
        Ok(Self::new(emitter, proxy))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/agents/generate", post(routes::generate_agents))
        .route("/api/debate/start", post(routes::start_debate))
        .route("/api/prompt", post(routes::submit_prompt))
        .route("/api/requirements", post(routes::requirements))
        .route("/api/build/start", post(routes::build_start))
        .route("/api/build/status/{build_id}", get(routes::build_status))
        .route("/api/build/download/{build_id}", get(routes::build_download))
        .route("/api/health", get(routes::health))
        .route("/ws", get(socket::upgrade))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `server.host:server.port` and serves until Ctrl-C.
pub async fn serve(config: &ArenaConfig) -> ArenaResult<()> {
    let state = AppStateInner::from_config(config)?;
    let app = router(state);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, backend = %config.backend.url, "Arena server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;
    Ok(())
}

/// Serves on an already bound listener until the task is dropped.
pub async fn serve_listener(listener: TcpListener, state: AppState) -> ArenaResult<()> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}
