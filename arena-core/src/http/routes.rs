use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::AppState;
use crate::error::{ArenaError, ArenaResult};
use crate::models::Agent;
use crate::roster::generate_roster;
use crate::sse;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GenerateRequest {
    #[serde(default)]
    project_brief: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DebateRequest {
    #[serde(default)]
    project_brief: String,
    #[serde(default)]
    agents: Vec<Agent>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PromptRequest {
    #[serde(default)]
    prompt: Option<String>,
}

fn json_bytes(bytes: Bytes) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], bytes).into_response()
}

pub(super) async fn generate_agents(
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> ArenaResult<Response> {
    let Json(request) = payload.map_err(|e| {
        warn!(error = %e, "Bad roster request");
        ArenaError::InvalidRequest("Failed to generate agents".to_string())
    })?;
    Ok(Json(generate_roster(&request.project_brief)).into_response())
}

/// Streams the debate as `text/event-stream`. The emitter only runs while
/// the response body is being polled.
pub(super) async fn start_debate(
    State(state): State<AppState>,
    payload: Result<Json<DebateRequest>, JsonRejection>,
) -> ArenaResult<Response> {
    let Json(request) = payload.map_err(|e| {
        warn!(error = %e, "Bad debate request");
        ArenaError::InvalidRequest("Failed to start debate".to_string())
    })?;

    info!(
        brief = %request.project_brief,
        active_runs = state.emitter.active_runs(),
        "Starting debate stream for project"
    );

    let frames = state
        .emitter
        .stream(&request.project_brief, request.agents)
        .map(|event| sse::encode_frame(&event));

    Ok((
        [
            (header::CONTENT_TYPE, sse::CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(frames),
    )
        .into_response())
}

pub(super) async fn submit_prompt(
    payload: Result<Json<PromptRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(e) => {
            warn!(error = %e, "Error in prompt endpoint");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response();
        }
    };

    match request.prompt.filter(|p| !p.is_empty()) {
        Some(prompt) => Json(json!({
            "success": true,
            "message": "Team generation started",
            "prompt": prompt,
        }))
        .into_response(),
        None => {
            ArenaError::InvalidRequest("Project prompt is required".to_string()).into_response()
        }
    }
}

pub(super) async fn requirements(
    State(state): State<AppState>,
    body: Bytes,
) -> ArenaResult<Response> {
    state.proxy.requirements(body).await.map(json_bytes)
}

pub(super) async fn build_start(
    State(state): State<AppState>,
    body: Bytes,
) -> ArenaResult<Response> {
    state.proxy.build_start(body).await.map(json_bytes)
}

pub(super) async fn build_status(
    State(state): State<AppState>,
    Path(build_id): Path<String>,
) -> ArenaResult<Response> {
    state.proxy.build_status(&build_id).await.map(json_bytes)
}

/// Relays the archive with the backend's headers, streaming the body.
pub(super) async fn build_download(
    State(state): State<AppState>,
    Path(build_id): Path<String>,
) -> ArenaResult<Response> {
    let upstream = state.proxy.build_download(&build_id).await?;

    let status = upstream.status();
    let mut headers = HeaderMap::new();
    for (name, value) in upstream.headers() {
        if *name == header::CONNECTION || *name == header::TRANSFER_ENCODING {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    Ok((status, headers, Body::from_stream(upstream.bytes_stream())).into_response())
}

pub(super) async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}
