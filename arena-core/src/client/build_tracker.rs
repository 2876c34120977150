use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::ArenaResult;
use crate::models::{BuildRecord, BuildStarted, BuildStatus};
use crate::proxy::ensure_success;

/// Download name for a build archive: the first 30 characters of the brief
/// with whitespace runs collapsed to `-`.
pub fn archive_file_name(brief: &str) -> String {
    let head: String = brief.chars().take(30).collect();
    let mut stem = String::with_capacity(head.len());
    let mut in_space = false;
    for c in head.chars() {
        if c.is_whitespace() {
            if !in_space {
                stem.push('-');
            }
            in_space = true;
        } else {
            stem.push(c);
            in_space = false;
        }
    }
    if stem.is_empty() {
        stem.push_str("swarm-build");
    }
    format!("{}-scaffold.zip", stem)
}

/// Starts scaffold builds through the arena server and follows them to
/// completion.
#[derive(Debug, Clone)]
pub struct BuildTracker {
    http: Client,
    base_url: String,
    poll_interval: Duration,
}

impl BuildTracker {
    pub fn new(base_url: impl Into<String>, poll_interval: Duration) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            poll_interval,
        }
    }

    pub async fn start(&self, session_id: &str) -> ArenaResult<String> {
        let response = self
            .http
            .post(format!("{}/api/build/start", self.base_url))
            .json(&json!({ "session_id": session_id }))
            .send()
            .await?;
        let response = ensure_success(response, "Failed to start build").await?;
        let started: BuildStarted = response.json().await?;
        info!(build_id = %started.build_id, "Build queued");
        Ok(started.build_id)
    }

    pub async fn status(&self, build_id: &str) -> ArenaResult<BuildRecord> {
        let response = self
            .http
            .get(format!("{}/api/build/status/{}", self.base_url, build_id))
            .send()
            .await?;
        let response = ensure_success(response, "Failed to fetch status").await?;
        Ok(response.json().await?)
    }

    /// Polls until the build is `complete` with a download path, or `failed`.
    /// The first poll happens immediately. A failed poll is logged and the
    /// next tick tries again.
    pub async fn wait_for_completion<F>(
        &self,
        build_id: &str,
        mut on_update: F,
    ) -> ArenaResult<BuildRecord>
    where
        F: FnMut(&BuildRecord),
    {
        let mut ticker = tokio::time::interval(self.poll_interval);
        loop {
            ticker.tick().await;
            match self.status(build_id).await {
                Ok(record) => {
                    debug!(build_id, status = %record.status, "Build status");
                    on_update(&record);
                    if record.is_ready() || record.status == BuildStatus::Failed {
                        return Ok(record);
                    }
                }
                Err(e) => warn!(build_id, error = %e, "Build status polling failed"),
            }
        }
    }

    pub async fn download(&self, build_id: &str) -> ArenaResult<Bytes> {
        let response = self
            .http
            .get(format!("{}/api/build/download/{}", self.base_url, build_id))
            .send()
            .await?;
        let response = ensure_success(response, "Failed to download build").await?;
        Ok(response.bytes().await?)
    }
}
