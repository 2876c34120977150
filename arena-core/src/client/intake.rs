use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{retry_async_with_config, ArenaResult, RetryConfig};
use crate::models::{
    ChatReply, ConversationTurn, FinalizedRequirements, SessionStartResponse, VoiceTurn,
};
use crate::proxy::ensure_success;

const UNREACHABLE: &str = "Unable to reach the AI backend. Make sure it is running.";

/// Direct client for the backend's requirements-gathering conversation.
#[derive(Debug, Clone)]
pub struct IntakeClient {
    http: Client,
    base_url: String,
    session_id: String,
    retry: RetryConfig,
}

impl IntakeClient {
    /// Uses a fresh random session id.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_session(base_url, uuid::Uuid::new_v4().to_string())
    }

    pub fn with_session(base_url: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_id: session_id.into(),
            retry: RetryConfig::for_api(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> ArenaResult<T> {
        let response = ensure_success(response, UNREACHABLE).await?;
        Ok(response.json::<T>().await?)
    }

    /// Opens (or resumes) the session and returns the conversation so far.
    /// Connection failures are retried.
    pub async fn start_session(&self) -> ArenaResult<Vec<ConversationTurn>> {
        let url = format!("{}/session/start", self.base_url);
        let body = json!({ "session_id": self.session_id });

        let (http, url, body) = (&self.http, &url, &body);

        let started: SessionStartResponse = retry_async_with_config(
            || async move {
                let response = http.post(url).json(body).send().await?;
                Self::read(response).await
            },
            self.retry.clone(),
        )
        .await?;

        let turns = started.state.turns();
        info!(session = %self.session_id, turns = turns.len(), "Intake session ready");
        Ok(turns)
    }

    pub async fn send_text(&self, message: &str) -> ArenaResult<ChatReply> {
        let response = self
            .http
            .post(format!("{}/chat/text", self.base_url))
            .json(&json!({ "session_id": self.session_id, "message": message }))
            .send()
            .await?;
        Self::read(response).await
    }

    /// Uploads a recorded clip as the `audio` multipart field.
    pub async fn send_voice(
        &self,
        audio: Vec<u8>,
        file_name: &str,
        mime: &str,
    ) -> ArenaResult<VoiceTurn> {
        debug!(bytes = audio.len(), file_name, "Uploading voice clip");
        let part = Part::bytes(audio)
            .file_name(file_name.to_string())
            .mime_str(mime)?;
        let form = Form::new().part("audio", part);

        let response = self
            .http
            .post(format!("{}/chat/voice", self.base_url))
            .query(&[("session_id", self.session_id.as_str())])
            .multipart(form)
            .send()
            .await?;
        Self::read(response).await
    }

    pub async fn finalize(&self) -> ArenaResult<FinalizedRequirements> {
        let response = self
            .http
            .post(format!("{}/doc/finalize", self.base_url))
            .json(&json!({ "session_id": self.session_id }))
            .send()
            .await?;
        Self::read(response).await
    }
}
