//! Error types for the Swarm Arena core library.
//!
//! Every fallible operation in the crate returns [`ArenaResult`]. Errors carry a
//! stable code so that log lines, CLI output and HTTP envelopes can be matched
//! against each other.
//!
//! # Error Codes Reference
//!
//! | Code Range | Category | Description |
//! |------------|----------|-------------|
//! | E1001-E1099 | Config | Environment, config file, and validation errors |
//! | E2001-E2099 | Debate | Roster and debate schedule errors |
//! | E3001-E3099 | Stream | Event stream framing and decoding errors |
//! | E4001-E4099 | Realtime | Realtime client connection errors |
//! | E5001-E5099 | Backend | External AI backend and proxy errors |
//! | E9001-E9099 | General | Internal, IO, serialization, and validation errors |

use std::fmt;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, info, warn};

/// Configuration for retry behavior with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_attempts: u32,
    /// Base delay multiplied by `backoff_multiplier^attempt`
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff (e.g., 2.0 for doubling)
    pub backoff_multiplier: f64,
    /// Whether to add jitter to prevent thundering herd
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Reconnection policy for the socket client.
    ///
    /// The attempt counter is incremented before the delay is computed, so the
    /// schedule is 2s, 4s, 8s, 10s, 10s.
    pub fn for_socket_reconnection() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    /// Retry policy for plain API calls.
    pub fn for_api() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }

    /// Calculate the delay for a given attempt number.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_delay =
            self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        let capped_delay = base_delay.min(self.max_delay.as_millis() as f64);

        let final_delay = if self.jitter {
            // Up to 25% on top of the capped delay
            let jitter_factor = 1.0 + rand::random::<f64>() * 0.25;
            capped_delay * jitter_factor
        } else {
            capped_delay
        };

        Duration::from_millis(final_delay as u64)
    }
}

/// The main error type for the Swarm Arena core library.
#[derive(Debug, Error)]
pub enum ArenaError {
    // ========================================================================
    // Configuration Errors (E1001-E1099)
    // ========================================================================
    /// Required environment variable is missing
    #[error("[E1001] Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// Environment variable has invalid value
    #[error("[E1002] Invalid environment variable '{name}': {message}")]
    InvalidEnvVar { name: String, message: String },

    /// Configuration file parse error
    #[error("[E1003] Failed to parse configuration: {0}")]
    ConfigParseError(String),

    /// Invalid configuration value
    #[error("[E1004] Invalid configuration value for '{key}': {message}")]
    InvalidConfigValue { key: String, message: String },

    // ========================================================================
    // Debate Errors (E2001-E2099)
    // ========================================================================
    /// A request to a route carried a malformed or incomplete body
    #[error("[E2001] Invalid request: {0}")]
    InvalidRequest(String),

    /// The phrase table has nothing to say for a role
    #[error("[E2002] No phrases configured for role {0}")]
    EmptyPhraseTable(String),

    /// The debate stream reported a terminal error
    #[error("[E2003] Debate aborted: {0}")]
    DebateAborted(String),

    // ========================================================================
    // Stream Errors (E3001-E3099)
    // ========================================================================
    /// The stream endpoint answered with a non-success status
    #[error("[E3001] Failed to start debate: server answered {status}")]
    StreamRejected { status: u16 },

    /// A frame could not be decoded into an event
    #[error("[E3002] Malformed stream frame: {0}")]
    FrameDecode(String),

    /// The response did not carry a body to read
    #[error("[E3003] Stream has no response body")]
    MissingStreamBody,

    // ========================================================================
    // Realtime Client Errors (E4001-E4099)
    // ========================================================================
    /// Roster generation request was rejected
    #[error("[E4001] Failed to generate team: {0}")]
    RosterRequestFailed(String),

    /// Socket connection could not be established
    #[error("[E4002] Failed to connect to '{url}': {message}")]
    SocketConnectFailed { url: String, message: String },

    /// Socket is not connected
    #[error("[E4003] Socket is not connected")]
    NotConnected,

    /// Reconnection gave up after the configured number of attempts
    #[error("[E4004] Max reconnection attempts reached ({0})")]
    ReconnectExhausted(u32),

    // ========================================================================
    // Backend Errors (E5001-E5099)
    // ========================================================================
    /// The backend answered with a non-success status
    #[error("[E5001] {error} (status {status}): {details}")]
    BackendRejected {
        status: u16,
        error: String,
        details: String,
    },

    /// The backend could not be reached at all
    #[error("[E5002] {error}")]
    BackendUnavailable {
        error: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// API request failed
    #[error("[E5003] API request failed: {0}")]
    ApiRequestFailed(String),

    /// API response parse error
    #[error("[E5004] Failed to parse API response: {0}")]
    ApiParseError(String),

    /// Request timed out
    #[error("[E5005] Request to {0} timed out")]
    RequestTimeout(String),

    // ========================================================================
    // General Errors (E9001-E9099)
    // ========================================================================
    /// Internal error (catch-all for unexpected conditions)
    #[error("[E9001] Internal error: {0}")]
    Internal(String),

    /// Validation error
    #[error("[E9002] Validation error: {0}")]
    ValidationError(String),

    /// IO error
    #[error("[E9003] IO error: {0}")]
    IoError(String),

    /// Serialization/deserialization error
    #[error("[E9004] Serialization error: {0}")]
    SerializationError(String),
}

impl ArenaError {
    /// Create a backend-unavailable error with no underlying source.
    pub fn backend_unavailable(error: impl Into<String>) -> Self {
        ArenaError::BackendUnavailable {
            error: error.into(),
            source: None,
        }
    }

    /// Create a backend-unavailable error wrapping the transport failure.
    pub fn backend_unavailable_with_source<E>(error: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ArenaError::BackendUnavailable {
            error: error.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type alias for Swarm Arena operations.
pub type ArenaResult<T> = Result<T, ArenaError>;

// ============================================================================
// From trait implementations for seamless error propagation
// ============================================================================

impl From<reqwest::Error> for ArenaError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ArenaError::RequestTimeout(
                err.url()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| "backend".to_string()),
            )
        } else if err.is_connect() {
            ArenaError::backend_unavailable_with_source("Backend unavailable", err)
        } else if err.is_decode() {
            ArenaError::ApiParseError(err.to_string())
        } else {
            ArenaError::ApiRequestFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ArenaError {
    fn from(err: serde_json::Error) -> Self {
        ArenaError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for ArenaError {
    fn from(err: std::io::Error) -> Self {
        ArenaError::IoError(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ArenaError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ArenaError::SocketConnectFailed {
            url: String::new(),
            message: err.to_string(),
        }
    }
}

impl From<config::ConfigError> for ArenaError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(key) => ArenaError::InvalidConfigValue {
                key,
                message: "Key not found".to_string(),
            },
            config::ConfigError::FileParse { uri, cause } => ArenaError::ConfigParseError(
                format!("Failed to parse {}: {}", uri.unwrap_or_default(), cause),
            ),
            config::ConfigError::Type {
                origin,
                unexpected,
                expected,
                key,
            } => ArenaError::InvalidConfigValue {
                key: key.unwrap_or_else(|| origin.map(|o| o.to_string()).unwrap_or_default()),
                message: format!("Expected {}, got {}", expected, unexpected),
            },
            _ => ArenaError::ConfigParseError(err.to_string()),
        }
    }
}

impl From<crate::config::ConfigLoadError> for ArenaError {
    fn from(err: crate::config::ConfigLoadError) -> Self {
        match err {
            crate::config::ConfigLoadError::Config(e) => e.into(),
            crate::config::ConfigLoadError::MissingRequired(key) => ArenaError::InvalidConfigValue {
                key,
                message: "Missing required value".to_string(),
            },
            crate::config::ConfigLoadError::InvalidValue { key, message } => {
                ArenaError::InvalidConfigValue { key, message }
            }
            crate::config::ConfigLoadError::Io(e) => e.into(),
        }
    }
}

// ============================================================================
// Error categorization helpers
// ============================================================================

impl ArenaError {
    /// Returns true if this error is related to configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ArenaError::MissingEnvVar(_)
                | ArenaError::InvalidEnvVar { .. }
                | ArenaError::ConfigParseError(_)
                | ArenaError::InvalidConfigValue { .. }
        )
    }

    /// Returns true if this error came from reading the event stream.
    pub fn is_stream_error(&self) -> bool {
        matches!(
            self,
            ArenaError::StreamRejected { .. }
                | ArenaError::FrameDecode(_)
                | ArenaError::MissingStreamBody
                | ArenaError::DebateAborted(_)
        )
    }

    /// Returns true if this error came from the external backend.
    pub fn is_backend_error(&self) -> bool {
        matches!(
            self,
            ArenaError::BackendRejected { .. }
                | ArenaError::BackendUnavailable { .. }
                | ArenaError::ApiRequestFailed(_)
                | ArenaError::ApiParseError(_)
                | ArenaError::RequestTimeout(_)
        )
    }

    /// Returns true if this error is transient and the operation might succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ArenaError::BackendUnavailable { .. }
                | ArenaError::RequestTimeout(_)
                | ArenaError::SocketConnectFailed { .. }
                | ArenaError::NotConnected
        )
    }

    /// HTTP status used when this error is rendered as a response envelope.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ArenaError::BackendRejected { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ArenaError::BackendUnavailable { .. } | ArenaError::RequestTimeout(_) => {
                StatusCode::BAD_GATEWAY
            }
            ArenaError::InvalidRequest(_) | ArenaError::ValidationError(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns an error code suitable for logging or external reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            ArenaError::MissingEnvVar(_) => "E1001",
            ArenaError::InvalidEnvVar { .. } => "E1002",
            ArenaError::ConfigParseError(_) => "E1003",
            ArenaError::InvalidConfigValue { .. } => "E1004",
            ArenaError::InvalidRequest(_) => "E2001",
            ArenaError::EmptyPhraseTable(_) => "E2002",
            ArenaError::DebateAborted(_) => "E2003",
            ArenaError::StreamRejected { .. } => "E3001",
            ArenaError::FrameDecode(_) => "E3002",
            ArenaError::MissingStreamBody => "E3003",
            ArenaError::RosterRequestFailed(_) => "E4001",
            ArenaError::SocketConnectFailed { .. } => "E4002",
            ArenaError::NotConnected => "E4003",
            ArenaError::ReconnectExhausted(_) => "E4004",
            ArenaError::BackendRejected { .. } => "E5001",
            ArenaError::BackendUnavailable { .. } => "E5002",
            ArenaError::ApiRequestFailed(_) => "E5003",
            ArenaError::ApiParseError(_) => "E5004",
            ArenaError::RequestTimeout(_) => "E5005",
            ArenaError::Internal(_) => "E9001",
            ArenaError::ValidationError(_) => "E9002",
            ArenaError::IoError(_) => "E9003",
            ArenaError::SerializationError(_) => "E9004",
        }
    }

    /// Returns a user-friendly suggestion for how to resolve this error.
    pub fn user_suggestion(&self) -> Option<&'static str> {
        match self {
            ArenaError::BackendUnavailable { .. } => {
                Some("Make sure the AI backend is running and BACKEND_URL points at it")
            }
            ArenaError::MissingEnvVar(_) => {
                Some("Create a .env file or set the environment variable")
            }
            ArenaError::StreamRejected { .. } | ArenaError::RosterRequestFailed(_) => {
                Some("Check that 'arena serve' is running and reachable")
            }
            ArenaError::ReconnectExhausted(_) => {
                Some("Check NEXT_PUBLIC_WS_URL and restart the watcher")
            }
            ArenaError::EmptyPhraseTable(_) => {
                Some("Every role needs at least one phrase in the debate phrase table")
            }
            _ => None,
        }
    }

    /// Log this error with appropriate severity level.
    pub fn log(&self) {
        let code = self.error_code();
        let suggestion = self.user_suggestion();

        if self.is_transient() {
            warn!(
                error_code = %code,
                suggestion = suggestion,
                "Transient error occurred: {}",
                self
            );
        } else {
            error!(
                error_code = %code,
                suggestion = suggestion,
                "Error occurred: {}",
                self
            );
        }
    }
}

/// Renders the uniform `{error, details?}` envelope.
impl IntoResponse for ArenaError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ArenaError::BackendRejected { error, details, .. } => {
                json!({ "error": error, "details": details })
            }
            ArenaError::BackendUnavailable { error, .. } => json!({ "error": error }),
            ArenaError::InvalidRequest(message) => json!({ "error": message }),
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Retry utilities
// ============================================================================

/// Execute an async operation, retrying transient failures with backoff.
pub async fn retry_async_with_config<F, Fut, T>(
    operation: F,
    config: RetryConfig,
) -> ArenaResult<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = ArenaResult<T>>,
{
    let mut last_error = None;

    for attempt in 0..config.max_attempts {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    info!(
                        "Operation succeeded on attempt {} after {} retries",
                        attempt + 1,
                        attempt
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                if !e.is_transient() || attempt == config.max_attempts - 1 {
                    e.log();
                    return Err(e);
                }

                let delay = config.delay_for_attempt(attempt);
                warn!(
                    "Attempt {} failed ({}), retrying in {:?}",
                    attempt + 1,
                    e,
                    delay
                );

                tokio::time::sleep(delay).await;
                last_error = Some(e);
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| ArenaError::Internal("Retry loop exhausted without error".to_string())))
}

// ============================================================================
// User-friendly error formatting for CLI
// ============================================================================

/// Format an error for CLI display with its suggestion.
pub struct CliErrorDisplay<'a> {
    error: &'a ArenaError,
    show_suggestion: bool,
}

impl<'a> CliErrorDisplay<'a> {
    pub fn new(error: &'a ArenaError) -> Self {
        Self {
            error,
            show_suggestion: true,
        }
    }

    pub fn without_suggestion(mut self) -> Self {
        self.show_suggestion = false;
        self
    }
}

impl fmt::Display for CliErrorDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.error)?;

        if self.show_suggestion {
            if let Some(suggestion) = self.error.user_suggestion() {
                writeln!(f)?;
                writeln!(f, "  Suggestion: {}", suggestion)?;
            }
        }

        Ok(())
    }
}
