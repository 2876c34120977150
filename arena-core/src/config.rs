use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const WS_PLAN_PATH: &str = "/ws/projects/tech-plan";

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ArenaConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub debate: DebateConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Server-side proxy target.
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// Backend reached directly by clients; falls back to `url`.
    #[serde(default)]
    pub public_url: String,

    /// Socket endpoint; derived from `public_url` when empty.
    #[serde(default)]
    pub ws_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateConfig {
    #[serde(default = "default_rounds")]
    pub rounds: u32,

    #[serde(default = "default_min_delay")]
    pub min_delay_ms: u64,

    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    #[serde(default = "default_plan_delay")]
    pub plan_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Where the arena HTTP server is reached by the CLI clients.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    #[serde(default = "default_poll_interval")]
    pub build_poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json_format: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_request_timeout() -> u64 {
    60
}

fn default_rounds() -> u32 {
    2
}

fn default_min_delay() -> u64 {
    1000
}

fn default_max_delay() -> u64 {
    3000
}

fn default_plan_delay() -> u64 {
    1000
}

fn default_server_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_poll_interval() -> u64 {
    3000
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            public_url: String::new(),
            ws_url: String::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            min_delay_ms: default_min_delay(),
            max_delay_ms: default_max_delay(),
            plan_delay_ms: default_plan_delay(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            build_poll_interval_ms: default_poll_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl BackendConfig {
    pub fn public_url(&self) -> &str {
        if self.public_url.is_empty() {
            &self.url
        } else {
            &self.public_url
        }
    }

    pub fn ws_url(&self) -> String {
        if self.ws_url.is_empty() {
            derive_ws_url(self.public_url())
        } else {
            self.ws_url.clone()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// `http://host` becomes `ws://host/ws/projects/tech-plan`, `https` becomes `wss`.
pub fn derive_ws_url(http_url: &str) -> String {
    let base = http_url.trim_end_matches('/');
    let lower = base.to_ascii_lowercase();
    let swapped = if lower.starts_with("https") {
        format!("wss{}", &base[5..])
    } else if lower.starts_with("http") {
        format!("ws{}", &base[4..])
    } else {
        base.to_string()
    };
    format!("{}{}", swapped, WS_PLAN_PATH)
}

impl ArenaConfig {
    pub fn load() -> Result<Self, ConfigLoadError> {
        Self::load_from_paths(get_config_paths())
    }

    pub fn load_from_paths(paths: Vec<PathBuf>) -> Result<Self, ConfigLoadError> {
        load_dotenv_files();

        let mut builder = ConfigBuilder::builder();

        for path in paths {
            if path.exists() {
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("ARENA")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;

        let mut arena_config: ArenaConfig = config.try_deserialize()?;
        arena_config.apply_env_overrides();
        arena_config.validate()?;

        Ok(arena_config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("BACKEND_URL") {
            self.backend.url = url;
        }

        if let Ok(url) = std::env::var("NEXT_PUBLIC_BACKEND_URL") {
            self.backend.public_url = url;
        }

        if let Ok(url) = std::env::var("NEXT_PUBLIC_WS_URL") {
            self.backend.ws_url = url;
        }

        if let Ok(port) = std::env::var("ARENA_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }

        if let Ok(level) = std::env::var("ARENA_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.backend.url.is_empty() {
            return Err(ConfigLoadError::MissingRequired("backend.url".to_string()));
        }

        for (key, url) in [
            ("backend.url", self.backend.url.as_str()),
            ("backend.public_url", self.backend.public_url()),
            ("client.server_url", self.client.server_url.as_str()),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigLoadError::InvalidValue {
                    key: key.to_string(),
                    message: "Must start with http:// or https://".to_string(),
                });
            }
        }

        if self.debate.rounds == 0 {
            return Err(ConfigLoadError::InvalidValue {
                key: "debate.rounds".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.debate.min_delay_ms > self.debate.max_delay_ms {
            return Err(ConfigLoadError::InvalidValue {
                key: "debate.min_delay_ms".to_string(),
                message: "Cannot be greater than max_delay_ms".to_string(),
            });
        }

        if self.client.build_poll_interval_ms == 0 {
            return Err(ConfigLoadError::InvalidValue {
                key: "client.build_poll_interval_ms".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if let Err(e) = EnvFilter::try_new(&self.logging.level) {
            return Err(ConfigLoadError::InvalidValue {
                key: "logging.level".to_string(),
                message: format!("Invalid filter '{}': {}", self.logging.level, e),
            });
        }

        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Filter directives used when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &str {
        &self.logging.level
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join("config").join("default.toml"));
        paths.push(cwd.join("config").join("local.toml"));
        paths.push(cwd.join("arena.toml"));
    }

    if let Some(config_dir) = get_config_dir() {
        paths.push(config_dir.join("config.toml"));
    }

    paths
}

fn load_dotenv_files() {
    let mut paths = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".env"));
        paths.push(cwd.join(".env.local"));
    }

    if let Some(config_dir) = get_config_dir() {
        paths.push(config_dir.join(".env"));
    }

    for path in paths {
        if path.exists() {
            let _ = dotenvy::from_path(&path);
        }
    }
}

pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("swarm-arena"))
}
