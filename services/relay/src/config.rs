use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub anthropic_api_key: String,
    pub anthropic_base_url: String,
    pub chat_model: String,
    pub max_completion_tokens: u32,
    /// Hostname the telephony side dials; used to build the WebSocket URL
    /// in the TwiML descriptor.
    pub public_host: String,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let anthropic_api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| ConfigError::MissingVar("ANTHROPIC_API_KEY".to_string()))?;

        let anthropic_base_url = std::env::var("ANTHROPIC_BASE_URL")
            .unwrap_or_else(|_| "https://api.anthropic.com".to_string());

        let chat_model = std::env::var("CHAT_MODEL")
            .unwrap_or_else(|_| "claude-3-5-haiku-20241022".to_string());

        let max_tokens_str =
            std::env::var("MAX_COMPLETION_TOKENS").unwrap_or_else(|_| "1024".to_string());
        let max_completion_tokens = max_tokens_str.parse::<u32>().map_err(|_| {
            ConfigError::InvalidValue(
                "MAX_COMPLETION_TOKENS".to_string(),
                format!("'{}' is not a valid token count", max_tokens_str),
            )
        })?;

        let public_host = std::env::var("PUBLIC_HOST")
            .map_err(|_| ConfigError::MissingVar("PUBLIC_HOST".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            anthropic_api_key,
            anthropic_base_url,
            chat_model,
            max_completion_tokens,
            public_host,
            log_level,
        })
    }

    /// The WebSocket URL the telephony side is told to connect to.
    pub fn ws_url(&self) -> String {
        format!("wss://{}/ws", self.public_host)
    }
}
