//! Voicerelay API Library Crate
//!
//! This library contains the web-facing logic for the voice relay service:
//! configuration, application state, HTTP routing, the TwiML descriptor
//! handler, and the WebSocket session machinery. The `relay` binary is a
//! thin wrapper around this library.

pub mod config;
pub mod handlers;
pub mod router;
pub mod state;
pub mod ws;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::Config;

    pub fn test_config() -> Config {
        Config {
            bind_address: "127.0.0.1:8080".parse().unwrap(),
            anthropic_api_key: "test-key".to_string(),
            anthropic_base_url: "http://localhost:9".to_string(),
            chat_model: "claude-3-5-haiku-20241022".to_string(),
            max_completion_tokens: 1024,
            public_host: "relay.example.com".to_string(),
            log_level: tracing::Level::INFO,
        }
    }
}
