//! TwiML Descriptor Handler
//!
//! Twilio fetches `/twiml` when a call comes in; the response tells the
//! ConversationRelay transport where to open its WebSocket and what welcome
//! line to speak before the first event arrives.

use crate::state::AppState;
use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};
use std::sync::Arc;

/// Spoken to the caller before any event reaches the relay.
pub const WELCOME_GREETING: &str =
    "Hello! I am an A I voice assistant. Ask me anything!";

pub async fn twiml(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/xml")],
        render_twiml(&state.config.ws_url()),
    )
}

fn render_twiml(ws_url: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Connect><ConversationRelay url=\"{}\" welcomeGreeting=\"{}\" /></Connect></Response>",
        ws_url, WELCOME_GREETING
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_twiml_points_at_relay() {
        let xml = render_twiml("wss://relay.example.com/ws");
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<ConversationRelay url=\"wss://relay.example.com/ws\""));
        assert!(xml.contains(&format!("welcomeGreeting=\"{}\"", WELCOME_GREETING)));
        assert!(xml.ends_with("</Connect></Response>"));
    }
}
