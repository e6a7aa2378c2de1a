//! Defines the WebSocket message protocol between the ConversationRelay
//! transport and this service. One JSON object per text frame.

use serde::{Deserialize, Serialize};

/// Events sent from the relay to the server.
#[derive(Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum InboundMessage {
    /// Binds the channel to a call. This must be the first event.
    #[serde(rename = "setup")]
    Setup {
        #[serde(rename = "callSid")]
        call_sid: String,
    },
    /// A transcribed user utterance.
    #[serde(rename = "prompt")]
    Prompt {
        #[serde(rename = "voicePrompt")]
        voice_prompt: String,
    },
    /// The caller started speaking over the assistant; carries the exact
    /// text the caller heard before interrupting.
    #[serde(rename = "interrupt")]
    Interrupt {
        #[serde(rename = "utteranceUntilInterrupt")]
        utterance_until_interrupt: String,
    },
    /// An error reported by the relay itself.
    #[serde(rename = "error")]
    Error { description: String },
    /// Any event type this service does not recognize. Logged and ignored.
    #[serde(other)]
    Unknown,
}

/// Events sent from the server to the relay.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundMessage {
    /// One reply fragment, or the terminal marker (`token` empty,
    /// `last` true) closing a prompt cycle.
    Text { token: String, last: bool },
}
