//! Voicerelay Core
//!
//! Domain logic for the voice relay, kept free of any web-server concerns:
//!
//! - `convo`: the conversation data model (roles and turns).
//! - `store`: the per-call session registry.
//! - `interrupt`: truncation of history after a caller interruption.
//! - `llm_client`: the streaming completion backend abstraction and its
//!   Anthropic implementation.
//! - `sse`: the server-sent-events parser used by the Anthropic client.

pub mod convo;
pub mod interrupt;
pub mod llm_client;
pub mod sse;
pub mod store;
