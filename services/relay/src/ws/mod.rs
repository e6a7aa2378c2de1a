//! WebSocket Session Handling
//!
//! This module contains the core logic for relaying live voice calls over
//! WebSockets. It is structured into submodules for clarity:
//!
//! - `protocol`: Defines the JSON-based message format exchanged with the
//!   ConversationRelay transport.
//! - `session`: Manages the connection lifecycle, from the setup handshake
//!   to teardown.
//! - `dispatch`: Processes one call's events serially, in arrival order.
//! - `stream`: Streams the assistant reply back token by token.

mod dispatch;
pub mod protocol;
pub mod session;
mod stream;

pub use session::ws_handler;
