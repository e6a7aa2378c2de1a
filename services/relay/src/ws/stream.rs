//! Streaming of Assistant Replies
//!
//! Drives the completion backend for one prompt, forwarding each fragment to
//! the outbound channel the moment it arrives and accumulating the full
//! reply for history storage.

use super::protocol::OutboundMessage;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tracing::{error, warn};
use voicerelay_core::{convo::Turn, llm_client::CompletionClient};

/// Fixed system instruction for every completion. The output is converted
/// to speech, so the model is told to avoid anything a TTS engine would
/// stumble over.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant. This conversation is being translated to voice, so answer carefully. When you respond, please spell out all numbers, for example twenty not 20. Do not include emojis in your responses. Do not include bullet points, asterisks, or special symbols.";

/// Streams one assistant reply for the given history.
///
/// Fragments are forwarded in generation order with no batching. The
/// terminal marker is always attempted, even after a mid-flight backend
/// failure, so the relay is never left waiting for the end of a reply.
/// Returns the accumulated reply text; on failure this is the partial text
/// already delivered, never silently dropped and never retried.
pub(crate) async fn stream_reply(
    llm: &dyn CompletionClient,
    history: &[Turn],
    out: &mpsc::Sender<OutboundMessage>,
) -> String {
    let mut reply = String::new();

    match llm.stream_completion(SYSTEM_PROMPT, history).await {
        Ok(mut fragments) => {
            while let Some(result) = fragments.next().await {
                match result {
                    Ok(token) => {
                        let outbound = OutboundMessage::Text {
                            token: token.clone(),
                            last: false,
                        };
                        if out.send(outbound).await.is_err() {
                            warn!("outbound channel closed mid-reply");
                            break;
                        }
                        reply.push_str(&token);
                    }
                    Err(e) => {
                        // The partial reply reflects what was already sent
                        // to the caller, so it is kept.
                        error!(error = %e, "completion stream failed mid-reply");
                        break;
                    }
                }
            }
        }
        Err(e) => error!(error = %e, "failed to open completion stream"),
    }

    let terminal = OutboundMessage::Text {
        token: String::new(),
        last: true,
    };
    if out.send(terminal).await.is_err() {
        warn!("outbound channel closed before terminal marker");
    }

    reply
}
