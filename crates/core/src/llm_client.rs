//! Streaming Completion Backend
//!
//! The relay treats the language-generation backend as an abstract provider
//! of ordered text fragments. [`CompletionClient`] is the seam; the shipped
//! implementation speaks Anthropic's native Messages API over HTTP with SSE
//! streaming.

use crate::convo::{Role, Turn};
use crate::sse::SseEventStream;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::pin::Pin;

/// Failures while opening or consuming a completion stream.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("completion API returned status {status}: {message}")]
    Api { status: u16, message: String },
}

/// An ordered, finite stream of assistant text fragments.
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<String, CompletionError>> + Send>>;

/// A streaming completion provider.
///
/// Given a system instruction and the full role-tagged history, yields the
/// assistant reply as a lazy sequence of fragments in generation order.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn stream_completion(
        &self,
        system_prompt: &str,
        history: &[Turn],
    ) -> Result<CompletionStream, CompletionError>;
}

/// Client for Anthropic's Messages API.
pub struct AnthropicClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub const API_VERSION: &'static str = "2023-06-01";

    pub fn new(
        http: reqwest::Client,
        base_url: String,
        api_key: String,
        model: String,
        max_tokens: u32,
    ) -> Self {
        Self {
            http,
            base_url,
            api_key,
            model,
            max_tokens,
        }
    }
}

#[async_trait]
impl CompletionClient for AnthropicClient {
    async fn stream_completion(
        &self,
        system_prompt: &str,
        history: &[Turn],
    ) -> Result<CompletionStream, CompletionError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = MessagesRequest::new(&self.model, self.max_tokens, system_prompt, history);

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", Self::API_VERSION)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(CompletionError::Api { status, message });
        }

        Ok(Box::pin(decode_fragments(Box::pin(
            response.bytes_stream(),
        ))))
    }
}

/// Decodes an SSE byte stream from the Messages API into text fragments.
///
/// Only `content_block_delta` events carrying a text delta yield fragments;
/// every other event type (message_start, ping, message_stop, ...) is
/// skipped, as are event payloads that fail to parse.
fn decode_fragments<S>(bytes: S) -> impl Stream<Item = Result<String, CompletionError>>
where
    S: Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Unpin,
{
    SseEventStream::new(bytes).filter_map(|result| async move {
        match result {
            Ok(event) => {
                if event.data.is_empty() {
                    return None;
                }
                match serde_json::from_str::<StreamEvent>(&event.data) {
                    Ok(StreamEvent::ContentBlockDelta { delta }) => {
                        delta.text.filter(|text| !text.is_empty()).map(Ok)
                    }
                    Ok(StreamEvent::Other) => None,
                    Err(e) => {
                        tracing::debug!(data = %event.data, error = %e, "skipping unparseable stream event");
                        None
                    }
                }
            }
            Err(e) => Some(Err(CompletionError::Http(e))),
        }
    })
}

// --- Wire Types ---

#[derive(serde::Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
}

#[derive(serde::Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> MessagesRequest<'a> {
    fn new(model: &'a str, max_tokens: u32, system: &'a str, history: &'a [Turn]) -> Self {
        let messages = history
            .iter()
            .map(|turn| WireMessage {
                role: match turn.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                content: &turn.content,
            })
            .collect();
        Self {
            model,
            max_tokens,
            system,
            messages,
            stream: true,
        }
    }
}

/// Streaming events from the Messages API. Only text deltas matter here.
#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    ContentBlockDelta { delta: Delta },
    #[serde(other)]
    Other,
}

#[derive(serde::Deserialize)]
struct Delta {
    #[serde(default)]
    text: Option<String>,
}
