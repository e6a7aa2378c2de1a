//! Server-Sent Events Parsing
//!
//! A small stream adapter that turns a raw byte stream into assembled SSE
//! events. Handles byte buffering with UTF-8 conversion, `\n` and `\r\n`
//! line endings, multi-line `data:` assembly up to the blank-line event
//! boundary, and comment lines. Reconnection is handled at a higher level,
//! so none of the retry machinery of a full SSE client is needed here.

use bytes::{Bytes, BytesMut};
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A parsed SSE event: the joined `data:` payload plus the optional
/// `event:` name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub data: String,
    pub event: Option<String>,
}

#[derive(Default)]
struct EventBuilder {
    data_lines: Vec<String>,
    event: Option<String>,
}

impl EventBuilder {
    fn push_line(&mut self, line: &str) {
        if let Some(data) = line.strip_prefix("data:") {
            self.data_lines
                .push(data.strip_prefix(' ').unwrap_or(data).to_string());
        } else if let Some(event) = line.strip_prefix("event:") {
            self.event = Some(event.strip_prefix(' ').unwrap_or(event).to_string());
        }
        // `id:`, `retry:`, comments, and unknown fields are ignored.
    }

    fn has_content(&self) -> bool {
        !self.data_lines.is_empty() || self.event.is_some()
    }

    fn build(&mut self) -> SseEvent {
        SseEvent {
            data: std::mem::take(&mut self.data_lines).join("\n"),
            event: self.event.take(),
        }
    }
}

/// Adapts a stream of byte chunks into a stream of [`SseEvent`]s.
pub struct SseEventStream<S> {
    inner: S,
    /// Raw bytes not yet decoded: at most one incomplete trailing character.
    pending: BytesMut,
    buffer: String,
    builder: EventBuilder,
    done: bool,
}

impl<S> SseEventStream<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            pending: BytesMut::new(),
            buffer: String::new(),
            builder: EventBuilder::default(),
            done: false,
        }
    }

    /// Appends a chunk, decoding only the valid UTF-8 prefix. Chunk
    /// boundaries are byte boundaries, so a chunk can end mid-character;
    /// the incomplete suffix is retained for the next chunk. A genuinely
    /// invalid sequence is skipped rather than stalling the stream.
    fn push_chunk(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    self.pending.clear();
                    return;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    self.buffer
                        .push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    let _ = self.pending.split_to(valid);
                    match e.error_len() {
                        Some(len) => {
                            let _ = self.pending.split_to(len);
                        }
                        // Incomplete trailing character; wait for more bytes.
                        None => return,
                    }
                }
            }
        }
    }

    /// Pops the next complete line from the buffer, stripping the trailing
    /// `\r` of a CRLF ending.
    fn next_line(&mut self) -> Option<String> {
        let line_end = self.buffer.find('\n')?;
        let mut line = self.buffer[..line_end].to_string();
        self.buffer.drain(..=line_end);
        if line.ends_with('\r') {
            line.pop();
        }
        Some(line)
    }
}

impl<S, E> Stream for SseEventStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<SseEvent, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }

        loop {
            while let Some(line) = self.next_line() {
                if line.is_empty() {
                    if self.builder.has_content() {
                        return Poll::Ready(Some(Ok(self.builder.build())));
                    }
                } else {
                    self.builder.push_line(&line);
                }
            }

            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    self.push_chunk(&bytes);
                }
                Poll::Ready(Some(Err(e))) => {
                    // The inner stream must not be polled again after an
                    // error.
                    self.done = true;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    self.done = true;
                    if !self.pending.is_empty() {
                        let rest = self.pending.split();
                        self.buffer.push_str(&String::from_utf8_lossy(&rest));
                    }
                    if !self.buffer.is_empty() {
                        let line = std::mem::take(&mut self.buffer);
                        self.builder.push_line(&line);
                    }
                    if self.builder.has_content() {
                        return Poll::Ready(Some(Ok(self.builder.build())));
                    }
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use futures::stream;

    fn chunks(parts: &[&str]) -> impl Stream<Item = Result<Bytes, std::io::Error>> {
        stream::iter(
            parts
                .iter()
                .map(|p| Ok(Bytes::copy_from_slice(p.as_bytes())))
                .collect::<Vec<_>>(),
        )
    }

    async fn collect(parts: &[&str]) -> Vec<SseEvent> {
        SseEventStream::new(chunks(parts))
            .map(|r| r.unwrap())
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_single_event() {
        let events = collect(&["data: {\"a\":1}\n\n"]).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "{\"a\":1}");
        assert_eq!(events[0].event, None);
    }

    #[tokio::test]
    async fn test_event_split_across_chunks() {
        let events = collect(&["data: hel", "lo\n", "\n"]).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "hello");
    }

    #[tokio::test]
    async fn test_crlf_line_endings() {
        let events = collect(&["event: ping\r\ndata: {}\r\n\r\n"]).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event.as_deref(), Some("ping"));
        assert_eq!(events[0].data, "{}");
    }

    #[tokio::test]
    async fn test_multi_line_data_joined_with_newline() {
        let events = collect(&["data: one\ndata: two\n\n"]).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "one\ntwo");
    }

    #[tokio::test]
    async fn test_comments_and_blank_lines_skipped() {
        let events = collect(&[": keep-alive\n\ndata: x\n\n"]).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "x");
    }

    #[tokio::test]
    async fn test_multiple_events() {
        let events = collect(&["data: 1\n\ndata: 2\n\ndata: 3\n\n"]).await;
        assert_eq!(
            events.iter().map(|e| e.data.as_str()).collect::<Vec<_>>(),
            vec!["1", "2", "3"]
        );
    }

    #[tokio::test]
    async fn test_trailing_event_without_final_blank_line() {
        let events = collect(&["data: last"]).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "last");
    }

    async fn collect_raw(frames: Vec<Result<Bytes, std::io::Error>>) -> Vec<SseEvent> {
        SseEventStream::new(stream::iter(frames))
            .map(|r| r.unwrap())
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_multibyte_char_split_across_chunks() {
        let events = collect_raw(vec![
            Ok(Bytes::from_static(b"data: caf\xC3")),
            Ok(Bytes::from_static(b"\xA9\n\n")),
        ])
        .await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "caf\u{e9}");
    }

    #[tokio::test]
    async fn test_multibyte_char_split_across_three_chunks() {
        let events = collect_raw(vec![
            Ok(Bytes::from_static(b"data: 5\xE2")),
            Ok(Bytes::from_static(b"\x82")),
            Ok(Bytes::from_static(b"\xAC\n\n")),
        ])
        .await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "5\u{20ac}");
    }

    #[tokio::test]
    async fn test_invalid_byte_skipped_without_losing_text() {
        let events = collect_raw(vec![Ok(Bytes::from_static(b"data: a\xFFb\n\n"))]).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "ab");
    }

    #[tokio::test]
    async fn test_inner_error_ends_stream() {
        let frames: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"data: first\n\n")),
            Err(std::io::Error::other("connection reset")),
            Ok(Bytes::from_static(b"data: after\n\n")),
        ];
        let mut events = SseEventStream::new(stream::iter(frames));

        assert_eq!(events.next().await.unwrap().unwrap().data, "first");
        assert!(events.next().await.unwrap().is_err());
        // The error terminates the adapter; the inner stream is not polled
        // again.
        assert!(events.next().await.is_none());
    }
}
