//! Server-Sent Events (SSE) streaming parser.
//!
//! Gemini streams `streamGenerateContent?alt=sse` responses as SSE.
//! This module turns any buffered byte source into a lazy stream of
//! events, so nothing is read until the consumer polls.

use futures_util::stream::{self, BoxStream, StreamExt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio_util::io::StreamReader;

use crate::AiError;

/// A single SSE event parsed from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// The event type, when the server sent an `event:` field.
    pub event: Option<String>,
    /// The event data (JSON string).
    pub data: String,
}

struct SseState<R> {
    lines: Lines<R>,
    event: Option<String>,
    data: String,
    /// Whether the pending event has any `data:` field, even an empty one.
    has_data: bool,
    done: bool,
}

impl<R> SseState<R> {
    fn take_event(&mut self) -> Option<SseEvent> {
        if !self.has_data {
            self.event = None;
            return None;
        }
        self.has_data = false;
        Some(SseEvent {
            event: self.event.take(),
            data: std::mem::take(&mut self.data),
        })
    }
}

/// Parse SSE events lazily from a buffered reader.
///
/// Read errors end the stream after being yielded once.
pub fn sse_events<R>(reader: R) -> BoxStream<'static, Result<SseEvent, AiError>>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let state = SseState {
        lines: reader.lines(),
        event: None,
        data: String::new(),
        has_data: false,
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.done {
            return None;
        }

        loop {
            let line = match state.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    state.done = true;
                    // Flush any remaining event
                    let event = state.take_event()?;
                    return Some((Ok(event), state));
                }
                Err(e) => {
                    state.done = true;
                    return Some((Err(AiError::NetworkError(e.to_string())), state));
                }
            };

            if line.is_empty() {
                // Empty line = end of event
                if let Some(event) = state.take_event() {
                    return Some((Ok(event), state));
                }
                continue;
            }

            if let Some(event_type) = line.strip_prefix("event:") {
                state.event = Some(event_type.trim_start().to_string());
            } else if let Some(data) = line.strip_prefix("data:") {
                if state.has_data {
                    state.data.push('\n');
                }
                state.data.push_str(data.strip_prefix(' ').unwrap_or(data));
                state.has_data = true;
            }
            // Ignore other fields (id:, retry:, comments)
        }
    })
    .boxed()
}

/// Parse SSE events from a reqwest response body.
pub fn response_events(response: reqwest::Response) -> BoxStream<'static, Result<SseEvent, AiError>> {
    let byte_stream = response
        .bytes_stream()
        .map(|result| result.map_err(std::io::Error::other));
    sse_events(BufReader::new(StreamReader::new(byte_stream)))
}
