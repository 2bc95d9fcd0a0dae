//! Streaming decoder for chat-completion SSE (Bytes -> SseEvent)
//!
//! Frames are newline-delimited `data: <json>` lines. Chunk boundaries carry
//! no meaning: the trailing, possibly incomplete line is buffered until the
//! next chunk arrives. Lines are decoded as UTF-8 only once complete, so a
//! multi-byte character split across chunks is reassembled intact.

use std::collections::VecDeque;

use bytes::Bytes;
use futures::{stream, StreamExt};
use serde::Deserialize;
use tracing::debug;

use super::FrameParseError;
use crate::types::{SseEvent, ToolCallDelta};
use crate::BoxStream;

const DONE_SIGNAL: &str = "[DONE]";

#[derive(Debug, Default, Deserialize)]
struct ChunkFrame {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ChunkToolCall>>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkToolCall {
    #[serde(default)]
    index: Option<u32>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<ChunkFunction>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkFunction {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

/// Parse one complete SSE line into zero or more events.
///
/// Blank lines, comments, non-`data` fields and the `[DONE]` sentinel yield
/// no events. A frame with both content and a finish reason yields both, in
/// the order content, tool calls, finish.
pub fn parse_line(line: &str) -> Result<Vec<SseEvent>, FrameParseError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with(':') {
        return Ok(Vec::new());
    }

    let Some(payload) = trimmed.strip_prefix("data:") else {
        return Ok(Vec::new());
    };
    let payload = payload.trim_start();
    if payload == DONE_SIGNAL {
        return Ok(Vec::new());
    }

    let frame: ChunkFrame = serde_json::from_str(payload)?;
    let Some(choice) = frame.choices.into_iter().next() else {
        return Ok(Vec::new());
    };

    let mut events = Vec::with_capacity(2);
    if let Some(delta) = choice.delta {
        if let Some(content) = delta.content.filter(|c| !c.is_empty()) {
            events.push(SseEvent::ContentDelta { content });
        }

        let deltas: Vec<ToolCallDelta> = delta
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(position, tc)| {
                let function = tc.function.unwrap_or_default();
                ToolCallDelta {
                    index: tc.index.unwrap_or(position as u32),
                    id: tc.id,
                    name: function.name,
                    arguments: function.arguments,
                }
            })
            .collect();
        if !deltas.is_empty() {
            events.push(SseEvent::ToolCallDelta { deltas });
        }
    }

    if let Some(reason) = choice.finish_reason.filter(|r| !r.is_empty()) {
        events.push(SseEvent::Finish { reason });
    }

    Ok(events)
}

/// Incremental line-buffered SSE decoder.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    skipped: usize,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of bytes; returns the events of every line it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = self.buffer[consumed..].iter().position(|b| *b == b'\n') {
            let end = consumed + offset;
            let line = String::from_utf8_lossy(&self.buffer[consumed..end]).into_owned();
            self.handle_line(&line, &mut events);
            consumed = end + 1;
        }
        if consumed > 0 {
            self.buffer.drain(..consumed);
        }
        events
    }

    /// Flush the final unterminated line at end of input.
    pub fn finish(&mut self) -> Vec<SseEvent> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest).into_owned();
            self.handle_line(&line, &mut events);
        }
        events
    }

    /// Number of lines dropped because their JSON payload was malformed.
    pub fn skipped_frames(&self) -> usize {
        self.skipped
    }

    fn handle_line(&mut self, line: &str, out: &mut Vec<SseEvent>) {
        match parse_line(line) {
            Ok(events) => out.extend(events),
            Err(e) => {
                self.skipped += 1;
                debug!(error = %e, line = line.trim(), "skipping malformed SSE frame");
            }
        }
    }
}

/// Decode a byte stream into SSE events.
///
/// Transport errors are forwarded as-is; malformed frames are skipped.
pub fn decode_sse(input: BoxStream<'static, Bytes>) -> BoxStream<'static, SseEvent> {
    struct State {
        input: BoxStream<'static, Bytes>,
        decoder: SseDecoder,
        pending: VecDeque<SseEvent>,
        exhausted: bool,
    }

    let state = State {
        input,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        exhausted: false,
    };

    let stream = stream::unfold(state, |mut st| async move {
        loop {
            if let Some(ev) = st.pending.pop_front() {
                return Some((Ok(ev), st));
            }
            if st.exhausted {
                return None;
            }

            match st.input.next().await {
                Some(Ok(bytes)) => {
                    let events = st.decoder.feed(&bytes);
                    st.pending.extend(events);
                }
                Some(Err(e)) => {
                    st.exhausted = true;
                    return Some((Err(e), st));
                }
                None => {
                    st.exhausted = true;
                    let events = st.decoder.finish();
                    st.pending.extend(events);
                }
            }
        }
    });

    Box::pin(stream)
}
