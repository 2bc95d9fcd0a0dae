//! # Streaming Pipeline
//!
//! Turns the raw response body of a streaming chat completion into typed
//! events.
//!
//! ```text
//! Raw Bytes → SseDecoder → SseEvent → ToolCallAssembler / content buffer
//!     │            │            │
//!   HTTP      line buffer   ContentDelta,
//!             + JSON        ToolCallDelta,
//!                           Finish
//! ```
//!
//! Frame-level faults never surface to callers: a malformed line is reported
//! as a [`FrameParseError`] by [`decode::parse_line`] and the decoder skips
//! it.

pub mod decode;

pub use decode::{decode_sse, parse_line, SseDecoder};

/// Reason a single SSE line could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum FrameParseError {
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}
