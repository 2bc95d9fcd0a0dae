//! Observer hooks for UI feedback.
//!
//! Observers are notified, never consulted: the orchestrator behaves the same
//! with or without one. Hooks run inline on the streaming task, so they
//! should return quickly (forward to a channel for heavy work).

use std::sync::Arc;

use super::core::CompletionOutput;
use crate::types::tool::{ToolCall, ToolCallDelta, ToolResult};

pub trait ChatObserver: Send + Sync {
    /// A content chunk arrived; `accumulated` is all text of this round so far.
    fn on_content(&self, _chunk: &str, _accumulated: &str) {}

    /// Tool-call fragments arrived; `snapshot` is every call of this round so far.
    fn on_tool_call_delta(&self, _deltas: &[ToolCallDelta], _snapshot: &[ToolCall]) {}

    /// The server reported a finish reason.
    fn on_finish(&self, _reason: &str, _output: &CompletionOutput) {}

    /// The model requested tools; execution is about to start.
    fn on_tool_calls_start(&self, _calls: &[ToolCall]) {}

    /// Every tool call of the round has a result.
    fn on_tool_calls_complete(&self, _calls: &[ToolCall], _results: &[ToolResult]) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ChatObserver for NoopObserver {}

pub fn noop_observer() -> Arc<dyn ChatObserver> {
    Arc::new(NoopObserver)
}
