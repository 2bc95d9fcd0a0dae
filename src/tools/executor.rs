//! Batch execution of the tool calls of one round.
//!
//! Every call gets exactly one [`ToolResult`], in call order, whatever
//! happens to it: the endpoint rejects a transcript in which a tool call of
//! the previous assistant turn went unanswered.

use std::time::Instant;

use futures::{future, stream, StreamExt};
use serde_json::Value;
use tracing::{debug, warn};

use super::{ToolContext, ToolError, ToolRegistry};
use crate::types::tool::{ToolCall, ToolResult};

/// How the calls of one round are run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One after another, in call order.
    #[default]
    Sequential,
    /// All at once; results are still returned in call order.
    Concurrent,
}

/// Execute `calls` against `registry`, never failing.
///
/// - malformed arguments → `{"error": "Invalid JSON in tool arguments: ..."}`
/// - handler or lookup failure → `{"error": "<message>"}`
/// - string results pass through, other values are JSON-encoded
pub async fn execute_tool_calls(
    registry: &ToolRegistry,
    calls: &[ToolCall],
    context: &ToolContext,
    mode: ExecutionMode,
) -> Vec<ToolResult> {
    match mode {
        ExecutionMode::Concurrent if calls.len() > 1 => {
            future::join_all(calls.iter().map(|call| execute_one(registry, call, context))).await
        }
        _ => {
            stream::iter(calls)
                .then(|call| execute_one(registry, call, context))
                .collect()
                .await
        }
    }
}

async fn execute_one(registry: &ToolRegistry, call: &ToolCall, context: &ToolContext) -> ToolResult {
    let name = call.function.name.as_str();

    let args = match parse_arguments(&call.function.arguments) {
        Ok(args) => args,
        Err(e) => {
            warn!(tool = name, call_id = %call.id, error = %e, "rejecting tool call");
            return ToolResult::error(&call.id, name, e.to_string());
        }
    };

    let start = Instant::now();
    let outcome = registry.execute(name, args, context).await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(value) => {
            debug!(tool = name, call_id = %call.id, elapsed_ms, "tool call succeeded");
            ToolResult::new(&call.id, name, render_content(value))
        }
        Err(e) => {
            warn!(tool = name, call_id = %call.id, elapsed_ms, error = %e, "tool call failed");
            ToolResult::error(&call.id, name, e.to_string())
        }
    }
}

/// Empty argument strings stand for a call without parameters.
fn parse_arguments(raw: &str) -> Result<Value, ToolError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(trimmed).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

fn render_content(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
