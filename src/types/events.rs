//! Events decoded from a chat-completion SSE stream

use serde::{Deserialize, Serialize};

use super::tool::ToolCallDelta;

/// One decoded stream event, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum SseEvent {
    /// More assistant text.
    #[serde(rename = "ContentDelta")]
    ContentDelta { content: String },

    /// Fragments of one or more tool calls.
    #[serde(rename = "ToolCallDelta")]
    ToolCallDelta { deltas: Vec<ToolCallDelta> },

    /// The turn is complete.
    #[serde(rename = "Finish")]
    Finish { reason: String },
}
