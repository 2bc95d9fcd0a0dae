//! # Types Module
//!
//! Wire-level types shared by the client, the SSE decoder and the tool layer.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | Chat message with role, optional content and tool linkage |
//! | [`ToolDefinition`] | Tool advertised to the model |
//! | [`ToolCall`] | Function call requested by the model |
//! | [`ToolCallDelta`] | One streamed fragment of a tool call |
//! | [`ToolResult`] | Answer to one tool call |
//! | [`SseEvent`] | Decoded stream event |
//!
//! ## Example
//!
//! ```rust
//! use contract_chat::types::{FunctionDefinition, Message, ToolDefinition};
//!
//! let system = Message::system("You help edit data contracts");
//! let user = Message::user("Which fields are required?");
//!
//! let tool = ToolDefinition::function(FunctionDefinition::new(
//!     "read_document",
//!     "Return the current contract document",
//!     serde_json::json!({"type": "object", "properties": {}}),
//! ));
//! assert_eq!(tool.name(), "read_document");
//! ```

pub mod events;
pub mod message;
pub mod tool;

pub use events::SseEvent;
pub use message::{Message, MessageRole};
pub use tool::{
    FunctionCall, FunctionDefinition, ToolCall, ToolCallDelta, ToolDefinition, ToolResult,
};
