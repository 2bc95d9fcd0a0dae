//! Tool-level errors. These are localized into tool-result content by the
//! executor and never abort a round.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid JSON in tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Invalid tool definition for '{name}': {reason}")]
    InvalidDefinition { name: String, reason: String },

    #[error("{0}")]
    Execution(String),
}

impl ToolError {
    /// Handler failure with a message the model will see.
    pub fn execution(msg: impl Into<String>) -> Self {
        ToolError::Execution(msg.into())
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(e: serde_json::Error) -> Self {
        ToolError::Execution(e.to_string())
    }
}

impl From<anyhow::Error> for ToolError {
    fn from(e: anyhow::Error) -> Self {
        ToolError::Execution(format!("{e:#}"))
    }
}
