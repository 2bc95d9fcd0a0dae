use crate::tools::ToolError;
use crate::transport::TransportError;
use thiserror::Error;

/// Structured error context for configuration and runtime failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "config.endpoint")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "config_loader", "chat_client")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the chat client.
///
/// Only request, abort, transport and configuration failures ever leave
/// `stream_chat_completion` / `chat_with_tools`. Tool-level and frame-level
/// faults are absorbed into tool-result content or skipped.
#[derive(Debug, Error)]
pub enum Error {
    /// The completion endpoint answered with a non-2xx status.
    #[error("{message}")]
    Request { status: u16, message: String },

    /// The caller cancelled the request or the stream.
    #[error("Request aborted")]
    Aborted,

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// True when the error was caused by caller-initiated cancellation.
    ///
    /// UIs use this to suppress error banners on intentional stops.
    pub fn is_abort(&self) -> bool {
        matches!(self, Error::Aborted)
    }

    /// HTTP status of a rejected request, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Request { status, .. } => Some(*status),
            Error::Transport(TransportError::Http(e)) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }
}
