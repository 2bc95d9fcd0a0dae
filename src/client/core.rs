use std::sync::Arc;

use super::cancel::CancelHandle;
use super::config::{CompletionConfig, CompletionConfigOverrides};
use super::observer::{noop_observer, ChatObserver};
use crate::tools::{ExecutionMode, ToolContext, ToolRegistry};
use crate::transport::HttpTransport;
use crate::types::{Message, ToolCall, ToolDefinition};

/// Default round budget of [`ChatClient::chat_with_tools`].
pub const DEFAULT_MAX_TOOL_ROUNDS: u32 = 5;

/// Streaming chat-completion client with local tool execution.
///
/// Cheap to share behind an `Arc`; every call takes `&self`.
pub struct ChatClient {
    pub(crate) config: CompletionConfig,
    pub(crate) transport: Arc<HttpTransport>,
    pub(crate) registry: Arc<ToolRegistry>,
}

impl ChatClient {
    pub fn builder() -> super::builder::ChatClientBuilder {
        super::builder::ChatClientBuilder::new()
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    /// The registry whose tools are advertised and executed.
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }
}

/// Result of one streamed completion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionOutput {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: Option<String>,
}

impl CompletionOutput {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Per-call options of [`ChatClient::stream_chat_completion`].
#[derive(Clone, Default)]
pub struct StreamOptions {
    /// Tools advertised in addition to the registry's.
    pub tools: Vec<ToolDefinition>,
    pub overrides: CompletionConfigOverrides,
    pub cancel: Option<CancelHandle>,
    pub observer: Option<Arc<dyn ChatObserver>>,
}

impl StreamOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn overrides(mut self, overrides: CompletionConfigOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn ChatObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub(crate) fn observer_or_noop(&self) -> Arc<dyn ChatObserver> {
        self.observer.clone().unwrap_or_else(noop_observer)
    }
}

/// Options of [`ChatClient::chat_with_tools`].
#[derive(Clone)]
pub struct ChatOptions {
    pub stream: StreamOptions,
    /// Handed to every tool handler.
    pub context: ToolContext,
    /// Upper bound on completion round-trips; values below 1 count as 1.
    pub max_tool_rounds: u32,
    pub execution_mode: ExecutionMode,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            stream: StreamOptions::default(),
            context: ToolContext::default(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            execution_mode: ExecutionMode::Sequential,
        }
    }
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.stream.tools = tools;
        self
    }

    pub fn overrides(mut self, overrides: CompletionConfigOverrides) -> Self {
        self.stream.overrides = overrides;
        self
    }

    pub fn cancel(mut self, cancel: CancelHandle) -> Self {
        self.stream.cancel = Some(cancel);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn ChatObserver>) -> Self {
        self.stream.observer = Some(observer);
        self
    }

    pub fn context(mut self, context: ToolContext) -> Self {
        self.context = context;
        self
    }

    pub fn max_tool_rounds(mut self, rounds: u32) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.execution_mode = mode;
        self
    }
}

/// Why the conversation loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatStop {
    /// The model answered without requesting tools.
    Completed,
    /// The round budget ran out while the model was still calling tools.
    RoundLimit,
}

/// Final state of a [`ChatClient::chat_with_tools`] run.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatOutcome {
    /// Prose of the last round only.
    pub content: String,
    /// Every tool call issued, across all rounds.
    pub tool_calls: Vec<ToolCall>,
    /// Input transcript plus the assistant tool-call turns and tool results.
    /// The final assistant prose is not appended.
    pub messages: Vec<Message>,
    /// Completion round-trips performed.
    pub rounds: u32,
    pub stop: ChatStop,
}
