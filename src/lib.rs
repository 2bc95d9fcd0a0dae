//! # contract-chat
//!
//! Streaming, tool-augmented chat client behind the data-contract editor's
//! assistant panel.
//!
//! ## Overview
//!
//! The client talks to any OpenAI-compatible chat-completion endpoint,
//! decodes its server-sent-event stream incrementally, assembles function
//! calls from argument fragments, runs the requested tools locally and feeds
//! their results back until the model answers without calling a tool or a
//! round budget runs out.
//!
//! ## Key Features
//!
//! - **Streaming-first**: content is surfaced chunk by chunk through a
//!   [`ChatObserver`](client::ChatObserver)
//! - **Tool registry**: register async handlers once, share them across clients
//! - **Never-throw tool execution**: every tool call gets exactly one result,
//!   failures become `{"error": ...}` content the model can react to
//! - **Cancellation**: a [`CancelHandle`] aborts the request or stream with
//!   a distinguishable [`Error::Aborted`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use contract_chat::{ChatClient, ChatOptions, Message};
//! use contract_chat::tools::{tool_fn, ToolRegistry};
//! use contract_chat::types::FunctionDefinition;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> contract_chat::Result<()> {
//!     let registry = Arc::new(ToolRegistry::new());
//!     registry.register(
//!         "echo",
//!         FunctionDefinition::new("echo", "Echo the arguments", json!({"type": "object"})),
//!         tool_fn(|args, _ctx| async move { Ok(args) }),
//!     )?;
//!
//!     let client = ChatClient::builder()
//!         .from_env()
//!         .registry(registry)
//!         .build()?;
//!
//!     let outcome = client
//!         .chat_with_tools(&[Message::user("Echo x=1")], &ChatOptions::new())
//!         .await?;
//!     println!("{}", outcome.content);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Client, configuration, conversation loop, observers |
//! | [`pipeline`] | SSE decoding |
//! | [`tools`] | Tool registry, handlers, batch executor |
//! | [`transport`] | HTTP transport and header construction |
//! | [`types`] | Wire types (messages, tool calls, events) |
//! | [`utils`] | Tool-call fragment assembly |

pub mod client;
pub mod pipeline;
pub mod tools;
pub mod transport;
pub mod types;
pub mod utils;

pub use client::{
    CancelHandle, ChatClient, ChatClientBuilder, ChatOptions, ChatOutcome, CompletionConfig,
    CompletionConfigOverrides, CompletionOutput, StreamOptions,
};
pub use tools::{ToolContext, ToolError, ToolRegistry};
pub use types::{
    events::SseEvent,
    message::{Message, MessageRole},
    tool::{ToolCall, ToolResult},
};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A specialized Result for pipeline operations
pub type PipeResult<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `PipeResult<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = PipeResult<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
