//! # Tools
//!
//! Local capabilities the model may call: the [`ToolRegistry`] catalog, the
//! [`ToolHandler`] seam, and the batch executor that answers every tool call
//! of a round.
//!
//! ```rust
//! use contract_chat::tools::{tool_fn, ToolContext, ToolRegistry};
//! use contract_chat::types::FunctionDefinition;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let registry = ToolRegistry::new();
//! registry.register(
//!     "read_document",
//!     FunctionDefinition::new("read_document", "Return the current document", json!({"type": "object"})),
//!     tool_fn(|_args, ctx| async move {
//!         Ok(json!(ctx.str_value("document").unwrap_or_default()))
//!     }),
//! )?;
//!
//! let ctx = ToolContext::new().with_value("document", "id: orders");
//! let out = registry.execute("read_document", json!({}), &ctx).await?;
//! assert_eq!(out, json!("id: orders"));
//! # Ok::<(), contract_chat::tools::ToolError>(())
//! # }).unwrap();
//! ```

pub mod context;
pub mod error;
pub mod executor;
pub mod registry;

pub use context::ToolContext;
pub use error::ToolError;
pub use executor::{execute_tool_calls, ExecutionMode};
pub use registry::ToolRegistry;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

/// Async tool implementation. The registry never owns tool-side resources;
/// whoever registers the handler does.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Value, context: ToolContext) -> Result<Value, ToolError>;
}

struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> ToolHandler for FnHandler<F>
where
    F: Fn(Value, ToolContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
{
    async fn call(&self, args: Value, context: ToolContext) -> Result<Value, ToolError> {
        (self.f)(args, context).await
    }
}

/// Wrap an async closure as a shareable handler.
pub fn tool_fn<F, Fut>(f: F) -> Arc<dyn ToolHandler>
where
    F: Fn(Value, ToolContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
{
    Arc::new(FnHandler { f })
}
