//! Streaming chat client.
//!
//! Keep the public surface small: [`ChatClient::stream_chat_completion`] for a
//! single streamed completion, [`ChatClient::chat_with_tools`] for the
//! multi-round tool loop. Implementation details are split into submodules
//! under `src/client/`.

pub mod builder;
pub mod cancel;
pub mod config;
mod conversation;
pub mod core;
pub mod observer;
mod stream;

pub use builder::ChatClientBuilder;
pub use cancel::CancelHandle;
pub use config::{AuthHeader, CompletionConfig, CompletionConfigOverrides};
pub use self::core::{
    ChatClient, ChatOptions, ChatOutcome, ChatStop, CompletionOutput, StreamOptions,
    DEFAULT_MAX_TOOL_ROUNDS,
};
pub use observer::{ChatObserver, NoopObserver};
