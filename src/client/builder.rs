use std::sync::Arc;

use super::config::{CompletionConfig, CompletionConfigOverrides};
use super::core::ChatClient;
use crate::tools::ToolRegistry;
use crate::transport::HttpTransport;
use crate::Result;

/// Builder for [`ChatClient`].
///
/// Configuration layers, lowest first: built-in defaults, `AI_CHAT_*`
/// environment variables (opt-in via [`from_env`](Self::from_env)), then
/// explicit overrides.
pub struct ChatClientBuilder {
    from_env: bool,
    overrides: Vec<CompletionConfigOverrides>,
    registry: Option<Arc<ToolRegistry>>,
    http_client: Option<reqwest::Client>,
}

impl ChatClientBuilder {
    pub fn new() -> Self {
        Self {
            from_env: false,
            overrides: Vec::new(),
            registry: None,
            http_client: None,
        }
    }

    /// Layer the `AI_CHAT_*` environment variables over the defaults.
    pub fn from_env(mut self) -> Self {
        self.from_env = true;
        self
    }

    /// Merge `overrides` over whatever was configured before.
    pub fn overrides(mut self, overrides: CompletionConfigOverrides) -> Self {
        self.overrides.push(overrides);
        self
    }

    pub fn endpoint(self, endpoint: impl Into<String>) -> Self {
        self.overrides(CompletionConfigOverrides::new().endpoint(endpoint))
    }

    pub fn api_key(self, key: impl Into<String>) -> Self {
        self.overrides(CompletionConfigOverrides::new().api_key(key))
    }

    pub fn model(self, model: impl Into<String>) -> Self {
        self.overrides(CompletionConfigOverrides::new().model(model))
    }

    /// Use a dedicated registry instead of [`ToolRegistry::global`].
    pub fn registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Reuse an existing `reqwest` client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn build(self) -> Result<ChatClient> {
        let mut config = if self.from_env {
            CompletionConfig::from_env()?
        } else {
            CompletionConfig::default()
        };
        for overrides in &self.overrides {
            config = config.merged(overrides);
        }
        config.validate()?;

        let transport = match self.http_client {
            Some(client) => HttpTransport::with_client(client),
            None => HttpTransport::new()?,
        };

        tracing::debug!(endpoint = %config.endpoint, model = %config.model, "chat client built");

        Ok(ChatClient {
            config,
            transport: Arc::new(transport),
            registry: self.registry.unwrap_or_else(ToolRegistry::global),
        })
    }
}

impl Default for ChatClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
