//! Completion request configuration.
//!
//! A [`CompletionConfig`] is always complete: it starts from built-in
//! defaults and partial [`CompletionConfigOverrides`] are merged over it,
//! either per client or per call. Overrides can come from code, the
//! environment, or a YAML file.

use std::collections::BTreeMap;
use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, ErrorContext, Result};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Which header carries the API key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthHeader {
    /// `Authorization: Bearer <key>`
    #[default]
    Bearer,
    /// `api-key: <key>` (Azure-style gateways)
    #[serde(alias = "apikey", alias = "api_key")]
    ApiKey,
}

impl std::str::FromStr for AuthHeader {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bearer" => Ok(AuthHeader::Bearer),
            "api-key" | "api_key" | "apikey" => Ok(AuthHeader::ApiKey),
            other => Err(Error::configuration_with_context(
                format!("unknown auth header mode '{other}'"),
                ErrorContext::new()
                    .with_field_path("config.auth_header")
                    .with_details("expected 'bearer' or 'api-key'"),
            )),
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub auth_header: AuthHeader,
    /// Extra headers, applied after auth.
    pub headers: BTreeMap<String, String>,
    /// Advertise tools to the model.
    pub use_tools: bool,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            auth_header: AuthHeader::Bearer,
            headers: BTreeMap::new(),
            use_tools: true,
        }
    }
}

impl std::fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("auth_header", &self.auth_header)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("use_tools", &self.use_tools)
            .finish()
    }
}

impl CompletionConfig {
    /// Defaults overlaid with the `AI_CHAT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self::default().merged(&CompletionConfigOverrides::from_env()?))
    }

    /// A copy of `self` with every field set in `overrides` replaced.
    /// Header maps are merged key by key.
    pub fn merged(&self, overrides: &CompletionConfigOverrides) -> Self {
        let mut out = self.clone();
        if let Some(v) = &overrides.endpoint {
            out.endpoint = v.clone();
        }
        if let Some(v) = &overrides.api_key {
            out.api_key = Some(v.clone());
        }
        if let Some(v) = &overrides.model {
            out.model = v.clone();
        }
        if let Some(v) = overrides.max_tokens {
            out.max_tokens = v;
        }
        if let Some(v) = overrides.temperature {
            out.temperature = v;
        }
        if let Some(v) = overrides.auth_header {
            out.auth_header = v;
        }
        if let Some(headers) = &overrides.headers {
            out.headers
                .extend(headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        if let Some(v) = overrides.use_tools {
            out.use_tools = v;
        }
        out
    }

    /// Check the fields that would otherwise fail late, at request time.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.endpoint).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid endpoint '{}'", self.endpoint),
                ErrorContext::new()
                    .with_field_path("config.endpoint")
                    .with_details(e.to_string())
                    .with_source("completion_config"),
            )
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::configuration_with_context(
                format!("unsupported endpoint scheme '{}'", url.scheme()),
                ErrorContext::new()
                    .with_field_path("config.endpoint")
                    .with_source("completion_config"),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(Error::configuration_with_context(
                "model must not be empty",
                ErrorContext::new()
                    .with_field_path("config.model")
                    .with_source("completion_config"),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::configuration_with_context(
                format!("temperature {} is outside 0.0..=2.0", self.temperature),
                ErrorContext::new()
                    .with_field_path("config.temperature")
                    .with_source("completion_config"),
            ));
        }
        Ok(())
    }
}

/// Partial configuration; unset fields keep the value they are merged over.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompletionConfigOverrides {
    pub endpoint: Option<String>,
    #[serde(alias = "apiKey")]
    pub api_key: Option<String>,
    pub model: Option<String>,
    #[serde(alias = "maxTokens")]
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    #[serde(alias = "authHeader")]
    pub auth_header: Option<AuthHeader>,
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(alias = "useTools")]
    pub use_tools: Option<bool>,
}

impl CompletionConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn temperature(mut self, temp: f64) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn auth_header(mut self, auth: AuthHeader) -> Self {
        self.auth_header = Some(auth);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn use_tools(mut self, enabled: bool) -> Self {
        self.use_tools = Some(enabled);
        self
    }

    /// Read the `AI_CHAT_*` environment variables.
    ///
    /// - `AI_CHAT_ENDPOINT`, `AI_CHAT_MODEL`
    /// - `AI_CHAT_API_KEY` (falls back to `OPENAI_API_KEY`)
    /// - `AI_CHAT_MAX_TOKENS`, `AI_CHAT_TEMPERATURE`
    /// - `AI_CHAT_AUTH_HEADER` (`bearer` | `api-key`)
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());

        let parse_num = |name: &str| -> Result<Option<f64>> {
            match var(name) {
                None => Ok(None),
                Some(raw) => raw.trim().parse::<f64>().map(Some).map_err(|e| {
                    Error::configuration_with_context(
                        format!("{name} is not a number"),
                        ErrorContext::new()
                            .with_field_path(name)
                            .with_details(e.to_string())
                            .with_source("env"),
                    )
                }),
            }
        };

        Ok(Self {
            endpoint: var("AI_CHAT_ENDPOINT"),
            api_key: var("AI_CHAT_API_KEY").or_else(|| var("OPENAI_API_KEY")),
            model: var("AI_CHAT_MODEL"),
            max_tokens: parse_num("AI_CHAT_MAX_TOKENS")?.map(|n| n.max(1.0) as u32),
            temperature: parse_num("AI_CHAT_TEMPERATURE")?,
            auth_header: var("AI_CHAT_AUTH_HEADER")
                .map(|v| v.parse::<AuthHeader>())
                .transpose()?,
            headers: None,
            use_tools: None,
        })
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| {
            Error::configuration_with_context(
                "invalid configuration YAML",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("config_loader"),
            )
        })
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                format!("cannot read configuration file {}", path.display()),
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("config_loader"),
            )
        })?;
        Self::from_yaml_str(&raw)
    }
}
