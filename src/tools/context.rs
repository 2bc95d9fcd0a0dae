//! Host-supplied context handed to every tool handler.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

/// Opaque map the host application builds for its tools: plain JSON values
/// (e.g. the current document text) plus typed capabilities (e.g. a
/// validation runner). Cloning is cheap.
#[derive(Clone, Default)]
pub struct ToolContext {
    values: Arc<Map<String, Value>>,
    capabilities: Arc<HashMap<&'static str, Arc<dyn Any + Send + Sync>>>,
}

impl ToolContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Arc::make_mut(&mut self.values).insert(key.into(), value.into());
        self
    }

    /// Store a capability, keyed by its type.
    pub fn with_capability<T: Any + Send + Sync>(mut self, capability: Arc<T>) -> Self {
        Arc::make_mut(&mut self.capabilities).insert(type_name::<T>(), capability);
        self
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn str_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn capability<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.capabilities
            .get(type_name::<T>())
            .cloned()
            .and_then(|c| c.downcast::<T>().ok())
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}

impl fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolContext")
            .field("values", &self.values.keys().collect::<Vec<_>>())
            .field("capabilities", &self.capabilities.keys().collect::<Vec<_>>())
            .finish()
    }
}
