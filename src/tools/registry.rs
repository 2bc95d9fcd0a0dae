//! Tool registry.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tracing::debug;

use super::{ToolContext, ToolError, ToolHandler};
use crate::types::tool::{FunctionDefinition, ToolDefinition};

#[derive(Clone)]
struct RegisteredTool {
    definition: FunctionDefinition,
    handler: Arc<dyn ToolHandler>,
}

/// Named tool definitions plus their handlers.
///
/// Registration is last-write-wins. Lookups clone the handler out of the map,
/// so the lock is never held while a handler runs and concurrent `execute`
/// calls do not block each other.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, RegisteredTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry shared by clients that were not given their own.
    pub fn global() -> Arc<ToolRegistry> {
        GLOBAL_REGISTRY.clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, RegisteredTool>> {
        self.tools.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, RegisteredTool>> {
        self.tools.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store or replace the tool registered under `name`.
    ///
    /// The stored definition takes `name` as its function name. `parameters`
    /// must be a JSON object; nothing else about the schema is checked.
    pub fn register(
        &self,
        name: impl Into<String>,
        mut definition: FunctionDefinition,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), ToolError> {
        let name = name.into();
        if !definition.parameters.is_object() {
            return Err(ToolError::InvalidDefinition {
                name,
                reason: "parameters must be a JSON object".to_string(),
            });
        }
        definition.name = name.clone();

        let replaced = self
            .write()
            .insert(name.clone(), RegisteredTool { definition, handler })
            .is_some();
        debug!(tool = %name, replaced, "registered tool");
        Ok(())
    }

    /// Remove a tool; returns whether it was present.
    pub fn unregister(&self, name: &str) -> bool {
        self.write().remove(name).is_some()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn has(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// All definitions in wire shape, sorted by name.
    pub fn list(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .read()
            .values()
            .map(|t| ToolDefinition::function(t.definition.clone()))
            .collect();
        defs.sort_by(|a, b| a.function.name.cmp(&b.function.name));
        defs
    }

    /// Run the handler registered under `name`.
    ///
    /// Handler errors are returned unchanged; turning them into tool results
    /// is the executor's job.
    pub async fn execute(
        &self,
        name: &str,
        args: Value,
        context: &ToolContext,
    ) -> Result<Value, ToolError> {
        let handler = self
            .read()
            .get(name)
            .map(|t| t.handler.clone())
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        handler.call(args, context.clone()).await
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

static GLOBAL_REGISTRY: once_cell::sync::Lazy<Arc<ToolRegistry>> =
    once_cell::sync::Lazy::new(|| Arc::new(ToolRegistry::new()));
