//! Tool calling definitions (OpenAI function-calling wire shapes)

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Tool definition as sent to the completion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String, // "function"
    pub function: FunctionDefinition,
}

impl ToolDefinition {
    pub fn function(function: FunctionDefinition) -> Self {
        Self {
            tool_type: "function".to_string(),
            function,
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub parameters: serde_json::Value, // JSON Schema
}

impl FunctionDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Build a definition whose `parameters` schema is derived from `T`.
    pub fn for_args<T: JsonSchema>(name: impl Into<String>, description: impl Into<String>) -> Self {
        let schema = schemars::schema_for!(T);
        let mut parameters =
            serde_json::to_value(&schema).unwrap_or_else(|_| serde_json::json!({"type": "object"}));
        // Endpoints reject the draft marker and title on function parameters.
        if let Some(obj) = parameters.as_object_mut() {
            obj.remove("$schema");
            obj.remove("title");
        }
        Self::new(name, description, parameters)
    }
}

/// Tool call (invocation from model)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub call_type: String,
    pub function: FunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

/// Name and JSON-encoded arguments of a call; `arguments` is built up
/// fragment by fragment while streaming.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            call_type: function_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// One streamed fragment of a tool call, correlated by `index`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallDelta {
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

/// Tool result (response to tool call)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    #[serde(default = "tool_role")]
    pub role: String,
    pub name: String,
    pub content: String,
}

fn tool_role() -> String {
    "tool".to_string()
}

impl ToolResult {
    pub fn new(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            role: tool_role(),
            name: name.into(),
            content: content.into(),
        }
    }

    /// Result whose content is the `{"error": ...}` envelope.
    pub fn error(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let envelope = serde_json::json!({ "error": message.into() });
        Self::new(tool_call_id, name, envelope.to_string())
    }

    /// True when `content` is an `{"error": ...}` envelope.
    pub fn is_error(&self) -> bool {
        serde_json::from_str::<serde_json::Value>(&self.content)
            .ok()
            .and_then(|v| v.as_object().map(|o| o.contains_key("error")))
            .unwrap_or(false)
    }
}
