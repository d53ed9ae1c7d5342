//! Tool contract shared by the server and every tool implementation.
//!
//! A tool is a named capability with a human description, an ordered list of
//! parameter specifications and an async body. Bodies never raise errors
//! across this boundary: every outcome is a [`ToolResult`].
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//! use serde_json::Value;
//! use trackbridge_core::{ParamKind, ParamSpec, Tool, ToolResult};
//!
//! struct Greet;
//!
//! #[async_trait]
//! impl Tool for Greet {
//!     fn name(&self) -> &str { "greet" }
//!     fn description(&self) -> &str { "Say hello" }
//!     fn parameters(&self) -> Vec<ParamSpec> {
//!         vec![ParamSpec::new("who", ParamKind::String, "Who to greet").required()]
//!     }
//!     async fn execute(&self, arguments: Value) -> ToolResult {
//!         let who = arguments["who"].as_str().unwrap_or("world");
//!         ToolResult::text(format!("Hello, {who}!"))
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};

/// Primitive kind of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParamKind {
    /// JSON Schema type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
            ParamKind::Object => "object",
            ParamKind::Array => "array",
        }
    }
}

/// Specification of a single tool parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub description: String,
    pub required: bool,
    /// Element kind; mandatory for [`ParamKind::Array`] and invalid otherwise.
    pub items: Option<ParamKind>,
}

impl ParamSpec {
    /// Create an optional parameter.
    pub fn new(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: false,
            items: None,
        }
    }

    /// Create an optional array parameter whose elements are `item`.
    pub fn array(name: impl Into<String>, item: ParamKind, description: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Array, description).items(item)
    }

    /// Mark the parameter as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the element kind of an array parameter.
    pub fn items(mut self, kind: ParamKind) -> Self {
        self.items = Some(kind);
        self
    }
}

/// Outcome of a single tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    /// Free-form payload, usually a text block or structured data.
    Success(Value),
    /// Business-level failure reported back to the client as data.
    Failure { message: String, code: Option<i64> },
}

impl ToolResult {
    /// Successful result with an arbitrary payload.
    pub fn success(payload: impl Into<Value>) -> Self {
        ToolResult::Success(payload.into())
    }

    /// Successful result carrying a text block.
    pub fn text(text: impl Into<String>) -> Self {
        ToolResult::Success(Value::String(text.into()))
    }

    /// Failed result without a code.
    pub fn failure(message: impl Into<String>) -> Self {
        ToolResult::Failure {
            message: message.into(),
            code: None,
        }
    }

    /// Failed result with a tool-specific code.
    pub fn failure_with_code(message: impl Into<String>, code: i64) -> Self {
        ToolResult::Failure {
            message: message.into(),
            code: Some(code),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }
}

impl From<Error> for ToolResult {
    fn from(err: Error) -> Self {
        ToolResult::failure(err.to_string())
    }
}

/// A capability invocable through `tools/call`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name used for dispatch and advertisement.
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// Ordered parameter specifications.
    fn parameters(&self) -> Vec<ParamSpec>;

    /// Run the tool.
    async fn execute(&self, arguments: Value) -> ToolResult;

    /// Check that every required parameter is present in `arguments`.
    ///
    /// Only presence is checked; type validation belongs to the tool body.
    fn validate_arguments(&self, arguments: &Value) -> bool {
        missing_arguments(&self.parameters(), arguments).is_empty()
    }
}

/// Names of required parameters absent from `arguments`.
pub fn missing_arguments(params: &[ParamSpec], arguments: &Value) -> Vec<String> {
    let fields = arguments.as_object();
    params
        .iter()
        .filter(|p| p.required)
        .filter(|p| !fields.is_some_and(|f| f.contains_key(&p.name)))
        .map(|p| p.name.clone())
        .collect()
}

/// Build the JSON Schema object advertised for a tool's parameters.
///
/// Fails when an array parameter has no element kind, when a non-array
/// parameter declares one, or when two parameters share a name.
pub fn input_schema(tool: &str, params: &[ParamSpec]) -> Result<Value> {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for param in params {
        let mut property = Map::new();
        property.insert("type".to_string(), json!(param.kind.as_str()));
        property.insert("description".to_string(), json!(param.description));

        match (param.kind, param.items) {
            (ParamKind::Array, Some(item)) => {
                property.insert("items".to_string(), json!({ "type": item.as_str() }));
            }
            (ParamKind::Array, None) => {
                return Err(schema_error(
                    tool,
                    format!("array parameter '{}' has no item kind", param.name),
                ));
            }
            (_, Some(_)) => {
                return Err(schema_error(
                    tool,
                    format!("parameter '{}' is not an array but declares an item kind", param.name),
                ));
            }
            (_, None) => {}
        }

        if properties
            .insert(param.name.clone(), Value::Object(property))
            .is_some()
        {
            return Err(schema_error(
                tool,
                format!("parameter '{}' is declared twice", param.name),
            ));
        }
        if param.required {
            required.push(json!(param.name));
        }
    }

    Ok(json!({
        "type": "object",
        "properties": properties,
        "required": required,
    }))
}

fn schema_error(tool: &str, message: String) -> Error {
    Error::Schema {
        tool: tool.to_string(),
        message,
    }
}
