//! Built-in tools shipped with the server.
//!
//! Remote tracker tools live in their own crates and implement the same
//! [`Tool`] trait; these two exist so that a bare server has something to
//! advertise and clients can check the round trip.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use trackbridge_core::{Config, ParamKind, ParamSpec, Tool, ToolResult};

use crate::registry::ToolRegistry;

/// Upper bound for `echo`'s `repeat` argument.
const MAX_REPEAT: u64 = 100;

/// Echo a message back.
pub struct EchoTool;

#[derive(Debug, Deserialize)]
struct EchoParams {
    message: String,
    #[serde(default)]
    repeat: Option<f64>,
}

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo a message back, optionally repeated"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::new("message", ParamKind::String, "Text to echo").required(),
            ParamSpec::new(
                "repeat",
                ParamKind::Number,
                "How many times to repeat the message (default: 1)",
            ),
        ]
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        let params: EchoParams = match serde_json::from_value(arguments) {
            Ok(params) => params,
            Err(e) => return ToolResult::failure(format!("Invalid arguments: {}", e)),
        };

        let repeat = params.repeat.unwrap_or(1.0);
        if repeat < 1.0 || repeat.fract() != 0.0 || repeat > MAX_REPEAT as f64 {
            return ToolResult::failure(format!(
                "repeat must be a whole number between 1 and {}",
                MAX_REPEAT
            ));
        }

        ToolResult::text(vec![params.message.as_str(); repeat as usize].join("\n"))
    }
}

/// Join a list of strings.
pub struct JoinTool;

#[derive(Debug, Deserialize)]
struct JoinParams {
    items: Vec<String>,
    #[serde(default)]
    separator: Option<String>,
}

#[async_trait]
impl Tool for JoinTool {
    fn name(&self) -> &str {
        "join"
    }

    fn description(&self) -> &str {
        "Join a list of strings with a separator"
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::array("items", ParamKind::String, "Strings to join").required(),
            ParamSpec::new(
                "separator",
                ParamKind::String,
                "Separator placed between items (default: \", \")",
            ),
        ]
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        let params: JoinParams = match serde_json::from_value(arguments) {
            Ok(params) => params,
            Err(e) => return ToolResult::failure(format!("Invalid arguments: {}", e)),
        };

        let separator = params.separator.as_deref().unwrap_or(", ");
        ToolResult::success(serde_json::json!({
            "text": params.items.join(separator),
            "count": params.items.len(),
        }))
    }
}

/// All built-in tools.
pub fn builtin_tools() -> Vec<Arc<dyn Tool>> {
    vec![Arc::new(EchoTool), Arc::new(JoinTool)]
}

/// Registry populated with the built-in tools the config leaves enabled.
pub fn default_registry(config: &Config) -> trackbridge_core::Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    for tool in builtin_tools() {
        if !config.is_tool_enabled(tool.name()) {
            tracing::info!("Tool disabled by config: {}", tool.name());
            continue;
        }
        registry.register(tool)?;
    }
    Ok(registry)
}
