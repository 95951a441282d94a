/// MCP Tools Implementation
///
/// One callable tool per entity verb. Every handler re-validates its
/// arguments with the shared `crate::validation` module before any HTTP
/// round-trip: the gateway sits on the other side of a process boundary and
/// must produce protocol-shaped errors on its own, without trusting the
/// service to catch every mistake.
pub mod document_tools;
pub mod feature_tools;
pub mod project_tools;
pub mod sprint_tools;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::mcp::client::ApiClient;
use crate::mcp::types::{error_codes, McpError, ToolDefinition};

/// Trait for MCP tool handlers
#[async_trait]
pub trait McpToolHandler: Send + Sync {
    async fn handle_call(&self, name: &str, args: Value) -> Result<Value, McpError>;
    fn get_tool_definitions(&self) -> Vec<ToolDefinition>;
}

/// Main tool registry that routes calls to the per-entity handlers.
pub struct ToolRegistry {
    pub project_tools: Arc<project_tools::ProjectTools>,
    pub document_tools: Arc<document_tools::DocumentTools>,
    pub feature_tools: Arc<feature_tools::FeatureTools>,
    pub sprint_tools: Arc<sprint_tools::SprintTools>,
}

impl ToolRegistry {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            project_tools: Arc::new(project_tools::ProjectTools::new(client.clone())),
            document_tools: Arc::new(document_tools::DocumentTools::new(client.clone())),
            feature_tools: Arc::new(feature_tools::FeatureTools::new(client.clone())),
            sprint_tools: Arc::new(sprint_tools::SprintTools::new(client)),
        }
    }

    /// Get all available tool definitions
    pub fn get_all_tool_definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions = Vec::new();
        definitions.extend(self.project_tools.get_tool_definitions());
        definitions.extend(self.document_tools.get_tool_definitions());
        definitions.extend(self.feature_tools.get_tool_definitions());
        definitions.extend(self.sprint_tools.get_tool_definitions());
        definitions
    }

    /// Handle a tool call by routing on the entity named in the tool.
    pub async fn handle_tool_call(&self, name: &str, args: Value) -> Result<Value, McpError> {
        tracing::debug!("handling tool call: {}", name);

        match name {
            n if n.ends_with("_project") || n.ends_with("_projects") => {
                self.project_tools.handle_call(name, args).await
            }
            n if n.ends_with("_document") || n.ends_with("_documents") => {
                self.document_tools.handle_call(name, args).await
            }
            n if n.ends_with("_feature") || n.ends_with("_features") => {
                self.feature_tools.handle_call(name, args).await
            }
            n if n.ends_with("_sprint")
                || n.ends_with("_sprints")
                || n.ends_with("_sprint_items") =>
            {
                self.sprint_tools.handle_call(name, args).await
            }
            other => Err(McpError::method_not_found(other)),
        }
    }
}

// Shared helpers for the per-entity tool files.

pub(crate) fn parse_args<T: DeserializeOwned>(args: &Value) -> Result<T, McpError> {
    serde_json::from_value(args.clone())
        .map_err(|err| McpError::invalid_params(&format!("malformed arguments: {err}")))
}

/// Convert a gateway-side validation failure into a protocol error carrying
/// the same field -> message map the REST layer would have returned.
pub(crate) fn validation_failure(err: ApiError) -> McpError {
    let data = match &err {
        ApiError::SchemaValidation { errors } => Some(json!({ "errors": errors })),
        _ => None,
    };
    McpError {
        code: error_codes::VALIDATION_ERROR,
        message: err.to_string(),
        data,
    }
}

/// The entity id every get/update/delete tool requires.
pub(crate) fn require_id(args: &Value) -> Result<String, McpError> {
    let raw = args
        .get("id")
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| McpError::invalid_params("'id' is required"))?;
    Uuid::parse_str(raw)
        .map_err(|_| McpError::invalid_params("'id' must be a valid UUID"))?;
    Ok(raw.to_string())
}

/// The argument object minus the gateway-level meta keys, suitable as the
/// forwarded request body.
pub(crate) fn forward_body(args: &Value) -> Value {
    let mut body = args.clone();
    if let Some(map) = body.as_object_mut() {
        map.remove("requestId");
        map.remove("idempotencyKey");
        map.remove("id");
    }
    body
}

/// Collect the named keys into query parameters, stringifying numbers.
pub(crate) fn query_params(args: &Value, keys: &[&str]) -> Vec<(String, String)> {
    let mut params = Vec::new();
    for key in keys {
        match args.get(*key) {
            Some(Value::String(value)) if !value.is_empty() => {
                params.push((key.to_string(), value.clone()));
            }
            Some(Value::Number(value)) => {
                params.push((key.to_string(), value.to_string()));
            }
            _ => {}
        }
    }
    params
}

/// Uniform tool result: HTTP status plus the response body.
pub(crate) fn tool_result(status: u16, data: Value) -> Value {
    json!({ "status": status, "data": data })
}
