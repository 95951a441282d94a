// Gateway Server
// JSON-RPC dispatch for the MCP protocol surface: session setup, the tool
// catalog, tool invocation, and read-only resources. Transport framing and
// process lifecycle live in the stdio binary.

use anyhow::Result;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::mcp::client::ApiClient;
use crate::mcp::config::GatewayConfig;
use crate::mcp::resources::ResourceRegistry;
use crate::mcp::tools::ToolRegistry;
use crate::mcp::types::{McpError, McpRequest, McpResponse};

pub struct GatewayServer {
    config: Arc<GatewayConfig>,
    tools: ToolRegistry,
    resources: ResourceRegistry,
    start_time: Instant,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let client = Arc::new(ApiClient::new(&config)?);
        let tools = ToolRegistry::new(client.clone());
        let resources = ResourceRegistry::new(client);

        Ok(Self {
            config: Arc::new(config),
            tools,
            resources,
            start_time: Instant::now(),
        })
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn tool_registry(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Handle one raw JSON-RPC message. Returns `None` for notifications,
    /// which expect no response on the wire.
    pub async fn handle_message(&self, raw: Value) -> Option<Value> {
        let request: McpRequest = match serde_json::from_value(raw) {
            Ok(request) => request,
            Err(err) => {
                let response = McpResponse::failure(
                    Value::Null,
                    McpError::parse_error(&format!("invalid request: {err}")),
                );
                return serde_json::to_value(response).ok();
            }
        };

        if request.id.is_none() {
            debug!(method = %request.method, "ignoring notification");
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        let response = match self.dispatch(&request).await {
            Ok(result) => McpResponse::success(id, result),
            Err(error) => McpResponse::failure(id, error),
        };
        serde_json::to_value(response).ok()
    }

    async fn dispatch(&self, request: &McpRequest) -> Result<Value, McpError> {
        match request.method.as_str() {
            "initialize" => Ok(self.initialize_result()),
            "capabilities" => Ok(self.capabilities_result()),
            "ping" => Ok(json!({
                "status": "ok",
                "uptimeSeconds": self.uptime_seconds(),
                "version": self.config.protocol.server_version,
            })),
            "tools/list" => Ok(json!({
                "tools": self.tools.get_all_tool_definitions()
            })),
            "tools/call" => self.call_tool(&request.params).await,
            "resources/list" => Ok(json!({
                "resources": self.resources.list_resources()
            })),
            "resources/read" => self.read_resource(&request.params).await,
            other => Err(McpError::method_not_found(other)),
        }
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": self.config.protocol.protocol_version,
            "serverInfo": {
                "name": self.config.protocol.server_name,
                "version": self.config.protocol.server_version
            },
            "capabilities": {
                "tools": {},
                "resources": {},
                "logging": {}
            }
        })
    }

    fn capabilities_result(&self) -> Value {
        json!({
            "capabilities": {
                "tools": { "listChanged": false },
                "resources": { "subscribe": false, "listChanged": false },
                "logging": {}
            },
            "serverInfo": {
                "name": self.config.protocol.server_name,
                "version": self.config.protocol.server_version
            },
            "protocolVersion": self.config.protocol.protocol_version
        })
    }

    async fn call_tool(&self, params: &Value) -> Result<Value, McpError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| McpError::invalid_params("missing 'name' parameter"))?;
        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));

        debug!(tool = %name, "calling tool");

        let result = self.tools.handle_tool_call(name, arguments).await?;
        let text = serde_json::to_string_pretty(&result).unwrap_or_else(|_| result.to_string());
        Ok(json!({
            "content": [
                { "type": "text", "text": text }
            ]
        }))
    }

    async fn read_resource(&self, params: &Value) -> Result<Value, McpError> {
        let uri = params
            .get("uri")
            .and_then(Value::as_str)
            .ok_or_else(|| McpError::invalid_params("missing 'uri' parameter"))?;

        let value = self.resources.read_resource(uri).await?;
        let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
        Ok(json!({
            "contents": [
                { "uri": uri, "mimeType": "application/json", "text": text }
            ]
        }))
    }
}
