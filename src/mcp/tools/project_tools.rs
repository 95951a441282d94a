use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{
    forward_body, parse_args, query_params, require_id, tool_result, validation_failure,
    McpToolHandler,
};
use crate::mcp::client::{ApiClient, RequestMeta};
use crate::mcp::types::{McpError, ToolDefinition};
use crate::requests::{CreateProjectRequest, ProjectListQuery, UpdateProjectRequest};
use crate::validation;

pub struct ProjectTools {
    client: Arc<ApiClient>,
}

impl ProjectTools {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl McpToolHandler for ProjectTools {
    async fn handle_call(&self, name: &str, args: Value) -> Result<Value, McpError> {
        match name {
            "devplan://create_project" => {
                let request: CreateProjectRequest = parse_args(&args)?;
                validation::project::create(&request).map_err(validation_failure)?;

                let meta = RequestMeta::from_args(&args, true);
                let (status, body) = self
                    .client
                    .post(&self.client.api_path("projects"), &forward_body(&args), &meta)
                    .await?;
                Ok(tool_result(status.as_u16(), body))
            }
            "devplan://get_project" => {
                let id = require_id(&args)?;
                let meta = RequestMeta::from_args(&args, false);
                let body = self
                    .client
                    .get(
                        &self.client.api_path(&format!("projects/{id}")),
                        &[],
                        &meta,
                    )
                    .await?;
                Ok(tool_result(200, body))
            }
            "devplan://list_projects" => {
                let query: ProjectListQuery = parse_args(&args)?;
                validation::project::list(&query).map_err(validation_failure)?;

                let meta = RequestMeta::from_args(&args, false);
                let params = query_params(&args, &["limit", "offset", "sortBy", "sortOrder"]);
                let body = self
                    .client
                    .get(&self.client.api_path("projects"), &params, &meta)
                    .await?;
                Ok(tool_result(200, body))
            }
            "devplan://update_project" => {
                let id = require_id(&args)?;
                let request: UpdateProjectRequest = parse_args(&args)?;
                validation::project::update(&request).map_err(validation_failure)?;

                let meta = RequestMeta::from_args(&args, true);
                let (status, body) = self
                    .client
                    .patch(
                        &self.client.api_path(&format!("projects/{id}")),
                        &forward_body(&args),
                        &meta,
                    )
                    .await?;
                Ok(tool_result(status.as_u16(), body))
            }
            "devplan://delete_project" => {
                let id = require_id(&args)?;
                let meta = RequestMeta::from_args(&args, true);
                let status = self
                    .client
                    .delete(&self.client.api_path(&format!("projects/{id}")), &meta)
                    .await?;
                Ok(tool_result(status.as_u16(), json!({ "deleted": true })))
            }
            other => Err(McpError::method_not_found(other)),
        }
    }

    fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: "devplan://create_project".to_string(),
                description: "Create a new project".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "maxLength": 200 },
                        "requestId": { "type": "string" },
                        "idempotencyKey": { "type": "string" }
                    },
                    "required": ["name"]
                }),
            },
            ToolDefinition {
                name: "devplan://get_project".to_string(),
                description: "Fetch a project by id".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "format": "uuid" }
                    },
                    "required": ["id"]
                }),
            },
            ToolDefinition {
                name: "devplan://list_projects".to_string(),
                description: "List projects with pagination and sorting".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "limit": { "type": "integer", "minimum": 1, "maximum": 100 },
                        "offset": { "type": "integer", "minimum": 0 },
                        "sortBy": { "type": "string", "enum": validation::project::SORTABLE },
                        "sortOrder": { "type": "string", "enum": ["asc", "desc"] }
                    }
                }),
            },
            ToolDefinition {
                name: "devplan://update_project".to_string(),
                description: "Update a project's fields".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "format": "uuid" },
                        "name": { "type": "string", "maxLength": 200 },
                        "requestId": { "type": "string" },
                        "idempotencyKey": { "type": "string" }
                    },
                    "required": ["id"]
                }),
            },
            ToolDefinition {
                name: "devplan://delete_project".to_string(),
                description: "Delete a project and everything it owns".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "format": "uuid" }
                    },
                    "required": ["id"]
                }),
            },
        ]
    }
}
