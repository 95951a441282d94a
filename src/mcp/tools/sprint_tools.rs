use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{
    forward_body, parse_args, query_params, require_id, tool_result, validation_failure,
    McpToolHandler,
};
use crate::mcp::client::{ApiClient, RequestMeta};
use crate::mcp::types::{McpError, ToolDefinition};
use crate::requests::{
    CreateSprintRequest, ReplaceSprintItemsRequest, SprintListQuery, UpdateSprintRequest,
};
use crate::validation;

const STATUS_VALUES: &[&str] = &["planned", "active", "done", "cancelled"];

fn item_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "text": { "type": "string", "maxLength": 1000 },
            "checked": { "type": "boolean" },
            "position": { "type": "integer" }
        },
        "required": ["text"]
    })
}

pub struct SprintTools {
    client: Arc<ApiClient>,
}

impl SprintTools {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl McpToolHandler for SprintTools {
    async fn handle_call(&self, name: &str, args: Value) -> Result<Value, McpError> {
        match name {
            "devplan://create_sprint" => {
                let request: CreateSprintRequest = parse_args(&args)?;
                let input = validation::sprint::create(&request).map_err(validation_failure)?;
                // The date-ordering rule is cheap to check locally; failing
                // here saves the round-trip the service would reject anyway.
                validation::sprint::check_date_range(input.start_date, input.end_date)
                    .map_err(validation_failure)?;

                let meta = RequestMeta::from_args(&args, true);
                let (status, body) = self
                    .client
                    .post(&self.client.api_path("sprints"), &forward_body(&args), &meta)
                    .await?;
                Ok(tool_result(status.as_u16(), body))
            }
            "devplan://get_sprint" => {
                let id = require_id(&args)?;
                let meta = RequestMeta::from_args(&args, false);
                let body = self
                    .client
                    .get(&self.client.api_path(&format!("sprints/{id}")), &[], &meta)
                    .await?;
                Ok(tool_result(200, body))
            }
            "devplan://list_sprints" => {
                let query: SprintListQuery = parse_args(&args)?;
                validation::sprint::list(&query).map_err(validation_failure)?;

                let meta = RequestMeta::from_args(&args, false);
                let params = query_params(
                    &args,
                    &["projectId", "status", "limit", "offset", "sortBy", "sortOrder"],
                );
                let body = self
                    .client
                    .get(&self.client.api_path("sprints"), &params, &meta)
                    .await?;
                Ok(tool_result(200, body))
            }
            "devplan://update_sprint" => {
                let id = require_id(&args)?;
                let request: UpdateSprintRequest = parse_args(&args)?;
                validation::sprint::update(&request).map_err(validation_failure)?;

                let meta = RequestMeta::from_args(&args, true);
                let (status, body) = self
                    .client
                    .patch(
                        &self.client.api_path(&format!("sprints/{id}")),
                        &forward_body(&args),
                        &meta,
                    )
                    .await?;
                Ok(tool_result(status.as_u16(), body))
            }
            "devplan://replace_sprint_items" => {
                let id = require_id(&args)?;
                let request: ReplaceSprintItemsRequest = parse_args(&args)?;
                validation::sprint::replace_items(&request).map_err(validation_failure)?;

                let meta = RequestMeta::from_args(&args, true);
                let (status, body) = self
                    .client
                    .put(
                        &self.client.api_path(&format!("sprints/{id}/items")),
                        &forward_body(&args),
                        &meta,
                    )
                    .await?;
                Ok(tool_result(status.as_u16(), body))
            }
            "devplan://delete_sprint" => {
                let id = require_id(&args)?;
                let meta = RequestMeta::from_args(&args, true);
                let status = self
                    .client
                    .delete(&self.client.api_path(&format!("sprints/{id}")), &meta)
                    .await?;
                Ok(tool_result(status.as_u16(), json!({ "deleted": true })))
            }
            other => Err(McpError::method_not_found(other)),
        }
    }

    fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: "devplan://create_sprint".to_string(),
                description:
                    "Create a sprint with an optional item list; sprintId must match SPR-<digits>"
                        .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "projectId": { "type": "string", "format": "uuid" },
                        "sprintId": { "type": "string", "pattern": "^SPR-\\d+$" },
                        "name": { "type": "string", "maxLength": 200 },
                        "status": { "type": "string", "enum": STATUS_VALUES },
                        "startDate": { "type": "string", "format": "date-time" },
                        "endDate": { "type": "string", "format": "date-time" },
                        "items": { "type": "array", "items": item_schema() },
                        "requestId": { "type": "string" },
                        "idempotencyKey": { "type": "string" }
                    },
                    "required": ["projectId", "sprintId", "name"]
                }),
            },
            ToolDefinition {
                name: "devplan://get_sprint".to_string(),
                description: "Fetch a sprint and its items by id".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "format": "uuid" }
                    },
                    "required": ["id"]
                }),
            },
            ToolDefinition {
                name: "devplan://list_sprints".to_string(),
                description: "List sprints, filterable by project and status".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "projectId": { "type": "string", "format": "uuid" },
                        "status": { "type": "string", "enum": STATUS_VALUES },
                        "limit": { "type": "integer", "minimum": 1, "maximum": 100 },
                        "offset": { "type": "integer", "minimum": 0 },
                        "sortBy": { "type": "string", "enum": validation::sprint::SORTABLE },
                        "sortOrder": { "type": "string", "enum": ["asc", "desc"] }
                    }
                }),
            },
            ToolDefinition {
                name: "devplan://update_sprint".to_string(),
                description:
                    "Update a sprint; a supplied items array replaces the whole set atomically"
                        .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "format": "uuid" },
                        "sprintId": { "type": "string", "pattern": "^SPR-\\d+$" },
                        "name": { "type": "string", "maxLength": 200 },
                        "status": { "type": "string", "enum": STATUS_VALUES },
                        "startDate": { "type": "string", "format": "date-time" },
                        "endDate": { "type": "string", "format": "date-time" },
                        "items": { "type": "array", "items": item_schema() },
                        "requestId": { "type": "string" },
                        "idempotencyKey": { "type": "string" }
                    },
                    "required": ["id"]
                }),
            },
            ToolDefinition {
                name: "devplan://replace_sprint_items".to_string(),
                description: "Replace a sprint's entire item list".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "format": "uuid" },
                        "items": { "type": "array", "items": item_schema() },
                        "requestId": { "type": "string" },
                        "idempotencyKey": { "type": "string" }
                    },
                    "required": ["id", "items"]
                }),
            },
            ToolDefinition {
                name: "devplan://delete_sprint".to_string(),
                description: "Delete a sprint and its items".to_string(),
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
