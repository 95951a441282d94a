use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{
    forward_body, parse_args, query_params, require_id, tool_result, validation_failure,
    McpToolHandler,
};
use crate::mcp::client::{ApiClient, RequestMeta};
use crate::mcp::types::{McpError, ToolDefinition};
use crate::requests::{CreateFeatureRequest, FeatureListQuery, UpdateFeatureRequest};
use crate::validation;

const STATUS_VALUES: &[&str] = &["planned", "in-progress", "completed", "cancelled"];

pub struct FeatureTools {
    client: Arc<ApiClient>,
}

impl FeatureTools {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl McpToolHandler for FeatureTools {
    async fn handle_call(&self, name: &str, args: Value) -> Result<Value, McpError> {
        match name {
            "devplan://create_feature" => {
                let request: CreateFeatureRequest = parse_args(&args)?;
                validation::feature::create(&request).map_err(validation_failure)?;

                let meta = RequestMeta::from_args(&args, true);
                let (status, body) = self
                    .client
                    .post(
                        &self.client.api_path("features"),
                        &forward_body(&args),
                        &meta,
                    )
                    .await?;
                Ok(tool_result(status.as_u16(), body))
            }
            "devplan://get_feature" => {
                let id = require_id(&args)?;
                let meta = RequestMeta::from_args(&args, false);
                let body = self
                    .client
                    .get(
                        &self.client.api_path(&format!("features/{id}")),
                        &[],
                        &meta,
                    )
                    .await?;
                Ok(tool_result(200, body))
            }
            "devplan://list_features" => {
                let query: FeatureListQuery = parse_args(&args)?;
                validation::feature::list(&query).map_err(validation_failure)?;

                let meta = RequestMeta::from_args(&args, false);
                let params = query_params(
                    &args,
                    &[
                        "projectId", "status", "area", "limit", "offset", "sortBy", "sortOrder",
                    ],
                );
                let body = self
                    .client
                    .get(&self.client.api_path("features"), &params, &meta)
                    .await?;
                Ok(tool_result(200, body))
            }
            "devplan://update_feature" => {
                let id = require_id(&args)?;
                let request: UpdateFeatureRequest = parse_args(&args)?;
                validation::feature::update(&request).map_err(validation_failure)?;

                let meta = RequestMeta::from_args(&args, true);
                let (status, body) = self
                    .client
                    .patch(
                        &self.client.api_path(&format!("features/{id}")),
                        &forward_body(&args),
                        &meta,
                    )
                    .await?;
                Ok(tool_result(status.as_u16(), body))
            }
            "devplan://delete_feature" => {
                let id = require_id(&args)?;
                let meta = RequestMeta::from_args(&args, true);
                let status = self
                    .client
                    .delete(&self.client.api_path(&format!("features/{id}")), &meta)
                    .await?;
                Ok(tool_result(status.as_u16(), json!({ "deleted": true })))
            }
            other => Err(McpError::method_not_found(other)),
        }
    }

    fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: "devplan://create_feature".to_string(),
                description: "Create a feature; featureId must match FEAT-<digits>".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "projectId": { "type": "string", "format": "uuid" },
                        "featureId": { "type": "string", "pattern": "^FEAT-\\d+$" },
                        "title": { "type": "string", "maxLength": 500 },
                        "version": { "type": "string" },
                        "status": { "type": "string", "enum": STATUS_VALUES },
                        "area": { "type": "string", "maxLength": 100 },
                        "requestId": { "type": "string" },
                        "idempotencyKey": { "type": "string" }
                    },
                    "required": ["projectId", "featureId", "title"]
                }),
            },
            ToolDefinition {
                name: "devplan://get_feature".to_string(),
                description: "Fetch a feature by id".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "format": "uuid" }
                    },
                    "required": ["id"]
                }),
            },
            ToolDefinition {
                name: "devplan://list_features".to_string(),
                description:
                    "List features, filterable by project, status, and area substring".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "projectId": { "type": "string", "format": "uuid" },
                        "status": { "type": "string", "enum": STATUS_VALUES },
                        "area": { "type": "string" },
                        "limit": { "type": "integer", "minimum": 1, "maximum": 100 },
                        "offset": { "type": "integer", "minimum": 0 },
                        "sortBy": { "type": "string", "enum": validation::feature::SORTABLE },
                        "sortOrder": { "type": "string", "enum": ["asc", "desc"] }
                    }
                }),
            },
            ToolDefinition {
                name: "devplan://update_feature".to_string(),
                description: "Update a feature's fields".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "format": "uuid" },
                        "featureId": { "type": "string", "pattern": "^FEAT-\\d+$" },
                        "title": { "type": "string", "maxLength": 500 },
                        "version": { "type": "string" },
                        "status": { "type": "string", "enum": STATUS_VALUES },
                        "area": { "type": "string", "maxLength": 100 },
                        "requestId": { "type": "string" },
                        "idempotencyKey": { "type": "string" }
                    },
                    "required": ["id"]
                }),
            },
            ToolDefinition {
                name: "devplan://delete_feature".to_string(),
                description: "Delete a feature".to_string(),
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
