use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{
    forward_body, parse_args, query_params, require_id, tool_result, validation_failure,
    McpToolHandler,
};
use crate::mcp::client::{ApiClient, RequestMeta};
use crate::mcp::types::{McpError, ToolDefinition};
use crate::requests::{CreateDocumentRequest, DocumentListQuery, UpdateDocumentRequest};
use crate::types::DocumentKind;
use crate::validation;

pub struct DocumentTools {
    client: Arc<ApiClient>,
}

impl DocumentTools {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

fn kind_names() -> Vec<&'static str> {
    DocumentKind::all().iter().map(|kind| kind.as_str()).collect()
}

#[async_trait]
impl McpToolHandler for DocumentTools {
    async fn handle_call(&self, name: &str, args: Value) -> Result<Value, McpError> {
        match name {
            "devplan://create_document" => {
                let request: CreateDocumentRequest = parse_args(&args)?;
                validation::document::create(&request).map_err(validation_failure)?;

                let meta = RequestMeta::from_args(&args, true);
                let (status, body) = self
                    .client
                    .post(
                        &self.client.api_path("documents"),
                        &forward_body(&args),
                        &meta,
                    )
                    .await?;
                Ok(tool_result(status.as_u16(), body))
            }
            "devplan://get_document" => {
                let id = require_id(&args)?;
                let meta = RequestMeta::from_args(&args, false);
                let body = self
                    .client
                    .get(
                        &self.client.api_path(&format!("documents/{id}")),
                        &[],
                        &meta,
                    )
                    .await?;
                Ok(tool_result(200, body))
            }
            "devplan://list_documents" => {
                let query: DocumentListQuery = parse_args(&args)?;
                validation::document::list(&query).map_err(validation_failure)?;

                let meta = RequestMeta::from_args(&args, false);
                let params = query_params(
                    &args,
                    &["projectId", "kind", "limit", "offset", "sortBy", "sortOrder"],
                );
                let body = self
                    .client
                    .get(&self.client.api_path("documents"), &params, &meta)
                    .await?;
                Ok(tool_result(200, body))
            }
            "devplan://update_document" => {
                let id = require_id(&args)?;
                let request: UpdateDocumentRequest = parse_args(&args)?;
                validation::document::update(&request).map_err(validation_failure)?;

                let meta = RequestMeta::from_args(&args, true);
                let (status, body) = self
                    .client
                    .patch(
                        &self.client.api_path(&format!("documents/{id}")),
                        &forward_body(&args),
                        &meta,
                    )
                    .await?;
                Ok(tool_result(status.as_u16(), body))
            }
            "devplan://delete_document" => {
                let id = require_id(&args)?;
                let meta = RequestMeta::from_args(&args, true);
                let status = self
                    .client
                    .delete(&self.client.api_path(&format!("documents/{id}")), &meta)
                    .await?;
                Ok(tool_result(status.as_u16(), json!({ "deleted": true })))
            }
            other => Err(McpError::method_not_found(other)),
        }
    }

    fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: "devplan://create_document".to_string(),
                description:
                    "Create a document in a project; the slug derives from the title when omitted"
                        .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "projectId": { "type": "string", "format": "uuid" },
                        "kind": { "type": "string", "enum": kind_names() },
                        "title": { "type": "string", "maxLength": 500 },
                        "slug": { "type": "string", "pattern": "^[a-z0-9]+(-[a-z0-9]+)*$" },
                        "content": { "type": "string" },
                        "requestId": { "type": "string" },
                        "idempotencyKey": { "type": "string" }
                    },
                    "required": ["projectId", "kind", "title"]
                }),
            },
            ToolDefinition {
                name: "devplan://get_document".to_string(),
                description: "Fetch a document by id".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "format": "uuid" }
                    },
                    "required": ["id"]
                }),
            },
            ToolDefinition {
                name: "devplan://list_documents".to_string(),
                description: "List documents, filterable by project and kind".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "projectId": { "type": "string", "format": "uuid" },
                        "kind": { "type": "string", "enum": kind_names() },
                        "limit": { "type": "integer", "minimum": 1, "maximum": 100 },
                        "offset": { "type": "integer", "minimum": 0 },
                        "sortBy": { "type": "string", "enum": validation::document::SORTABLE },
                        "sortOrder": { "type": "string", "enum": ["asc", "desc"] }
                    }
                }),
            },
            ToolDefinition {
                name: "devplan://update_document".to_string(),
                description: "Update a document's fields".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "format": "uuid" },
                        "kind": { "type": "string", "enum": kind_names() },
                        "title": { "type": "string", "maxLength": 500 },
                        "slug": { "type": "string", "pattern": "^[a-z0-9]+(-[a-z0-9]+)*$" },
                        "content": { "type": "string" },
                        "requestId": { "type": "string" },
                        "idempotencyKey": { "type": "string" }
                    },
                    "required": ["id"]
                }),
            },
            ToolDefinition {
                name: "devplan://delete_document".to_string(),
                description: "Delete a document".to_string(),
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
