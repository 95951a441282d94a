/// MCP Resources Implementation
///
/// Read-only named views over the REST service. Every read is a pure
/// read-through with no side effects and no caching: each one re-queries the
/// service, so the snapshot is only as stale as the HTTP round-trip.
use serde_json::{json, Value};
use std::sync::Arc;

use crate::mcp::client::{ApiClient, RequestMeta};
use crate::mcp::types::{McpError, ResourceDefinition};
use crate::types::DocumentKind;

pub const PROJECTS_URI: &str = "devplan://projects";
pub const DOCUMENT_KINDS_URI: &str = "devplan://documents/kinds";
pub const RECENT_DOCUMENTS_URI: &str = "devplan://documents/recent";
pub const HEALTH_URI: &str = "devplan://health";

const RECENT_DOCUMENTS_LIMIT: &str = "10";

pub struct ResourceRegistry {
    client: Arc<ApiClient>,
}

impl ResourceRegistry {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// List all available resources
    pub fn list_resources(&self) -> Vec<ResourceDefinition> {
        vec![
            ResourceDefinition {
                uri: PROJECTS_URI.to_string(),
                name: "Project list".to_string(),
                description: "Every project, most recently updated first".to_string(),
                mime_type: Some("application/json".to_string()),
            },
            ResourceDefinition {
                uri: DOCUMENT_KINDS_URI.to_string(),
                name: "Document kind catalog".to_string(),
                description: "The fixed set of document kinds the API accepts".to_string(),
                mime_type: Some("application/json".to_string()),
            },
            ResourceDefinition {
                uri: RECENT_DOCUMENTS_URI.to_string(),
                name: "Recent documents".to_string(),
                description: "The ten most recently updated documents".to_string(),
                mime_type: Some("application/json".to_string()),
            },
            ResourceDefinition {
                uri: HEALTH_URI.to_string(),
                name: "Health snapshot".to_string(),
                description: "Readiness of the backing service and its store".to_string(),
                mime_type: Some("application/json".to_string()),
            },
        ]
    }

    /// Read a specific resource by URI
    pub async fn read_resource(&self, uri: &str) -> Result<Value, McpError> {
        let meta = RequestMeta::from_args(&Value::Null, false);

        match uri {
            PROJECTS_URI => {
                let body = self
                    .client
                    .get(
                        &self.client.api_path("projects"),
                        &[
                            ("limit".to_string(), "100".to_string()),
                            ("sortBy".to_string(), "updatedAt".to_string()),
                            ("sortOrder".to_string(), "desc".to_string()),
                        ],
                        &meta,
                    )
                    .await?;
                Ok(body)
            }
            // The kind catalog is static by contract; it never needs the
            // network.
            DOCUMENT_KINDS_URI => Ok(json!({
                "kinds": DocumentKind::all()
                    .iter()
                    .map(|kind| kind.as_str())
                    .collect::<Vec<_>>()
            })),
            RECENT_DOCUMENTS_URI => {
                let body = self
                    .client
                    .get(
                        &self.client.api_path("documents"),
                        &[
                            ("limit".to_string(), RECENT_DOCUMENTS_LIMIT.to_string()),
                            ("sortBy".to_string(), "updatedAt".to_string()),
                            ("sortOrder".to_string(), "desc".to_string()),
                        ],
                        &meta,
                    )
                    .await?;
                Ok(body)
            }
            HEALTH_URI => {
                let body = self.client.get("/health/ready", &[], &meta).await?;
                Ok(body)
            }
            other => Err(McpError::resource_not_found(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::config::GatewayConfig;

    fn registry() -> ResourceRegistry {
        let client = ApiClient::new(&GatewayConfig::default()).expect("client builds");
        ResourceRegistry::new(Arc::new(client))
    }

    #[test]
    fn test_resource_catalog() {
        let resources = registry().list_resources();
        let uris: Vec<&str> = resources.iter().map(|r| r.uri.as_str()).collect();
        assert!(uris.contains(&PROJECTS_URI));
        assert!(uris.contains(&DOCUMENT_KINDS_URI));
        assert!(uris.contains(&RECENT_DOCUMENTS_URI));
        assert!(uris.contains(&HEALTH_URI));
    }

    #[tokio::test]
    async fn test_kind_catalog_is_static() {
        let value = registry().read_resource(DOCUMENT_KINDS_URI).await.unwrap();
        let kinds: Vec<&str> = value["kinds"]
            .as_array()
            .unwrap()
            .iter()
            .map(|k| k.as_str().unwrap())
            .collect();
        assert_eq!(
            kinds,
            vec!["prd", "tech-overview", "sprint-overview", "sprint", "freeform"]
        );
    }

    #[tokio::test]
    async fn test_unknown_resource() {
        let err = registry()
            .read_resource("devplan://nope")
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::mcp::types::error_codes::NOT_FOUND);
    }
}
