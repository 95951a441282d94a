// Shared Request Contracts
// One set of request/query shapes consumed by BOTH the REST handlers and the
// gateway tools, so the two validation sites cannot drift. Fields are kept
// optional at the serde level; the validation layer is what decides which are
// required and reports every violation at once.

use serde::{Deserialize, Deserializer, Serialize};

/// Accept `20` or `"20"` for numeric knobs: query strings always arrive as
/// strings while gateway tool arguments arrive as JSON numbers.
fn num_or_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrString {
        Num(i64),
        Str(String),
    }

    Ok(Option::<NumOrString>::deserialize(deserializer)?.map(|v| match v {
        NumOrString::Num(n) => n.to_string(),
        NumOrString::Str(s) => s,
    }))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest {
    pub project_id: Option<String>,
    pub kind: Option<String>,
    pub title: Option<String>,
    /// Derived from the title when absent.
    pub slug: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentRequest {
    pub kind: Option<String>,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeatureRequest {
    pub project_id: Option<String>,
    #[serde(rename = "featureId")]
    pub feature_code: Option<String>,
    pub title: Option<String>,
    pub version: Option<String>,
    pub status: Option<String>,
    pub area: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFeatureRequest {
    #[serde(rename = "featureId")]
    pub feature_code: Option<String>,
    pub title: Option<String>,
    pub version: Option<String>,
    pub status: Option<String>,
    pub area: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintItemInput {
    pub text: Option<String>,
    pub checked: Option<bool>,
    /// Defaults to the item's index in the submitted list.
    #[serde(default, deserialize_with = "num_or_string")]
    pub position: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSprintRequest {
    pub project_id: Option<String>,
    #[serde(rename = "sprintId")]
    pub sprint_code: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub items: Option<Vec<SprintItemInput>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSprintRequest {
    #[serde(rename = "sprintId")]
    pub sprint_code: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Replaces the entire item set when present; items cannot be patched
    /// individually through this path.
    pub items: Option<Vec<SprintItemInput>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceSprintItemsRequest {
    pub items: Option<Vec<SprintItemInput>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListQuery {
    #[serde(default, deserialize_with = "num_or_string")]
    pub limit: Option<String>,
    #[serde(default, deserialize_with = "num_or_string")]
    pub offset: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentListQuery {
    pub project_id: Option<String>,
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "num_or_string")]
    pub limit: Option<String>,
    #[serde(default, deserialize_with = "num_or_string")]
    pub offset: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureListQuery {
    pub project_id: Option<String>,
    pub status: Option<String>,
    pub area: Option<String>,
    #[serde(default, deserialize_with = "num_or_string")]
    pub limit: Option<String>,
    #[serde(default, deserialize_with = "num_or_string")]
    pub offset: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintListQuery {
    pub project_id: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "num_or_string")]
    pub limit: Option<String>,
    #[serde(default, deserialize_with = "num_or_string")]
    pub offset: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_limit_accepts_number_and_string() {
        let from_tool: DocumentListQuery =
            serde_json::from_value(json!({"limit": 25, "offset": 5})).unwrap();
        assert_eq!(from_tool.limit.as_deref(), Some("25"));
        assert_eq!(from_tool.offset.as_deref(), Some("5"));

        let from_query: DocumentListQuery =
            serde_json::from_value(json!({"limit": "25"})).unwrap();
        assert_eq!(from_query.limit.as_deref(), Some("25"));
        assert!(from_query.offset.is_none());
    }

    #[test]
    fn test_natural_key_wire_names() {
        let req: CreateFeatureRequest =
            serde_json::from_value(json!({"featureId": "FEAT-001", "projectId": "p"})).unwrap();
        assert_eq!(req.feature_code.as_deref(), Some("FEAT-001"));
        assert_eq!(req.project_id.as_deref(), Some("p"));

        let req: CreateSprintRequest =
            serde_json::from_value(json!({"sprintId": "SPR-001"})).unwrap();
        assert_eq!(req.sprint_code.as_deref(), Some("SPR-001"));
    }

    #[test]
    fn test_missing_fields_stay_none() {
        let req: CreateDocumentRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.project_id.is_none());
        assert!(req.kind.is_none());
        assert!(req.title.is_none());
    }
}
