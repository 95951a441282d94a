// Error Taxonomy and Problem Mapping
// A closed set of failure kinds raised anywhere in the request path, and the
// single entry point that converts each of them into the uniform RFC7807-style
// problem body. No entity-specific error shape leaks past this module.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every failure the REST layer can surface, one variant per taxonomy entry.
///
/// The gateway adds one local kind of its own (`Network`, see
/// `mcp::client::GatewayError`) which never appears here.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed shape or type: reported with the full field -> message map
    /// so a caller can fix every violation in one round-trip.
    #[error("schema validation failed on {} field(s)", .errors.len())]
    SchemaValidation { errors: BTreeMap<String, String> },

    /// Well-typed input that violates a business rule, e.g. an end date
    /// before the start date.
    #[error("{detail}")]
    DomainValidation { detail: String },

    #[error("{resource} '{id}' not found")]
    NotFound { resource: &'static str, id: String },

    #[error("{resource} with {field} '{value}' already exists in this scope")]
    Conflict {
        resource: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn schema(errors: BTreeMap<String, String>) -> Self {
        Self::SchemaValidation { errors }
    }

    /// Single-field schema failure, for call sites that reject one value
    /// (e.g. a malformed path id).
    pub fn schema_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.into(), message.into());
        Self::SchemaValidation { errors }
    }

    pub fn domain(detail: impl Into<String>) -> Self {
        Self::DomainValidation {
            detail: detail.into(),
        }
    }

    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }

    pub fn conflict(
        resource: &'static str,
        field: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            resource,
            field,
            value: value.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::SchemaValidation { .. } => StatusCode::BAD_REQUEST,
            ApiError::DomainValidation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ApiError::SchemaValidation { .. } => "Validation Error",
            ApiError::DomainValidation { .. } => "Validation Failed",
            ApiError::NotFound { .. } => "Not Found",
            ApiError::Conflict { .. } => "Conflict",
            ApiError::RateLimited { .. } => "Rate Limit Exceeded",
            ApiError::Internal(_) => "Internal Server Error",
        }
    }

    pub fn type_uri(&self) -> &'static str {
        match self {
            ApiError::SchemaValidation { .. } => "https://devplan.dev/problems/validation-error",
            ApiError::DomainValidation { .. } => "https://devplan.dev/problems/validation-failed",
            ApiError::NotFound { .. } => "https://devplan.dev/problems/not-found",
            ApiError::Conflict { .. } => "https://devplan.dev/problems/conflict",
            ApiError::RateLimited { .. } => "https://devplan.dev/problems/rate-limit",
            ApiError::Internal(_) => "https://devplan.dev/problems/internal",
        }
    }

    /// Convert into the uniform problem body, attaching the request path and
    /// the propagated request identifier. This is the only place a failure
    /// turns into a wire shape.
    pub fn to_problem(&self, instance: &str, request_id: &str) -> ProblemDetails {
        ProblemDetails {
            problem_type: self.type_uri().to_string(),
            title: self.title().to_string(),
            status: self.status().as_u16(),
            detail: self.to_string(),
            instance: instance.to_string(),
            request_id: request_id.to_string(),
            errors: match self {
                ApiError::SchemaValidation { errors } => Some(errors.clone()),
                _ => None,
            },
            retry_after: match self {
                ApiError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
                _ => None,
            },
        }
    }
}

/// The uniform error body every failed response carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub instance: String,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let retry_after = self.retry_after;
        let mut response = (status, Json(self)).into_response();

        response.headers_mut().insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/problem+json"),
        );
        if let Some(secs) = retry_after {
            if let Ok(value) = header::HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_map(field: &str, message: &str) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert(field.to_string(), message.to_string());
        map
    }

    #[test]
    fn test_status_mapping_table() {
        assert_eq!(
            ApiError::schema(field_map("name", "required")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::domain("endDate must be after startDate").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::not_found("project", "abc").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::conflict("document", "slug", "test-document").status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::RateLimited {
                retry_after_secs: 60
            }
            .status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_titles_match_contract() {
        assert_eq!(ApiError::schema(BTreeMap::new()).title(), "Validation Error");
        assert_eq!(ApiError::domain("x").title(), "Validation Failed");
        assert_eq!(ApiError::not_found("sprint", "s").title(), "Not Found");
        assert_eq!(
            ApiError::conflict("feature", "featureId", "FEAT-1").title(),
            "Conflict"
        );
        assert_eq!(
            ApiError::RateLimited {
                retry_after_secs: 1
            }
            .title(),
            "Rate Limit Exceeded"
        );
    }

    #[test]
    fn test_problem_body_carries_request_context() {
        let err = ApiError::schema(field_map("limit", "must be between 1 and 100"));
        let problem = err.to_problem("/v1/documents", "req-123");

        assert_eq!(problem.status, 400);
        assert_eq!(problem.instance, "/v1/documents");
        assert_eq!(problem.request_id, "req-123");
        let errors = problem.errors.expect("validation problems carry fields");
        assert_eq!(errors["limit"], "must be between 1 and 100");

        let json = serde_json::to_value(&ApiError::RateLimited {
            retry_after_secs: 30,
        }
        .to_problem("/v1/projects", "r"))
        .unwrap();
        assert_eq!(json["retryAfter"], 30);
        assert_eq!(json["requestId"], "r");
        assert_eq!(json["title"], "Rate Limit Exceeded");
    }

    #[test]
    fn test_conflict_detail_names_natural_key() {
        let err = ApiError::conflict("document", "slug", "test-document");
        assert!(err.to_string().contains("test-document"));
        assert!(err.to_string().contains("slug"));
    }
}
