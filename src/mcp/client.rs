// Gateway HTTP Client
// Thin reqwest wrapper that threads X-Request-Id / X-Idempotency-Key through
// every call, enforces the configured request timeout, and classifies
// failures: non-2xx responses carry the service's problem body, transport
// failures and timeouts become the gateway-local Network kind.

use reqwest::{Method, StatusCode, Url};
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

use crate::errors::ProblemDetails;
use crate::mcp::config::GatewayConfig;
use crate::mcp::types::{error_codes, McpError};

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const IDEMPOTENCY_KEY_HEADER: &str = "x-idempotency-key";

/// Failure kinds local to the gateway. `Network` does not exist in the REST
/// layer's taxonomy; it covers the transport between the two processes.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The service answered with an error; the problem body rides along for
    /// diagnosis.
    #[error("API responded {status}: {detail}")]
    Api {
        status: u16,
        detail: String,
        problem: Option<ProblemDetails>,
    },

    #[error("network failure talking to the API: {0}")]
    Network(String),

    #[error("unexpected API response: {0}")]
    InvalidResponse(String),
}

impl From<GatewayError> for McpError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Api {
                status,
                detail,
                problem,
            } => {
                let code = match status {
                    400 | 422 => error_codes::VALIDATION_ERROR,
                    404 => error_codes::NOT_FOUND,
                    409 => error_codes::CONFLICT,
                    429 => error_codes::RATE_LIMITED,
                    _ => error_codes::API_ERROR,
                };
                let data = serde_json::json!({
                    "status": status,
                    "problem": problem.and_then(|p| serde_json::to_value(p).ok()),
                });
                McpError {
                    code,
                    message: detail,
                    data: Some(data),
                }
            }
            GatewayError::Network(detail) => McpError {
                code: error_codes::NETWORK_ERROR,
                message: detail,
                data: None,
            },
            GatewayError::InvalidResponse(detail) => McpError {
                code: error_codes::INTERNAL_ERROR,
                message: detail,
                data: None,
            },
        }
    }
}

/// Identifiers attached to one forwarded call. Generated by the gateway when
/// the caller did not supply them in the tool arguments.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub request_id: String,
    pub idempotency_key: Option<String>,
}

impl RequestMeta {
    /// Read `requestId` / `idempotencyKey` out of tool arguments, generating
    /// what is missing. The idempotency key is only materialized for
    /// mutations.
    pub fn from_args(args: &Value, mutation: bool) -> Self {
        let request_id = args
            .get("requestId")
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let idempotency_key = if mutation {
            Some(
                args.get("idempotencyKey")
                    .and_then(Value::as_str)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| Uuid::new_v4().to_string()),
            )
        } else {
            None
        };

        Self {
            request_id,
            idempotency_key,
        }
    }

    pub fn read_only(&self) -> Self {
        Self {
            request_id: self.request_id.clone(),
            idempotency_key: None,
        }
    }
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    path_prefix: String,
    auth_token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &GatewayConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(Duration::from_secs(
                config.api.request_timeout_secs.min(10),
            ))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            path_prefix: config.api.path_prefix.clone(),
            auth_token: config.api.auth_token.clone(),
        })
    }

    /// Path under the versioned API prefix, e.g. `api_path("projects")`.
    pub fn api_path(&self, suffix: &str) -> String {
        format!("{}/{}", self.path_prefix, suffix)
    }

    fn url(&self, path: &str, params: &[(String, String)]) -> Result<Url, GatewayError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|err| GatewayError::InvalidResponse(format!("invalid URL: {err}")))?;
        for (key, value) in params {
            url.query_pairs_mut().append_pair(key, value);
        }
        Ok(url)
    }

    pub async fn get(
        &self,
        path: &str,
        params: &[(String, String)],
        meta: &RequestMeta,
    ) -> Result<Value, GatewayError> {
        let (_, body) = self
            .execute(Method::GET, path, params, None, meta)
            .await?;
        Ok(body)
    }

    pub async fn post(
        &self,
        path: &str,
        body: &Value,
        meta: &RequestMeta,
    ) -> Result<(StatusCode, Value), GatewayError> {
        self.execute(Method::POST, path, &[], Some(body), meta).await
    }

    pub async fn patch(
        &self,
        path: &str,
        body: &Value,
        meta: &RequestMeta,
    ) -> Result<(StatusCode, Value), GatewayError> {
        self.execute(Method::PATCH, path, &[], Some(body), meta)
            .await
    }

    pub async fn put(
        &self,
        path: &str,
        body: &Value,
        meta: &RequestMeta,
    ) -> Result<(StatusCode, Value), GatewayError> {
        self.execute(Method::PUT, path, &[], Some(body), meta).await
    }

    pub async fn delete(
        &self,
        path: &str,
        meta: &RequestMeta,
    ) -> Result<StatusCode, GatewayError> {
        let (status, _) = self
            .execute(Method::DELETE, path, &[], None, meta)
            .await?;
        Ok(status)
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
        body: Option<&Value>,
        meta: &RequestMeta,
    ) -> Result<(StatusCode, Value), GatewayError> {
        let url = self.url(path, params)?;

        let mut request = self
            .http
            .request(method, url)
            .header(REQUEST_ID_HEADER, &meta.request_id);
        if let Some(key) = &meta.idempotency_key {
            request = request.header(IDEMPOTENCY_KEY_HEADER, key);
        }
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                GatewayError::Network(format!("request timed out: {err}"))
            } else {
                GatewayError::Network(err.to_string())
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| GatewayError::Network(err.to_string()))?;

        if status.is_success() {
            let body = if text.trim().is_empty() {
                Value::Null
            } else {
                serde_json::from_str(&text).map_err(|err| {
                    GatewayError::InvalidResponse(format!("non-JSON success body: {err}"))
                })?
            };
            return Ok((status, body));
        }

        let problem: Option<ProblemDetails> = serde_json::from_str(&text).ok();
        let detail = problem
            .as_ref()
            .map(|p| p.detail.clone())
            .unwrap_or_else(|| {
                if text.trim().is_empty() {
                    status.to_string()
                } else {
                    text.clone()
                }
            });

        Err(GatewayError::Api {
            status: status.as_u16(),
            detail,
            problem,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_meta_generated_when_absent() {
        let meta = RequestMeta::from_args(&json!({}), true);
        assert!(Uuid::parse_str(&meta.request_id).is_ok());
        assert!(meta.idempotency_key.is_some());

        let read = RequestMeta::from_args(&json!({}), false);
        assert!(read.idempotency_key.is_none());
    }

    #[test]
    fn test_meta_propagates_caller_values() {
        let args = json!({"requestId": "caller-req", "idempotencyKey": "caller-idem"});
        let meta = RequestMeta::from_args(&args, true);
        assert_eq!(meta.request_id, "caller-req");
        assert_eq!(meta.idempotency_key.as_deref(), Some("caller-idem"));
    }

    #[test]
    fn test_status_to_error_code_mapping() {
        for (status, code) in [
            (400u16, error_codes::VALIDATION_ERROR),
            (404, error_codes::NOT_FOUND),
            (409, error_codes::CONFLICT),
            (422, error_codes::VALIDATION_ERROR),
            (429, error_codes::RATE_LIMITED),
            (500, error_codes::API_ERROR),
        ] {
            let err = GatewayError::Api {
                status,
                detail: "detail".to_string(),
                problem: None,
            };
            let mcp: McpError = err.into();
            assert_eq!(mcp.code, code, "status {status}");
        }

        let net: McpError = GatewayError::Network("refused".to_string()).into();
        assert_eq!(net.code, error_codes::NETWORK_ERROR);
    }

    #[test]
    fn test_api_error_carries_problem_body() {
        let problem = ProblemDetails {
            problem_type: "https://devplan.dev/problems/conflict".to_string(),
            title: "Conflict".to_string(),
            status: 409,
            detail: "document with slug 'x' already exists in this scope".to_string(),
            instance: "/v1/documents".to_string(),
            request_id: "r".to_string(),
            errors: None,
            retry_after: None,
        };
        let err = GatewayError::Api {
            status: 409,
            detail: problem.detail.clone(),
            problem: Some(problem),
        };
        let mcp: McpError = err.into();
        let data = mcp.data.unwrap();
        assert_eq!(data["status"], 409);
        assert_eq!(data["problem"]["title"], "Conflict");
    }
}
