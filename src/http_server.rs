// HTTP REST API Server Implementation
// JSON API for project/document/feature/sprint CRUD, plus health and metrics
// endpoints. Every handler funnels failures through the problem-mapping layer
// so the error shape is identical regardless of which entity raised it.

use anyhow::Result;
use axum::{
    body::Body,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        DefaultBodyLimit, MatchedPath, Path, Query as AxumQuery, Request, State,
    },
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Extension, Router,
};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::ServerConfig,
    contracts::{Document, Feature, Page, Project, Sprint, SprintWithItems, Store},
    errors::{ApiError, ProblemDetails},
    idempotency::{IdempotencyCache, IdempotencyKey},
    metrics,
    rate_limit::{Decision, RateLimiter},
    requests::*,
    services::Services,
    validation,
};

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const IDEMPOTENCY_KEY_HEADER: &str = "x-idempotency-key";
pub const IDEMPOTENCY_REPLAYED_HEADER: &str = "x-idempotency-replayed";

// Global server start time for uptime reporting
static SERVER_START_TIME: Lazy<Instant> = Lazy::new(Instant::now);

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub store: Arc<dyn Store>,
    pub config: Arc<ServerConfig>,
    pub rate_limiter: RateLimiter,
    pub idempotency: IdempotencyCache,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: ServerConfig) -> Self {
        let rate_limiter = RateLimiter::new(config.rate_limit_window(), 16_384);
        let idempotency =
            IdempotencyCache::new(config.idempotency_ttl(), config.idempotency_max_entries);

        Self {
            services: Services::new(store.clone()),
            store,
            config: Arc::new(config),
            rate_limiter,
            idempotency,
        }
    }
}

/// Per-request identity, assigned by the outermost middleware and carried
/// through extensions into every handler and log line.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub request_id: String,
    pub path: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// The single point where an internal failure becomes a wire shape.
fn problem(ctx: &RequestContext, err: ApiError) -> ProblemDetails {
    if matches!(err, ApiError::Internal(_)) {
        warn!(request_id = %ctx.request_id, error = %err, "request failed internally");
    }
    err.to_problem(&ctx.path, &ctx.request_id)
}

fn body_rejection(ctx: &RequestContext, rejection: JsonRejection) -> ProblemDetails {
    problem(ctx, ApiError::schema_field("body", rejection.body_text()))
}

fn query_rejection(ctx: &RequestContext, rejection: QueryRejection) -> ProblemDetails {
    problem(ctx, ApiError::schema_field("query", rejection.body_text()))
}

fn parse_id(ctx: &RequestContext, raw: &str) -> Result<Uuid, ProblemDetails> {
    Uuid::parse_str(raw)
        .map_err(|_| problem(ctx, ApiError::schema_field("id", "must be a valid UUID")))
}

/// Create the full router with middleware stack applied
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/projects", post(create_project).get(list_projects))
        .route(
            "/projects/:id",
            get(get_project).patch(update_project).delete(delete_project),
        )
        .route("/documents", post(create_document).get(list_documents))
        .route(
            "/documents/:id",
            get(get_document)
                .patch(update_document)
                .delete(delete_document),
        )
        .route("/features", post(create_feature).get(list_features))
        .route(
            "/features/:id",
            get(get_feature).patch(update_feature).delete(delete_feature),
        )
        .route("/sprints", post(create_sprint).get(list_sprints))
        .route(
            "/sprints/:id",
            get(get_sprint).patch(update_sprint).delete(delete_sprint),
        )
        .route("/sprints/:id/items", put(replace_sprint_items))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            idempotency_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        .nest(&state.config.api_prefix, api)
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .route("/health/startup", get(health_ready))
        .route("/metrics", get(metrics_endpoint))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config))
                .layer(DefaultBodyLimit::max(state.config.max_body_bytes)),
        )
        .with_state(state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.cors_origin == "*" {
        return CorsLayer::permissive();
    }
    match config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(_) => {
            warn!(origin = %config.cors_origin, "invalid CORS origin, falling back to permissive");
            CorsLayer::permissive()
        }
    }
}

/// Start the HTTP server on the configured host and port
pub async fn start_server(state: AppState) -> Result<()> {
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let app = create_router(state);
    let listener = TcpListener::bind(&addr).await?;

    info!("devplan REST API listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

// Middleware

/// Assign or propagate `X-Request-Id` and echo it on every response.
async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let ctx = RequestContext {
        request_id: request_id.clone(),
        path: request.uri().path().to_string(),
    };
    request.extensions_mut().insert(ctx);

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(header::HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}

async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let start = Instant::now();
    let response = next.run(request).await;
    metrics::observe_request(&method, &route, response.status().as_u16(), start.elapsed());
    response
}

fn caller_key(request: &Request) -> String {
    for header_name in ["x-api-key", "x-forwarded-for"] {
        if let Some(value) = request
            .headers()
            .get(header_name)
            .and_then(|v| v.to_str().ok())
        {
            if !value.is_empty() {
                return value.to_string();
            }
        }
    }
    "anonymous".to_string()
}

async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let key = caller_key(&request);
    match state.rate_limiter.check(&key, state.config.rate_limit_max) {
        Decision::Allowed => next.run(request).await,
        Decision::Limited { retry_after_secs } => {
            let ctx = request
                .extensions()
                .get::<RequestContext>()
                .cloned()
                .unwrap_or_default();
            problem(&ctx, ApiError::RateLimited { retry_after_secs }).into_response()
        }
    }
}

/// Check the replay cache before a keyed mutation runs and record the
/// response afterwards. Successful responses only; failures always re-execute.
async fn idempotency_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let is_mutation =
        method == Method::POST || method == Method::PATCH || method == Method::PUT;
    let key = request
        .headers()
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    let (key, route) = match (is_mutation, key) {
        (true, Some(key)) => {
            let route = request
                .extensions()
                .get::<MatchedPath>()
                .map(|matched| matched.as_str().to_string())
                .unwrap_or_else(|| request.uri().path().to_string());
            (key, route)
        }
        _ => return next.run(request).await,
    };

    let cache_key = IdempotencyKey::new(method.as_str(), &route, &key);
    if let Some(stored) = state.idempotency.lookup(&cache_key).await {
        let status = StatusCode::from_u16(stored.status).unwrap_or(StatusCode::OK);
        let mut response = (
            status,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )],
            stored.body,
        )
            .into_response();
        response.headers_mut().insert(
            header::HeaderName::from_static(IDEMPOTENCY_REPLAYED_HEADER),
            HeaderValue::from_static("true"),
        );
        return response;
    }

    let response = next.run(request).await;
    if !response.status().is_success() {
        return response;
    }

    let (parts, body) = response.into_parts();
    match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => {
            state
                .idempotency
                .record(cache_key, parts.status.as_u16(), bytes.to_vec())
                .await;
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(err) => {
            warn!("failed to buffer response for idempotency recording: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// Health and metrics

async fn health_live() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: SERVER_START_TIME.elapsed().as_secs(),
    })
}

/// Readiness and startup probes: the store must answer within the configured
/// budget or the endpoint reports 503.
async fn health_ready(State(state): State<AppState>) -> Response {
    let probe = tokio::time::timeout(state.config.health_timeout(), state.store.ping()).await;
    let (status, text) = match probe {
        Ok(Ok(())) => (StatusCode::OK, "ready"),
        Ok(Err(_)) => (StatusCode::SERVICE_UNAVAILABLE, "store unavailable"),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "store probe timed out"),
    };

    (
        status,
        Json(HealthResponse {
            status: text.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: SERVER_START_TIME.elapsed().as_secs(),
        }),
    )
        .into_response()
}

async fn metrics_endpoint() -> Response {
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; version=0.0.4"),
        )],
        metrics::render(),
    )
        .into_response()
}

// Project handlers

async fn create_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Project>), ProblemDetails> {
    let Json(request) = payload.map_err(|rejection| body_rejection(&ctx, rejection))?;
    let input = validation::project::create(&request).map_err(|err| problem(&ctx, err))?;
    let project = state
        .services
        .projects
        .create(input)
        .await
        .map_err(|err| problem(&ctx, err))?;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn get_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<Json<Project>, ProblemDetails> {
    let id = parse_id(&ctx, &id)?;
    let project = state
        .services
        .projects
        .get(id)
        .await
        .map_err(|err| problem(&ctx, err))?;
    Ok(Json(project))
}

async fn list_projects(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    query: Result<AxumQuery<ProjectListQuery>, QueryRejection>,
) -> Result<Json<Page<Project>>, ProblemDetails> {
    let AxumQuery(query) = query.map_err(|rejection| query_rejection(&ctx, rejection))?;
    let options = validation::project::list(&query).map_err(|err| problem(&ctx, err))?;
    let page = state
        .services
        .projects
        .list(options)
        .await
        .map_err(|err| problem(&ctx, err))?;
    Ok(Json(page))
}

async fn update_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateProjectRequest>, JsonRejection>,
) -> Result<Json<Project>, ProblemDetails> {
    let id = parse_id(&ctx, &id)?;
    let Json(request) = payload.map_err(|rejection| body_rejection(&ctx, rejection))?;
    let patch = validation::project::update(&request).map_err(|err| problem(&ctx, err))?;
    let project = state
        .services
        .projects
        .update(id, patch)
        .await
        .map_err(|err| problem(&ctx, err))?;
    Ok(Json(project))
}

async fn delete_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ProblemDetails> {
    let id = parse_id(&ctx, &id)?;
    state
        .services
        .projects
        .delete(id)
        .await
        .map_err(|err| problem(&ctx, err))?;
    Ok(StatusCode::NO_CONTENT)
}

// Document handlers

async fn create_document(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    payload: Result<Json<CreateDocumentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Document>), ProblemDetails> {
    let Json(request) = payload.map_err(|rejection| body_rejection(&ctx, rejection))?;
    let input = validation::document::create(&request).map_err(|err| problem(&ctx, err))?;
    let document = state
        .services
        .documents
        .create(input)
        .await
        .map_err(|err| problem(&ctx, err))?;
    Ok((StatusCode::CREATED, Json(document)))
}

async fn get_document(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<Json<Document>, ProblemDetails> {
    let id = parse_id(&ctx, &id)?;
    let document = state
        .services
        .documents
        .get(id)
        .await
        .map_err(|err| problem(&ctx, err))?;
    Ok(Json(document))
}

async fn list_documents(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    query: Result<AxumQuery<DocumentListQuery>, QueryRejection>,
) -> Result<Json<Page<Document>>, ProblemDetails> {
    let AxumQuery(query) = query.map_err(|rejection| query_rejection(&ctx, rejection))?;
    let options = validation::document::list(&query).map_err(|err| problem(&ctx, err))?;
    let page = state
        .services
        .documents
        .list(options)
        .await
        .map_err(|err| problem(&ctx, err))?;
    Ok(Json(page))
}

async fn update_document(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateDocumentRequest>, JsonRejection>,
) -> Result<Json<Document>, ProblemDetails> {
    let id = parse_id(&ctx, &id)?;
    let Json(request) = payload.map_err(|rejection| body_rejection(&ctx, rejection))?;
    let patch = validation::document::update(&request).map_err(|err| problem(&ctx, err))?;
    let document = state
        .services
        .documents
        .update(id, patch)
        .await
        .map_err(|err| problem(&ctx, err))?;
    Ok(Json(document))
}

async fn delete_document(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ProblemDetails> {
    let id = parse_id(&ctx, &id)?;
    state
        .services
        .documents
        .delete(id)
        .await
        .map_err(|err| problem(&ctx, err))?;
    Ok(StatusCode::NO_CONTENT)
}

// Feature handlers

async fn create_feature(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    payload: Result<Json<CreateFeatureRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Feature>), ProblemDetails> {
    let Json(request) = payload.map_err(|rejection| body_rejection(&ctx, rejection))?;
    let input = validation::feature::create(&request).map_err(|err| problem(&ctx, err))?;
    let feature = state
        .services
        .features
        .create(input)
        .await
        .map_err(|err| problem(&ctx, err))?;
    Ok((StatusCode::CREATED, Json(feature)))
}

async fn get_feature(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<Json<Feature>, ProblemDetails> {
    let id = parse_id(&ctx, &id)?;
    let feature = state
        .services
        .features
        .get(id)
        .await
        .map_err(|err| problem(&ctx, err))?;
    Ok(Json(feature))
}

async fn list_features(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    query: Result<AxumQuery<FeatureListQuery>, QueryRejection>,
) -> Result<Json<Page<Feature>>, ProblemDetails> {
    let AxumQuery(query) = query.map_err(|rejection| query_rejection(&ctx, rejection))?;
    let options = validation::feature::list(&query).map_err(|err| problem(&ctx, err))?;
    let page = state
        .services
        .features
        .list(options)
        .await
        .map_err(|err| problem(&ctx, err))?;
    Ok(Json(page))
}

async fn update_feature(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateFeatureRequest>, JsonRejection>,
) -> Result<Json<Feature>, ProblemDetails> {
    let id = parse_id(&ctx, &id)?;
    let Json(request) = payload.map_err(|rejection| body_rejection(&ctx, rejection))?;
    let patch = validation::feature::update(&request).map_err(|err| problem(&ctx, err))?;
    let feature = state
        .services
        .features
        .update(id, patch)
        .await
        .map_err(|err| problem(&ctx, err))?;
    Ok(Json(feature))
}

async fn delete_feature(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ProblemDetails> {
    let id = parse_id(&ctx, &id)?;
    state
        .services
        .features
        .delete(id)
        .await
        .map_err(|err| problem(&ctx, err))?;
    Ok(StatusCode::NO_CONTENT)
}

// Sprint handlers

async fn create_sprint(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    payload: Result<Json<CreateSprintRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SprintWithItems>), ProblemDetails> {
    let Json(request) = payload.map_err(|rejection| body_rejection(&ctx, rejection))?;
    let input = validation::sprint::create(&request).map_err(|err| problem(&ctx, err))?;
    let sprint = state
        .services
        .sprints
        .create(input)
        .await
        .map_err(|err| problem(&ctx, err))?;
    Ok((StatusCode::CREATED, Json(sprint)))
}

async fn get_sprint(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<Json<SprintWithItems>, ProblemDetails> {
    let id = parse_id(&ctx, &id)?;
    let sprint = state
        .services
        .sprints
        .get(id)
        .await
        .map_err(|err| problem(&ctx, err))?;
    Ok(Json(sprint))
}

async fn list_sprints(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    query: Result<AxumQuery<SprintListQuery>, QueryRejection>,
) -> Result<Json<Page<Sprint>>, ProblemDetails> {
    let AxumQuery(query) = query.map_err(|rejection| query_rejection(&ctx, rejection))?;
    let options = validation::sprint::list(&query).map_err(|err| problem(&ctx, err))?;
    let page = state
        .services
        .sprints
        .list(options)
        .await
        .map_err(|err| problem(&ctx, err))?;
    Ok(Json(page))
}

async fn update_sprint(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateSprintRequest>, JsonRejection>,
) -> Result<Json<SprintWithItems>, ProblemDetails> {
    let id = parse_id(&ctx, &id)?;
    let Json(request) = payload.map_err(|rejection| body_rejection(&ctx, rejection))?;
    let patch = validation::sprint::update(&request).map_err(|err| problem(&ctx, err))?;
    let sprint = state
        .services
        .sprints
        .update(id, patch)
        .await
        .map_err(|err| problem(&ctx, err))?;
    Ok(Json(sprint))
}

async fn replace_sprint_items(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    payload: Result<Json<ReplaceSprintItemsRequest>, JsonRejection>,
) -> Result<Json<SprintWithItems>, ProblemDetails> {
    let id = parse_id(&ctx, &id)?;
    let Json(request) = payload.map_err(|rejection| body_rejection(&ctx, rejection))?;
    let items = validation::sprint::replace_items(&request).map_err(|err| problem(&ctx, err))?;
    let sprint = state
        .services
        .sprints
        .replace_items(id, items)
        .await
        .map_err(|err| problem(&ctx, err))?;
    Ok(Json(sprint))
}

async fn delete_sprint(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ProblemDetails> {
    let id = parse_id(&ctx, &id)?;
    state
        .services
        .sprints
        .delete(id)
        .await
        .map_err(|err| problem(&ctx, err))?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::create_memory_store;
    use axum::http::Request as HttpRequest;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    fn test_state() -> AppState {
        AppState::new(create_memory_store(), ServerConfig::default())
    }

    fn test_app() -> Router {
        create_router(test_state())
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body is readable");
        serde_json::from_slice(&bytes).expect("body is JSON")
    }

    fn post_json(uri: &str, body: Value) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    #[tokio::test]
    async fn test_health_live() {
        let response = test_app()
            .oneshot(
                HttpRequest::builder()
                    .uri("/health/live")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready_with_memory_store() {
        let response = test_app()
            .oneshot(
                HttpRequest::builder()
                    .uri("/health/ready")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let response = test_app()
            .oneshot(
                HttpRequest::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let response = test_app()
            .oneshot(
                HttpRequest::builder()
                    .uri("/health/live")
                    .header(REQUEST_ID_HEADER, "trace-me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(REQUEST_ID_HEADER).unwrap(),
            "trace-me"
        );
    }

    #[tokio::test]
    async fn test_request_id_is_generated_when_absent() {
        let response = test_app()
            .oneshot(
                HttpRequest::builder()
                    .uri("/health/live")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let header = response.headers().get(REQUEST_ID_HEADER).unwrap();
        assert!(Uuid::parse_str(header.to_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_create_project_returns_201() {
        let response = test_app()
            .oneshot(post_json("/v1/projects", json!({"name": "Test Project"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        assert_eq!(body["name"], "Test Project");
        assert!(body["id"].is_string());
        assert!(body["createdAt"].is_string());
    }

    #[tokio::test]
    async fn test_validation_problem_shape() {
        let response = test_app()
            .oneshot(post_json("/v1/projects", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/problem+json"
        );

        let body = body_json(response).await;
        assert_eq!(body["title"], "Validation Error");
        assert_eq!(body["status"], 400);
        assert_eq!(body["instance"], "/v1/projects");
        assert_eq!(body["errors"]["name"], "is required");
        assert!(body["requestId"].is_string());
    }

    #[tokio::test]
    async fn test_malformed_json_maps_to_problem() {
        let response = test_app()
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/v1/projects")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["title"], "Validation Error");
    }

    #[tokio::test]
    async fn test_get_unknown_project_is_404_problem() {
        let response = test_app()
            .oneshot(
                HttpRequest::builder()
                    .uri(format!("/v1/projects/{}", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["title"], "Not Found");
    }

    #[tokio::test]
    async fn test_invalid_path_id_is_schema_failure() {
        let response = test_app()
            .oneshot(
                HttpRequest::builder()
                    .uri("/v1/projects/not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["errors"]["id"], "must be a valid UUID");
    }

    #[tokio::test]
    async fn test_rate_limit_produces_429_with_retry_after() {
        let mut config = ServerConfig::default();
        config.rate_limit_max = 2;
        let app = create_router(AppState::new(create_memory_store(), config));

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(
                    HttpRequest::builder()
                        .uri("/v1/projects")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/v1/projects")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));

        let body = body_json(response).await;
        assert_eq!(body["title"], "Rate Limit Exceeded");
        assert!(body["retryAfter"].as_u64().unwrap() >= 1);
    }

    #[tokio::test]
    async fn test_idempotency_key_replays_create() {
        let app = test_app();

        let first = app
            .clone()
            .oneshot({
                let mut request = post_json("/v1/projects", json!({"name": "Once"}));
                request
                    .headers_mut()
                    .insert(IDEMPOTENCY_KEY_HEADER, HeaderValue::from_static("abc"));
                request
            })
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);
        let first_body = body_json(first).await;

        let second = app
            .clone()
            .oneshot({
                let mut request = post_json("/v1/projects", json!({"name": "Once"}));
                request
                    .headers_mut()
                    .insert(IDEMPOTENCY_KEY_HEADER, HeaderValue::from_static("abc"));
                request
            })
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CREATED);
        assert_eq!(
            second.headers().get(IDEMPOTENCY_REPLAYED_HEADER).unwrap(),
            "true"
        );
        let second_body = body_json(second).await;

        // Replay returns the original entity, not a fresh one.
        assert_eq!(first_body["id"], second_body["id"]);

        // An unkeyed retry creates a second project.
        let third = app
            .oneshot(post_json("/v1/projects", json!({"name": "Once"})))
            .await
            .unwrap();
        let third_body = body_json(third).await;
        assert_ne!(first_body["id"], third_body["id"]);
    }

    #[tokio::test]
    async fn test_sprint_date_order_is_422() {
        let app = test_app();
        let project = body_json(
            app.clone()
                .oneshot(post_json("/v1/projects", json!({"name": "P"})))
                .await
                .unwrap(),
        )
        .await;

        let response = app
            .oneshot(post_json(
                "/v1/sprints",
                json!({
                    "projectId": project["id"],
                    "sprintId": "SPR-001",
                    "name": "Backwards",
                    "startDate": "2026-03-01T00:00:00Z",
                    "endDate": "2026-02-01T00:00:00Z"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["title"], "Validation Failed");
    }
}
