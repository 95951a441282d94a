//! End-to-end REST API tests driving the full router over the in-memory
//! store: the request/response contract, cascade deletes, pagination totals,
//! and the atomic sprint item replacement path.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use devplan::config::ServerConfig;
use devplan::http_server::{create_router, AppState};
use devplan::memory_store::create_memory_store;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::util::ServiceExt;

fn app() -> Router {
    create_router(AppState::new(create_memory_store(), ServerConfig::default()))
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request(method, uri, body))
        .await
        .expect("request completes");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body is readable");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body is JSON")
    };
    (status, value)
}

async fn create_project(app: &Router, name: &str) -> Value {
    let (status, body) = send(app, "POST", "/v1/projects", Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[tokio::test]
async fn test_end_to_end_document_scenario() {
    let app = app();

    // Create project, create a freeform document without a slug.
    let project = create_project(&app, "Test Project").await;
    let project_id = project["id"].as_str().unwrap();

    let (status, document) = send(
        &app,
        "POST",
        "/v1/documents",
        Some(json!({
            "projectId": project_id,
            "kind": "freeform",
            "title": "Test Document",
            "content": "hello world"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(document["slug"], "test-document");
    assert_eq!(document["kind"], "freeform");

    // Get by id returns identical fields.
    let document_id = document["id"].as_str().unwrap();
    let (status, fetched) = send(&app, "GET", &format!("/v1/documents/{document_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, document);

    // List filtered by project returns exactly one with total = 1.
    let (status, page) = send(
        &app,
        "GET",
        &format!("/v1/documents?projectId={project_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
    assert_eq!(page["items"][0]["id"], document["id"]);
}

#[tokio::test]
async fn test_slug_conflict_is_scoped_to_project() {
    let app = app();
    let first = create_project(&app, "First").await;
    let second = create_project(&app, "Second").await;

    let payload = |project: &Value| {
        json!({
            "projectId": project["id"],
            "kind": "prd",
            "title": "Road Map",
            "content": ""
        })
    };

    let (status, _) = send(&app, "POST", "/v1/documents", Some(payload(&first))).await;
    assert_eq!(status, StatusCode::CREATED);

    // Same slug, same project: 409 naming the natural key.
    let (status, conflict) = send(&app, "POST", "/v1/documents", Some(payload(&first))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(conflict["title"], "Conflict");
    assert!(conflict["detail"].as_str().unwrap().contains("road-map"));

    // Same slug, different project: fine.
    let (status, _) = send(&app, "POST", "/v1/documents", Some(payload(&second))).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_feature_code_schema_failure_and_success() {
    let app = app();
    let project = create_project(&app, "Patterns").await;

    let (status, problem) = send(
        &app,
        "POST",
        "/v1/features",
        Some(json!({
            "projectId": project["id"],
            "featureId": "FT-001",
            "title": "Login"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(problem["title"], "Validation Error");
    assert!(problem["errors"]["featureId"]
        .as_str()
        .unwrap()
        .contains("FEAT-<digits>"));

    let (status, feature) = send(
        &app,
        "POST",
        "/v1/features",
        Some(json!({
            "projectId": project["id"],
            "featureId": "FEAT-001",
            "title": "Login"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(feature["featureId"], "FEAT-001");
    assert_eq!(feature["status"], "planned");
    assert_eq!(feature["version"], "0.1.0");
}

#[tokio::test]
async fn test_missing_parent_project_is_404() {
    let app = app();
    let (status, problem) = send(
        &app,
        "POST",
        "/v1/features",
        Some(json!({
            "projectId": "00000000-0000-4000-8000-000000000001",
            "featureId": "FEAT-001",
            "title": "Orphan"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(problem["title"], "Not Found");
}

#[tokio::test]
async fn test_sprint_lifecycle_with_items() {
    let app = app();
    let project = create_project(&app, "Sprints").await;

    let (status, sprint) = send(
        &app,
        "POST",
        "/v1/sprints",
        Some(json!({
            "projectId": project["id"],
            "sprintId": "SPR-001",
            "name": "Sprint One",
            "startDate": "2026-02-01T00:00:00Z",
            "endDate": "2026-02-14T00:00:00Z",
            "items": [
                { "text": "write code" },
                { "text": "review", "checked": true }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sprint["sprintId"], "SPR-001");
    assert_eq!(sprint["items"].as_array().unwrap().len(), 2);
    assert_eq!(sprint["items"][0]["position"], 0);

    let sprint_id = sprint["id"].as_str().unwrap();

    // PATCH with a replacement item list swaps the whole set.
    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/v1/sprints/{sprint_id}"),
        Some(json!({
            "status": "active",
            "items": [ { "text": "single remaining item" } ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "active");
    assert_eq!(updated["items"].as_array().unwrap().len(), 1);

    // Nested bulk mutation path.
    let (status, replaced) = send(
        &app,
        "PUT",
        &format!("/v1/sprints/{sprint_id}/items"),
        Some(json!({
            "items": [
                { "text": "a", "position": 2 },
                { "text": "b", "position": 1 }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let items = replaced["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    // Items come back in position order.
    assert_eq!(items[0]["text"], "b");
    assert_eq!(items[1]["text"], "a");

    // Date invariant holds against merged values on update.
    let (status, problem) = send(
        &app,
        "PATCH",
        &format!("/v1/sprints/{sprint_id}"),
        Some(json!({ "endDate": "2026-01-01T00:00:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(problem["title"], "Validation Failed");
}

#[tokio::test]
async fn test_project_delete_cascades_everywhere() {
    let app = app();
    let project = create_project(&app, "Doomed").await;
    let project_id = project["id"].as_str().unwrap().to_string();

    let mut document_ids = Vec::new();
    for i in 0..3 {
        let (status, doc) = send(
            &app,
            "POST",
            "/v1/documents",
            Some(json!({
                "projectId": project_id,
                "kind": "freeform",
                "title": format!("Doc {i}"),
                "content": ""
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        document_ids.push(doc["id"].as_str().unwrap().to_string());
    }

    let (_, feature) = send(
        &app,
        "POST",
        "/v1/features",
        Some(json!({
            "projectId": project_id,
            "featureId": "FEAT-007",
            "title": "Doomed feature"
        })),
    )
    .await;
    let feature_id = feature["id"].as_str().unwrap().to_string();

    let (_, sprint) = send(
        &app,
        "POST",
        "/v1/sprints",
        Some(json!({
            "projectId": project_id,
            "sprintId": "SPR-007",
            "name": "Doomed sprint",
            "items": [ { "text": "task" } ]
        })),
    )
    .await;
    let sprint_id = sprint["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "DELETE", &format!("/v1/projects/{project_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    for id in document_ids {
        let (status, _) = send(&app, "GET", &format!("/v1/documents/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
    let (status, _) = send(&app, "GET", &format!("/v1/features/{feature_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "GET", &format!("/v1/sprints/{sprint_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "GET", &format!("/v1/projects/{project_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pagination_window_and_total() {
    let app = app();
    let project = create_project(&app, "Paginated").await;
    let project_id = project["id"].as_str().unwrap();

    for i in 0..7 {
        let (status, _) = send(
            &app,
            "POST",
            "/v1/documents",
            Some(json!({
                "projectId": project_id,
                "kind": "freeform",
                "title": format!("Doc {i:02}"),
                "content": ""
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // total is the full match count, page length is min(limit, total - offset).
    let (_, page) = send(
        &app,
        "GET",
        &format!("/v1/documents?projectId={project_id}&limit=3&offset=0&sortBy=title&sortOrder=asc"),
        None,
    )
    .await;
    assert_eq!(page["total"], 7);
    assert_eq!(page["items"].as_array().unwrap().len(), 3);
    assert_eq!(page["items"][0]["title"], "Doc 00");

    let (_, tail) = send(
        &app,
        "GET",
        &format!("/v1/documents?projectId={project_id}&limit=3&offset=6&sortBy=title&sortOrder=asc"),
        None,
    )
    .await;
    assert_eq!(tail["total"], 7);
    assert_eq!(tail["items"].as_array().unwrap().len(), 1);
    assert_eq!(tail["items"][0]["title"], "Doc 06");

    let (_, empty) = send(
        &app,
        "GET",
        &format!("/v1/documents?projectId={project_id}&limit=3&offset=9"),
        None,
    )
    .await;
    assert_eq!(empty["total"], 7);
    assert_eq!(empty["items"].as_array().unwrap().len(), 0);

    // Out-of-range limit is a schema failure, reported field-first.
    let (status, problem) = send(
        &app,
        "GET",
        &format!("/v1/documents?projectId={project_id}&limit=101"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(problem["errors"]["limit"].is_string());
}

#[tokio::test]
async fn test_every_error_uses_problem_shape() {
    let app = app();

    let cases: Vec<(StatusCode, Value)> = vec![
        send(&app, "POST", "/v1/projects", Some(json!({}))).await,
        send(
            &app,
            "GET",
            &format!("/v1/projects/{}", uuid::Uuid::new_v4()),
            None,
        )
        .await,
    ];

    for (status, body) in cases {
        assert!(status.is_client_error());
        for key in ["type", "title", "status", "detail", "instance", "requestId"] {
            assert!(
                body.get(key).is_some(),
                "problem body missing '{key}': {body}"
            );
        }
    }
}

#[tokio::test]
async fn test_request_id_round_trip_on_errors() {
    let app = app();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/projects")
                .header("content-type", "application/json")
                .header("x-request-id", "corr-42")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers().get("x-request-id").unwrap(), "corr-42");
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/problem+json"
    );

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["requestId"], "corr-42");
    assert_eq!(body["instance"], "/v1/projects");
}
