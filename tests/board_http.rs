use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use okrserver::board::BoardService;
use okrserver::store::{MemoryStore, StoreError, TableStore};
use okrserver::web::{build_router, AppState};

fn seeded_store() -> MemoryStore {
    MemoryStore::from_seed(json!({
        "organizations": [
            { "id": "org-1", "name": "Acme" }
        ],
        "departments": [
            { "id": "dept-1", "name": "Engineering", "organization_id": "org-1" },
            { "id": "dept-2", "name": "Sales", "organization_id": "org-1" }
        ],
        "teams": [
            { "id": "team-1", "name": "Platform", "department_id": "dept-1" }
        ],
        "okrs": [
            { "id": "okr-1", "title": "Ship v2", "progress": 40, "status": "active", "team_id": "team-1" },
            { "id": "okr-2", "title": "Old plan", "progress": 100, "status": "completed", "team_id": "team-1" }
        ],
        "key_results": [
            { "id": "kr-1", "okr_id": "okr-1", "title": "Close 20 issues", "target_value": 20, "current_value": 8, "progress": 40, "unit": "count" }
        ],
        "profiles": []
    }))
    .unwrap()
    .with_user("user-1")
}

fn app() -> axum::Router {
    app_with(Arc::new(seeded_store()))
}

fn app_with(store: Arc<dyn TableStore>) -> axum::Router {
    build_router(Arc::new(AppState::new(BoardService::new(store))))
}

/// Serves the seeded rows but refuses every write.
struct WriteProtectedStore {
    inner: MemoryStore,
}

fn permission_denied() -> StoreError {
    StoreError::Rejected {
        status: 403,
        message: "permission denied".to_string(),
    }
}

#[async_trait]
impl TableStore for WriteProtectedStore {
    async fn select(&self, table: &str, order_by: Option<&str>) -> Result<Vec<Value>, StoreError> {
        self.inner.select(table, order_by).await
    }

    async fn select_okrs(&self, id: Option<&str>) -> Result<Vec<Value>, StoreError> {
        self.inner.select_okrs(id).await
    }

    async fn insert(&self, _table: &str, _rows: Vec<Value>) -> Result<Vec<Value>, StoreError> {
        Err(permission_denied())
    }

    async fn update(&self, _table: &str, _id: &str, _patch: Value) -> Result<(), StoreError> {
        Err(permission_denied())
    }

    async fn delete(&self, _table: &str, _id: &str) -> Result<(), StoreError> {
        Err(permission_denied())
    }

    async fn current_user_id(&self) -> Result<Option<String>, StoreError> {
        Ok(None)
    }
}

fn form_post(uri: &str, body: &'static str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

const VALID_OKR_FORM: &str = "title=Grow+revenue&description=&team_id=team-1&due_date=2025-03-31\
                              &kr_title=Sign+10+customers&kr_target=10&kr_unit=count";

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

#[tokio::test]
async fn test_hierarchy_endpoint_counts() {
    let response = app()
        .oneshot(Request::get("/api/hierarchy").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["stats"]["total_teams"], 1);
    assert_eq!(body["stats"]["total_okrs"], 2);
    assert_eq!(body["stats"]["active_okrs"], 1);
    assert_eq!(body["organizations"][0]["department_count"], 2);
}

#[tokio::test]
async fn test_create_okr_rejects_blank_title() {
    let payload = json!({
        "title": "   ",
        "team_id": "team-1",
        "key_results": [{ "title": "Anything", "target_value": 1 }]
    });
    let response = app()
        .oneshot(
            Request::post("/api/okrs")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_get_missing_okr_is_not_found() {
    let response = app()
        .oneshot(Request::get("/api/okrs/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_index_renders_board() {
    let response = app()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("Ship v2"));
    assert!(html.contains("8/20 count"));
    assert!(html.contains("2 Departments"));
    assert!(html.contains(r#"<option value="team-1">Platform</option>"#));
}

#[tokio::test]
async fn test_ui_create_okr_returns_refreshed_list() {
    let form = "title=Grow+revenue&description=&team_id=team-1&due_date=2025-03-31\
                &kr_title=Sign+10+customers&kr_target=10&kr_unit=count\
                &kr_title=&kr_target=&kr_unit=";
    let response = app()
        .oneshot(
            Request::post("/ui/okrs")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("Grow revenue"));
    assert!(html.contains("0/10 count"));
    assert!(html.contains("Ship v2"));
    assert!(html.contains("OKR created successfully"));
}

#[tokio::test]
async fn test_ui_create_okr_signals_form_reset() {
    let response = app().oneshot(form_post("/ui/okrs", VALID_OKR_FORM)).await.unwrap();

    assert_eq!(response.headers()["hx-trigger"], "okr-created");
}

#[tokio::test]
async fn test_create_okr_requires_a_key_result() {
    let payload = json!({ "title": "Grow NPS", "team_id": "team-1", "key_results": [] });
    let app = app();

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/okrs", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(Request::get("/api/okrs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_ui_edit_okr_changes_status() {
    let app = app();
    let response = app
        .clone()
        .oneshot(form_post(
            "/ui/okrs/okr-1/edit",
            "title=Ship+v3&description=Stable+release&status=completed&due_date=",
        ))
        .await
        .unwrap();

    let html = body_string(response).await;
    assert!(html.contains("Ship v3"));
    assert!(html.contains("OKR updated successfully"));

    let response = app
        .oneshot(Request::get("/api/okrs/okr-1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let okr = body_json(response).await;
    assert_eq!(okr["status"], "completed");
    assert_eq!(okr["progress"], 40.0);
    assert_eq!(okr["key_results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_ui_create_department_and_team() {
    let app = app();

    let response = app
        .clone()
        .oneshot(form_post(
            "/ui/departments",
            "name=Support&description=&organization_id=org-1",
        ))
        .await
        .unwrap();
    let html = body_string(response).await;
    assert!(html.contains("Support"));
    assert!(html.contains("3 Departments"));
    assert!(html.contains("Department created successfully"));

    let response = app
        .clone()
        .oneshot(form_post("/ui/teams", "name=Outbound&description=&department_id=dept-2"))
        .await
        .unwrap();
    let html = body_string(response).await;
    assert!(html.contains("Outbound"));
    assert!(html.contains("Team created successfully"));

    let response = app
        .oneshot(form_post("/ui/teams", "name=&description=&department_id=dept-2"))
        .await
        .unwrap();
    let html = body_string(response).await;
    assert!(html.contains("Failed to create team"));
}

#[tokio::test]
async fn test_ui_hierarchy_fragment() {
    let response = app()
        .oneshot(Request::get("/ui/hierarchy").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("Platform"));
    assert!(html.contains("2 OKRs"));
    assert!(html.contains("0 Teams"));
    assert!(html.contains("Total OKRs:</span> <strong>2</strong>"));
}

#[tokio::test]
async fn test_update_key_result_returns_refreshed_okrs() {
    let response = app()
        .oneshot(json_request(
            "PUT",
            "/api/key-results/kr-1",
            json!({ "current_value": 16, "progress": 80 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], "kr-1");
    let okr = body["records"]
        .as_array()
        .unwrap()
        .iter()
        .find(|okr| okr["id"] == "okr-1")
        .unwrap();
    assert_eq!(okr["key_results"][0]["current_value"], 16.0);
    assert_eq!(okr["key_results"][0]["progress"], 80.0);
}

#[tokio::test]
async fn test_rejected_writes_keep_previous_list() {
    let app = app_with(Arc::new(WriteProtectedStore { inner: seeded_store() }));

    let response = app
        .clone()
        .oneshot(form_post("/ui/okrs", VALID_OKR_FORM))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("hx-trigger").is_none());
    let html = body_string(response).await;
    assert!(html.contains("Failed to create OKR: permission denied"));
    assert!(html.contains("Ship v2"));
    assert!(!html.contains("Grow revenue"));

    let response = app
        .clone()
        .oneshot(form_post("/ui/okrs/okr-1/delete", ""))
        .await
        .unwrap();
    let html = body_string(response).await;
    assert!(html.contains("Failed to delete OKR: permission denied"));
    assert!(html.contains("Ship v2"));

    let response = app
        .oneshot(json_request("PUT", "/api/key-results/kr-1", json!({ "progress": 90 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "permission denied");
}

#[tokio::test]
async fn test_ui_delete_okr_removes_card() {
    let response = app()
        .oneshot(
            Request::post("/ui/okrs/okr-1/delete")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let html = body_string(response).await;
    assert!(!html.contains("Ship v2"));
    assert!(html.contains("Old plan"));
    assert!(html.contains("OKR deleted successfully"));
}

#[tokio::test]
async fn test_health_endpoints() {
    let response = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");

    let response = app()
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
