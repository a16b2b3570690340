//! In-process fake Connect server

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use connectapi::models::{Content, ContentUpdate, NewContent, User};
use connectapi::{ConnectClient, Settings, SettingsInput};
use openapi_client::models::{ContentListQuery, DeployRequest, TaskResponse};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const API_KEY: &str = "test-key";

type Shared = Arc<Mutex<FakeState>>;

/// Server-side state, inspectable from tests
pub struct FakeState {
    pub user: User,
    pub content: BTreeMap<String, Content>,
    pub uploads: Vec<(String, Vec<u8>)>,
    pub deploys: Vec<(String, String)>,
    pub task_script: Vec<TaskResponse>,
    pub task_polls: usize,
    pub requests: Vec<String>,

    /// Status returned by `POST /content/{guid}/deploy` instead of a task
    pub deploy_status: Option<StatusCode>,

    /// Number of task fetches answered before the task disappears
    pub task_missing_after: Option<usize>,

    next_id: u32,
}

impl FakeState {
    fn new() -> Self {
        let user: User = serde_json::from_value(json!({
            "guid": "d03a6b7a-c818-4e40-8ef9-84ca567f9671",
            "email": "publisher@example.com",
            "username": "publisher",
            "first_name": "Pat",
            "last_name": "Lee",
            "user_role": "publisher",
            "created_time": "2021-01-01T00:00:00Z",
            "updated_time": "2021-01-01T00:00:00Z",
            "active_time": "2024-05-01T09:00:00Z",
            "confirmed": true,
            "locked": false
        }))
        .unwrap();

        Self {
            user,
            content: BTreeMap::new(),
            uploads: Vec::new(),
            deploys: Vec::new(),
            task_script: vec![task(&["Bundle deployed"], true)],
            task_polls: 0,
            requests: Vec::new(),
            deploy_status: None,
            task_missing_after: None,
            next_id: 0,
        }
    }
}

/// A task status step for `FakeState::task_script`
pub fn task(output: &[&str], finished: bool) -> TaskResponse {
    TaskResponse {
        id: "task-1".to_string(),
        output: output.iter().map(|s| s.to_string()).collect(),
        finished,
        ..Default::default()
    }
}

pub struct FakeConnect {
    pub addr: SocketAddr,
    pub state: Shared,
    handle: JoinHandle<()>,
}

impl FakeConnect {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(FakeState::new()));

        let api = Router::new()
            .route("/user", get(current_user))
            .route("/content", get(list_content).post(create_content))
            .route(
                "/content/{guid}",
                get(get_content).patch(update_content).delete(delete_content),
            )
            .route("/content/{guid}/upload", post(upload_bundle))
            .route("/content/{guid}/deploy", post(deploy_bundle))
            .route("/tasks/{task_id}", get(get_task))
            .with_state(state.clone());
        let app = Router::new()
            .nest("/__api__/v1", api)
            .layer(middleware::from_fn_with_state(state.clone(), authorize));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn server_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn client_with_key(&self, api_key: &str) -> ConnectClient {
        let settings = Settings::resolve_with(
            SettingsInput {
                server: Some(self.server_url()),
                api_key: Some(api_key.to_string()),
                api_endpoint: None,
            },
            |_| None,
        )
        .unwrap();
        ConnectClient::new(settings).unwrap()
    }

    pub fn client(&self) -> ConnectClient {
        self.client_with_key(API_KEY)
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }
}

impl Drop for FakeConnect {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"code": 4, "error": format!("{} not found", what), "payload": null})),
    )
        .into_response()
}

async fn authorize(State(state): State<Shared>, request: Request, next: Next) -> Response {
    state
        .lock()
        .unwrap()
        .requests
        .push(format!("{} {}", request.method(), request.uri().path()));

    let expected = format!("Key {}", API_KEY);
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == expected)
        .unwrap_or(false);
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"code": 3, "error": "Invalid API key", "payload": null})),
        )
            .into_response();
    }

    next.run(request).await
}

async fn current_user(State(state): State<Shared>) -> Json<User> {
    Json(state.lock().unwrap().user.clone())
}

async fn list_content(
    State(state): State<Shared>,
    Query(query): Query<ContentListQuery>,
) -> Json<Vec<Content>> {
    let state = state.lock().unwrap();
    let items = state
        .content
        .values()
        .filter(|c| query.owner_guid.is_none() || c.owner_guid == query.owner_guid)
        .filter(|c| query.name.is_none() || c.name == query.name)
        .cloned()
        .collect();
    Json(items)
}

async fn create_content(State(state): State<Shared>, Json(new): Json<NewContent>) -> Json<Content> {
    let mut state = state.lock().unwrap();
    state.next_id += 1;

    let guid = uuid::Uuid::new_v4().to_string();
    let mut value = serde_json::to_value(&new).unwrap();
    let fields = value.as_object_mut().unwrap();
    fields.insert("guid".to_string(), json!(guid));
    fields
        .entry("name".to_string())
        .or_insert_with(|| json!(format!("content-{}", state.next_id)));
    fields.insert("owner_guid".to_string(), json!(state.user.guid));
    fields.insert("app_mode".to_string(), json!("unknown"));
    fields.insert("created_time".to_string(), json!("2024-01-01T00:00:00Z"));
    fields.insert("id".to_string(), json!(state.next_id.to_string()));

    let content: Content = serde_json::from_value(value).unwrap();
    state.content.insert(guid, content.clone());
    Json(content)
}

async fn get_content(State(state): State<Shared>, Path(guid): Path<String>) -> Response {
    match state.lock().unwrap().content.get(&guid) {
        Some(content) => Json(content.clone()).into_response(),
        None => not_found("Content"),
    }
}

async fn update_content(
    State(state): State<Shared>,
    Path(guid): Path<String>,
    Json(update): Json<ContentUpdate>,
) -> Response {
    match state.lock().unwrap().content.get_mut(&guid) {
        Some(content) => {
            content.apply_update(&update);
            Json(content.clone()).into_response()
        }
        None => not_found("Content"),
    }
}

async fn delete_content(State(state): State<Shared>, Path(guid): Path<String>) -> Response {
    match state.lock().unwrap().content.remove(&guid) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found("Content"),
    }
}

async fn upload_bundle(
    State(state): State<Shared>,
    Path(guid): Path<String>,
    body: Bytes,
) -> Response {
    let mut state = state.lock().unwrap();
    if !state.content.contains_key(&guid) {
        return not_found("Content");
    }
    state.uploads.push((guid, body.to_vec()));
    let bundle_id = format!("b-{}", state.uploads.len());
    Json(json!({"bundle_id": bundle_id, "bundle_size": body.len()})).into_response()
}

async fn deploy_bundle(
    State(state): State<Shared>,
    Path(guid): Path<String>,
    Json(request): Json<DeployRequest>,
) -> Response {
    let mut state = state.lock().unwrap();
    if !state.content.contains_key(&guid) {
        return not_found("Content");
    }
    if let Some(status) = state.deploy_status {
        return (
            status,
            Json(json!({"code": 17, "error": "Deployment unavailable", "payload": null})),
        )
            .into_response();
    }
    state.deploys.push((guid, request.bundle_id));
    Json(json!({"task_id": "task-1"})).into_response()
}

async fn get_task(State(state): State<Shared>, Path(task_id): Path<String>) -> Response {
    let mut state = state.lock().unwrap();
    if task_id != "task-1" || state.deploys.is_empty() {
        return not_found("Task");
    }
    if matches!(state.task_missing_after, Some(n) if state.task_polls >= n) {
        state.task_polls += 1;
        return not_found("Task");
    }
    let step = state.task_polls.min(state.task_script.len() - 1);
    state.task_polls += 1;
    Json(state.task_script[step].clone()).into_response()
}
