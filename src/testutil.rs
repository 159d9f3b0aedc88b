//! In-process stand-in for the backup endpoints, used by the HTTP tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::{delete, get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use reqwest::Url;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use crate::{
    api::{BackupRecord, OperationType},
    config::ConsoleConfig,
    console::confirm::Confirm,
};

pub const TEST_TOKEN: &str = "test-csrf-token";
pub const CSRF_FAILURE_PAGE: &str =
    "<html><body><h1>Forbidden (403)</h1><p>CSRF verification failed. Request aborted.</p></body></html>";
const RECENT_LIMIT: usize = 20;

#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Default)]
struct MockInner {
    records: Vec<BackupRecord>,
    next_id: i64,
    hits: HashMap<String, usize>,
    queries: HashMap<String, String>,
    json_bodies: HashMap<String, Value>,
    upload: Option<RecordedUpload>,
    token_fails: bool,
    token_failure: Option<(StatusCode, String)>,
    restore_failure: Option<String>,
    history_failure: Option<(StatusCode, String)>,
    history_delay: Option<Duration>,
    smart_failure: Option<(StatusCode, String)>,
}

#[derive(Clone, Default)]
struct MockState(Arc<Mutex<MockInner>>);

impl MockState {
    fn lock(&self) -> MutexGuard<'_, MockInner> {
        self.0.lock().unwrap()
    }
}

pub struct MockBackupServer {
    base_url: Url,
    state: MockState,
}

impl MockBackupServer {
    pub async fn start() -> Self {
        let state = MockState::default();
        state.lock().next_id = 1;

        let app = Router::new()
            .route("/backup/csrf-token/", get(csrf_token))
            .route("/backup/history/", get(history))
            .route("/backup/create/", post(create))
            .route("/backup/restore/", post(restore_upload))
            .route("/backup/restore-from-history/:id/", post(restore_from_history))
            .route("/backup/restore/history/:id/", post(smart_restore))
            .route("/backup/delete/:id/", delete(delete_backup))
            .layer(middleware::from_fn_with_state(state.clone(), track))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock server");
        let addr = listener.local_addr().expect("mock server address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock server");
        });

        Self {
            base_url: Url::parse(&format!("http://{addr}/")).expect("mock url"),
            state,
        }
    }

    pub fn base_url(&self) -> Url {
        self.base_url.clone()
    }

    pub fn token(&self) -> &'static str {
        TEST_TOKEN
    }

    /// Seeds `count` backups, newest (highest id) first.
    pub fn seed_records(&self, count: i64) {
        let mut inner = self.state.lock();
        for _ in 0..count {
            let id = inner.next_id;
            inner.next_id += 1;
            inner.records.insert(0, record(id, &format!("backup_{id}.json"), OperationType::Backup));
        }
    }

    pub fn records(&self) -> Vec<BackupRecord> {
        self.state.lock().records.clone()
    }

    pub fn hits(&self, path: &str) -> usize {
        self.state.lock().hits.get(path).copied().unwrap_or(0)
    }

    pub fn last_query(&self, path: &str) -> Option<String> {
        self.state.lock().queries.get(path).cloned()
    }

    pub fn last_json(&self, path: &str) -> Option<Value> {
        self.state.lock().json_bodies.get(path).cloned()
    }

    pub fn last_upload(&self) -> Option<RecordedUpload> {
        self.state.lock().upload.clone()
    }

    pub fn fail_token_endpoint(&self) {
        self.state.lock().token_fails = true;
    }

    /// Token endpoint answers `status` with a raw (non-envelope) body.
    pub fn fail_token_endpoint_with(&self, status: StatusCode, body: &str) {
        self.state.lock().token_failure = Some((status, body.to_string()));
    }

    pub fn fail_restores_with(&self, message: &str) {
        self.state.lock().restore_failure = Some(message.to_string());
    }

    pub fn fail_history_with(&self, status: StatusCode, body: &str) {
        self.state.lock().history_failure = Some((status, body.to_string()));
    }

    pub fn delay_history(&self, delay: Duration) {
        self.state.lock().history_delay = Some(delay);
    }

    pub fn fail_smart_restore_with(&self, status: StatusCode, body: &str) {
        self.state.lock().smart_failure = Some((status, body.to_string()));
    }
}

/// URL of a port nothing listens on.
pub async fn closed_port_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind probe");
    let addr = listener.local_addr().expect("probe address");
    drop(listener);
    Url::parse(&format!("http://{addr}/")).expect("closed port url")
}

pub fn test_config(base_url: Url) -> ConsoleConfig {
    ConsoleConfig {
        base_url,
        retry_base_delay: Duration::from_millis(1),
        ..ConsoleConfig::default()
    }
}

/// Records every prompt and answers with a fixed value.
#[derive(Clone, Default)]
pub struct RecordingConfirm {
    answer: bool,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl RecordingConfirm {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            prompts: Arc::default(),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Confirm for RecordingConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answer
    }
}

fn record(id: i64, file_name: &str, operation_type: OperationType) -> BackupRecord {
    BackupRecord {
        id,
        file_name: file_name.to_string(),
        date: "2024-05-01T10:00:00Z".to_string(),
        operation_type,
    }
}

async fn track(State(state): State<MockState>, request: Request, next: Next) -> Response {
    {
        let mut inner = state.lock();
        let path = request.uri().path().to_string();
        if let Some(query) = request.uri().query() {
            inner.queries.insert(path.clone(), query.to_string());
        }
        *inner.hits.entry(path).or_default() += 1;
    }
    next.run(request).await
}

fn check_csrf(headers: &HeaderMap, jar: &CookieJar) -> Result<(), Response> {
    let header = headers.get("x-csrftoken").and_then(|v| v.to_str().ok());
    let ajax = headers.get("x-requested-with").and_then(|v| v.to_str().ok());
    let cookie = jar.get("csrftoken").map(|c| c.value().to_string());

    if header == Some(TEST_TOKEN) && ajax == Some("XMLHttpRequest") && cookie.as_deref() == Some(TEST_TOKEN) {
        Ok(())
    } else {
        Err((StatusCode::FORBIDDEN, Html(CSRF_FAILURE_PAGE)).into_response())
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Html("<h1>Not Found</h1>")).into_response()
}

async fn csrf_token(State(state): State<MockState>, jar: CookieJar) -> Response {
    let failure = state.lock().token_failure.clone();
    if let Some((status, body)) = failure {
        return (status, Html(body)).into_response();
    }
    if state.lock().token_fails {
        return Json(json!({"status": "error", "message": "token service unavailable"})).into_response();
    }

    let jar = jar.add(Cookie::build(("csrftoken", TEST_TOKEN)).path("/"));
    (jar, Json(json!({"status": "success", "csrf_token": TEST_TOKEN}))).into_response()
}

#[derive(Deserialize)]
struct HistoryQuery {
    #[serde(default)]
    show_all: Option<String>,
}

async fn history(State(state): State<MockState>, Query(query): Query<HistoryQuery>) -> Response {
    let delay = state.lock().history_delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let inner = state.lock();
    if let Some((status, body)) = inner.history_failure.clone() {
        return (status, Html(body)).into_response();
    }

    let show_all = query.show_all.as_deref() == Some("true");
    let data: Vec<BackupRecord> = if show_all {
        inner.records.clone()
    } else {
        inner.records.iter().take(RECENT_LIMIT).cloned().collect()
    };

    Json(json!({"status": "success", "data": data})).into_response()
}

async fn create(
    State(state): State<MockState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = check_csrf(&headers, &jar) {
        return denied;
    }

    let mut inner = state.lock();
    inner.json_bodies.insert("/backup/create/".to_string(), body.clone());

    let id = inner.next_id;
    inner.next_id += 1;
    let name = body
        .get("backup_name")
        .and_then(Value::as_str)
        .map(|name| format!("{name}.json"))
        .unwrap_or_else(|| format!("backup_{id}.json"));
    inner.records.insert(0, record(id, &name, OperationType::Backup));

    Json(json!({"status": "success", "message": "Backup created"})).into_response()
}

async fn restore_upload(
    State(state): State<MockState>,
    headers: HeaderMap,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Response {
    if let Err(denied) = check_csrf(&headers, &jar) {
        return denied;
    }

    let mut upload = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("backup_file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        upload = Some(RecordedUpload {
            file_name,
            content_type,
            bytes,
        });
    }

    let mut inner = state.lock();
    let Some(upload) = upload else {
        return Json(json!({"status": "error", "message": "No file uploaded"})).into_response();
    };
    let file_name = upload.file_name.clone();
    inner.upload = Some(upload);

    if let Some(message) = inner.restore_failure.clone() {
        return Json(json!({"status": "error", "message": message})).into_response();
    }

    let id = inner.next_id;
    inner.next_id += 1;
    inner.records.insert(0, record(id, &file_name, OperationType::Restore));
    Json(json!({"status": "success", "message": "Restore completed"})).into_response()
}

async fn restore_from_history(
    State(state): State<MockState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Response {
    if let Err(denied) = check_csrf(&headers, &jar) {
        return denied;
    }

    let mut inner = state.lock();
    let Some(source) = inner.records.iter().find(|r| r.id == id).cloned() else {
        return not_found();
    };
    if let Some(message) = inner.restore_failure.clone() {
        return Json(json!({"status": "error", "message": message})).into_response();
    }

    let new_id = inner.next_id;
    inner.next_id += 1;
    inner
        .records
        .insert(0, record(new_id, &source.file_name, OperationType::Restore));
    Json(json!({"status": "success", "message": format!("Restored from {}", source.file_name)}))
        .into_response()
}

async fn smart_restore(
    State(state): State<MockState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(body): Json<Value>,
) -> Response {
    let failure = state.lock().smart_failure.clone();
    if let Some((status, body)) = failure {
        return (status, Html(body)).into_response();
    }

    if let Err(denied) = check_csrf(&headers, &jar) {
        return denied;
    }

    let mut inner = state.lock();
    if !inner.records.iter().any(|r| r.id == id) {
        return not_found();
    }
    inner
        .json_bodies
        .insert(format!("/backup/restore/history/{id}/"), body);

    Json(json!({
        "status": "success",
        "message": "Restore completed",
        "summary": {"created": 3, "updated": 2, "skipped": 1}
    }))
    .into_response()
}

async fn delete_backup(
    State(state): State<MockState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Response {
    if let Err(denied) = check_csrf(&headers, &jar) {
        return denied;
    }

    let mut inner = state.lock();
    let before = inner.records.len();
    inner.records.retain(|r| r.id != id);
    if inner.records.len() == before {
        return not_found();
    }
    Json(json!({"status": "success", "message": "Backup deleted"})).into_response()
}
