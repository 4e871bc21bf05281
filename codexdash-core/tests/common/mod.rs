//! In-process fixture server for integration tests
//!
//! Serves the REST snapshot endpoints from canned data and a `/ws/events`
//! socket whose frames are pushed by the test.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use codexdash_core::client::StreamConfig;
use codexdash_core::config::ServerConfig;
use codexdash_core::SnapshotClient;
use serde_json::{json, Value};
use tokio::sync::{broadcast, watch};

pub const WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    /// Close the socket from the server side
    Close,
}

#[derive(Clone)]
pub struct FixtureState {
    /// `(path, raw query)` of every snapshot request received
    requests: Arc<Mutex<Vec<(String, Option<String>)>>>,
    dispatched: Arc<Mutex<Vec<Value>>>,
    broken: Arc<AtomicBool>,
    untimed: Arc<AtomicBool>,
    frames: broadcast::Sender<Frame>,
    connections: Arc<watch::Sender<usize>>,
    disconnections: Arc<watch::Sender<usize>>,
}

impl FixtureState {
    fn new() -> Self {
        let (frames, _) = broadcast::channel(64);
        Self {
            requests: Arc::default(),
            dispatched: Arc::default(),
            broken: Arc::default(),
            untimed: Arc::default(),
            frames,
            connections: Arc::new(watch::channel(0).0),
            disconnections: Arc::new(watch::channel(0).0),
        }
    }

    fn record(&self, path: &str, query: Option<String>) {
        self.requests
            .lock()
            .unwrap()
            .push((path.to_string(), query));
    }

    fn is_broken(&self) -> bool {
        self.broken.load(Ordering::SeqCst)
    }
}

pub struct Fixture {
    pub addr: SocketAddr,
    state: FixtureState,
}

impl Fixture {
    pub async fn spawn() -> Self {
        codexdash_core::logging::init_test();
        let state = FixtureState::new();
        let app = Router::new()
            .route("/api/health", get(health))
            .route("/api/agents", get(agents))
            .route("/api/jobs", get(jobs))
            .route("/api/jobs/:job_id", get(job_detail))
            .route("/api/events", get(events))
            .route("/api/doctor", get(doctor))
            .route("/api/dispatch", post(dispatch))
            .route("/ws/events", get(ws_events))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            base_url: self.base_url(),
            timeout_secs: 5,
        }
    }

    pub fn client(&self) -> SnapshotClient {
        SnapshotClient::new(&self.server_config()).unwrap()
    }

    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig::new(StreamConfig::url_for_server(&self.base_url()).unwrap())
    }

    /// Make every list endpoint fail: jobs with a 500, the rest with bad JSON
    pub fn break_snapshots(&self) {
        self.state.broken.store(true, Ordering::SeqCst);
    }

    /// Append a stored row with null `ts` and `type` to the events page
    pub fn serve_untimed_events(&self) {
        self.state.untimed.store(true, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<(String, Option<String>)> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn queries_for(&self, path: &str) -> Vec<Option<String>> {
        self.requests()
            .into_iter()
            .filter(|(p, _)| p == path)
            .map(|(_, q)| q)
            .collect()
    }

    pub fn dispatched(&self) -> Vec<Value> {
        self.state.dispatched.lock().unwrap().clone()
    }

    pub fn push(&self, frame: Frame) {
        let _ = self.state.frames.send(frame);
    }

    pub fn push_text(&self, text: &str) {
        self.push(Frame::Text(text.to_string()));
    }

    pub fn push_event(&self, event: Value) {
        self.push_text(&event.to_string());
    }

    pub async fn wait_connections(&self, count: usize) {
        let mut rx = self.state.connections.subscribe();
        tokio::time::timeout(WAIT, rx.wait_for(|n| *n >= count))
            .await
            .expect("timed out waiting for stream connection")
            .unwrap();
    }

    pub async fn wait_disconnections(&self, count: usize) {
        let mut rx = self.state.disconnections.subscribe();
        tokio::time::timeout(WAIT, rx.wait_for(|n| *n >= count))
            .await
            .expect("timed out waiting for stream disconnect")
            .unwrap();
    }

    pub fn connections(&self) -> usize {
        *self.state.connections.borrow()
    }
}

/// An address nothing listens on
pub fn closed_server_config() -> ServerConfig {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    ServerConfig {
        base_url: format!("http://{}", addr),
        timeout_secs: 2,
    }
}

pub fn agents_fixture() -> Value {
    json!([
        {"agent": "alpha", "status": "running", "last_seen": 1_700_000_003_000i64, "pane_id": "%1", "model": "gpt-5"},
        {"agent": "beta", "status": null}
    ])
}

pub fn jobs_fixture() -> Value {
    json!([
        {"job_id": "job-1", "agent": "alpha", "status": "running", "prompt_tokens_exact": 10, "completion_tokens_est": 5},
        {"job_id": "job-2", "agent": "beta", "status": "done", "prompt_tokens_est": 7},
        {"job_id": "job-3", "status": "error", "total_tokens_exact": 3}
    ])
}

pub fn events_fixture() -> Value {
    json!([
        {"id": 12, "ts": 1_700_000_003_000i64, "type": "pane_output", "agent": "alpha", "text": "hi", "total_tokens_est": 4},
        {"id": 11, "ts": 1_700_000_002_000i64, "type": "dispatch", "agent": "beta", "job_id": "job-2"}
    ])
}

async fn health() -> Json<Value> {
    Json(json!({"ok": true, "ts": 1_700_000_000_000i64}))
}

async fn agents(State(state): State<FixtureState>) -> Response {
    state.record("/api/agents", None);
    if state.is_broken() {
        return "not json".into_response();
    }
    Json(agents_fixture()).into_response()
}

async fn jobs(State(state): State<FixtureState>, RawQuery(query): RawQuery) -> Response {
    state.record("/api/jobs", query);
    if state.is_broken() {
        return (StatusCode::INTERNAL_SERVER_ERROR, "database locked").into_response();
    }
    // Returns every job regardless of the query.
    Json(jobs_fixture()).into_response()
}

async fn job_detail(State(state): State<FixtureState>, Path(job_id): Path<String>) -> Response {
    state.record(&format!("/api/jobs/{}", job_id), None);
    match job_id.as_str() {
        "missing" => Json(json!({"job": null, "events": []})).into_response(),
        "gone" => (StatusCode::NOT_FOUND, "no such job").into_response(),
        "boom" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        "untimed" => Json(json!({
            "job": {"job_id": job_id, "agent": "beta", "status": "running"},
            "events": [
                {"ts": 5, "type": "pane_output", "job_id": job_id, "text": "kept"},
                {"ts": null, "type": null, "job_id": job_id, "text": "also kept"}
            ]
        }))
        .into_response(),
        _ => Json(json!({
            "job": {"job_id": job_id, "agent": "alpha", "status": "done", "duration_ms": 65_000},
            "events": [
                {"ts": 1, "type": "dispatch", "job_id": job_id, "prompt_text": "summarize"},
                {"ts": 2, "type": "pane_output", "job_id": job_id, "text": "line one", "sub_agent": "reviewer"},
                {"ts": 3, "type": "controller_output", "job_id": job_id, "text": "line two", "sub_agent": "planner"},
                {"ts": 4, "type": "pane_output", "job_id": job_id, "sub_agent": "reviewer"}
            ]
        }))
        .into_response(),
    }
}

async fn events(State(state): State<FixtureState>, RawQuery(query): RawQuery) -> Response {
    state.record("/api/events", query);
    if state.is_broken() {
        return "[{\"ts\": ".into_response();
    }
    let mut page = events_fixture();
    if state.untimed.load(Ordering::SeqCst) {
        if let Some(rows) = page.as_array_mut() {
            rows.push(json!({"id": 10, "ts": null, "type": null, "agent": "beta", "text": "untimed"}));
        }
    }
    Json(page).into_response()
}

async fn doctor(State(state): State<FixtureState>) -> Response {
    state.record("/api/doctor", None);
    if state.is_broken() {
        return (StatusCode::BAD_GATEWAY, "tmux unavailable").into_response();
    }
    Json(json!({
        "agents": {
            "alpha": {"pane_id": "%1", "window_name": "alpha", "responsive": true, "auth_needed": false, "mode": "codex"},
            "beta": {"pane_id": null, "responsive": false, "auth_needed": true}
        }
    }))
    .into_response()
}

async fn dispatch(State(state): State<FixtureState>, Json(body): Json<Value>) -> Json<Value> {
    let job_id = body.get("job_id").cloned().unwrap_or(Value::Null);
    state.dispatched.lock().unwrap().push(body);
    Json(json!({"ok": true, "pid": 4242, "job_id": job_id}))
}

async fn ws_events(ws: WebSocketUpgrade, State(state): State<FixtureState>) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, state))
}

async fn serve_socket(mut socket: WebSocket, state: FixtureState) {
    let mut frames = state.frames.subscribe();
    state.connections.send_modify(|n| *n += 1);

    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Ok(Frame::Text(text)) => {
                    if socket.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Ok(Frame::Binary(bytes)) => {
                    if socket.send(Message::Binary(bytes)).await.is_err() {
                        break;
                    }
                }
                Ok(Frame::Close) => {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
                Err(_) => break,
            },
            message = socket.recv() => match message {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    state.disconnections.send_modify(|n| *n += 1);
}
