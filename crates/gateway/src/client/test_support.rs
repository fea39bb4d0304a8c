// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for client-side tests: a programmable loopback backend
//! and a fake navigator.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::client::dispatch::Dispatcher;
use crate::client::refresh::RefreshCoordinator;
use crate::client::session::{Navigator, SessionHandler};
use crate::client::ExclusionSet;
use crate::credential::{CredentialStore, MemoryStore};

/// The routing parameter used by all test backends.
pub const ROUTE_PARAM: &str = "gofor";

/// Programmable stand-in for the remote PHP backend.
///
/// One endpoint, routed on the `gofor` field, like the real thing. Data
/// operations succeed only when the bearer token equals `good_token`;
/// the refresh operation behaves per the knobs below.
pub struct MockBackend {
    pub good_token: String,
    /// HTTP status for the refresh exchange (200 = success).
    pub refresh_status: u16,
    /// Delay before the refresh exchange responds, to hold the gate open.
    pub refresh_delay: Duration,
    /// Field name carrying the new token in the refresh response. Set to
    /// something else to simulate a malformed response.
    pub refresh_token_field: String,
    /// When set, data operations 401 even with the freshest token —
    /// simulates a backend that keeps rejecting after a refresh.
    pub reject_all_data_ops: bool,
    pub refresh_calls: AtomicU32,
    /// Every request seen: (operation, Authorization header if any).
    pub auth_seen: Mutex<Vec<(String, Option<String>)>>,
    /// Multipart uploads seen: (Content-Type header, body as text).
    pub multipart_seen: Mutex<Vec<(String, String)>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            good_token: "fresh-token".to_owned(),
            refresh_status: 200,
            refresh_delay: Duration::from_millis(0),
            refresh_token_field: "token".to_owned(),
            reject_all_data_ops: false,
            refresh_calls: AtomicU32::new(0),
            auth_seen: Mutex::new(Vec::new()),
            multipart_seen: Mutex::new(Vec::new()),
        }
    }
}

impl MockBackend {
    pub fn refresh_call_count(&self) -> u32 {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// The most recent multipart upload, if any.
    pub fn last_multipart(&self) -> Option<(String, String)> {
        self.multipart_seen.lock().ok().and_then(|seen| seen.last().cloned())
    }

    /// Authorization headers captured for a given operation.
    pub fn auth_for(&self, operation: &str) -> Vec<Option<String>> {
        self.auth_seen
            .lock()
            .map(|seen| {
                seen.iter()
                    .filter(|(op, _)| op == operation)
                    .map(|(_, auth)| auth.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn respond(&self, operation: String, auth: Option<String>) -> axum::response::Response {
        if let Ok(mut seen) = self.auth_seen.lock() {
            seen.push((operation.clone(), auth.clone()));
        }

        if operation == "refresh_token" {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.refresh_delay).await;
            if self.refresh_status != 200 {
                let status = StatusCode::from_u16(self.refresh_status)
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                return (status, Json(serde_json::json!({ "message": "refresh rejected" })))
                    .into_response();
            }
            let mut body = serde_json::Map::new();
            body.insert(
                self.refresh_token_field.clone(),
                serde_json::Value::String(self.good_token.clone()),
            );
            return Json(serde_json::Value::Object(body)).into_response();
        }

        let expected = format!("Bearer {}", self.good_token);
        match auth {
            _ if self.reject_all_data_ops => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "message": "unauthorized" })),
            )
                .into_response(),
            Some(header) if header == expected => {
                Json(serde_json::json!({ "status": "success", "operation": operation }))
                    .into_response()
            }
            _ => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "message": "unauthorized" })),
            )
                .into_response(),
        }
    }
}

fn auth_header(headers: &HeaderMap) -> Option<String> {
    headers.get("authorization").and_then(|v| v.to_str().ok()).map(str::to_owned)
}

async fn handle_get(
    State(b): State<Arc<MockBackend>>,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> axum::response::Response {
    let operation = params
        .iter()
        .find(|(k, _)| k == ROUTE_PARAM)
        .map(|(_, v)| v.clone())
        .unwrap_or_default();
    b.respond(operation, auth_header(&headers)).await
}

async fn handle_post(
    State(b): State<Arc<MockBackend>>,
    headers: HeaderMap,
    body: Bytes,
) -> axum::response::Response {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();

    let operation = if content_type.starts_with("multipart/form-data") {
        let text = String::from_utf8_lossy(&body).into_owned();
        let operation = form_field(&text, ROUTE_PARAM).unwrap_or_default();
        if let Ok(mut seen) = b.multipart_seen.lock() {
            seen.push((content_type, text));
        }
        operation
    } else {
        serde_json::from_slice::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get(ROUTE_PARAM).and_then(|f| f.as_str()).map(str::to_owned))
            .unwrap_or_default()
    };
    b.respond(operation, auth_header(&headers)).await
}

/// Pull one text field out of a raw multipart body. Lenient enough for
/// test fixtures; not a general parser.
fn form_field(body: &str, name: &str) -> Option<String> {
    let marker = format!("name=\"{name}\"");
    let after = &body[body.find(&marker)? + marker.len()..];
    let after = &after[after.find("\r\n\r\n")? + 4..];
    Some(after[..after.find("\r\n")?].to_owned())
}

/// Bind the mock backend on an ephemeral loopback port; returns its URL.
pub async fn spawn_backend(backend: Arc<MockBackend>) -> anyhow::Result<String> {
    let router =
        Router::new().route("/", get(handle_get).post(handle_post)).with_state(backend);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://{addr}/"))
}

/// Navigator that records where it was sent.
pub struct FakeNavigator {
    path: Mutex<String>,
    navigations: AtomicU32,
}

impl FakeNavigator {
    pub fn at(path: &str) -> Arc<Self> {
        Arc::new(Self { path: Mutex::new(path.to_owned()), navigations: AtomicU32::new(0) })
    }

    pub fn navigation_count(&self) -> u32 {
        self.navigations.load(Ordering::SeqCst)
    }
}

impl Navigator for FakeNavigator {
    fn current_path(&self) -> String {
        self.path.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn navigate(&self, path: &str) {
        self.navigations.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut p) = self.path.lock() {
            *p = path.to_owned();
        }
    }
}

/// A fully wired coordinator over a fresh in-memory store.
pub struct Rig {
    pub store: Arc<MemoryStore>,
    pub navigator: Arc<FakeNavigator>,
    pub dispatcher: Arc<Dispatcher>,
    pub coordinator: Arc<RefreshCoordinator>,
    pub backend: Arc<MockBackend>,
}

pub async fn rig(backend: MockBackend) -> anyhow::Result<Rig> {
    rig_with_timeout(backend, Duration::from_secs(5)).await
}

/// Same wiring with a caller-chosen dispatch timeout, for tests that make
/// the backend outlive it.
pub async fn rig_with_timeout(backend: MockBackend, timeout: Duration) -> anyhow::Result<Rig> {
    let backend = Arc::new(backend);
    let base_url = spawn_backend(Arc::clone(&backend)).await?;

    let store = Arc::new(MemoryStore::new());
    let store_dyn: Arc<dyn CredentialStore> = Arc::clone(&store) as _;
    let navigator = FakeNavigator::at("/dashboard");

    let dispatcher = Arc::new(Dispatcher::new(
        base_url,
        ROUTE_PARAM,
        timeout,
        Arc::clone(&store_dyn),
        ExclusionSet::default(),
    ));
    let session = Arc::new(SessionHandler::new(
        Arc::clone(&store_dyn),
        Arc::clone(&navigator) as Arc<dyn Navigator>,
    ));
    let coordinator = Arc::new(RefreshCoordinator::new(
        Arc::clone(&dispatcher),
        store_dyn,
        session,
        Duration::from_secs(7 * 86_400),
    ));

    Ok(Rig { store, navigator, dispatcher, coordinator, backend })
}
