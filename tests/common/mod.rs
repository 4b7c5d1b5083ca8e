//! Shared fixtures: an in-process QR store speaking the store's REST API.

#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    extract::{Path, State},
    http::{header, Method, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use qrverse::auth::CredentialProvider;
use qrverse::config::StoreConfig;
use qrverse::models::{CurrentUser, NewQrRecord, QrRecord, UpdateLinksRequest};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct MockState {
    records: Vec<QrRecord>,
    requests: Vec<RecordedRequest>,
    fail_next: Option<(StatusCode, String)>,
    next_id: u64,
}

type Shared = Arc<Mutex<MockState>>;

pub struct MockStore {
    pub base_url: String,
    state: Shared,
}

impl MockStore {
    pub async fn start() -> Self {
        let state: Shared = Arc::default();

        let app = Router::new()
            .route("/api/qrcodes", axum::routing::post(create_record))
            .route("/api/qrcodes/user", get(list_records))
            .route("/api/qrcodes/{id}", put(update_links).delete(delete_record))
            .route("/api/qrcodes/landing/{short_id}", get(resolve))
            .layer(middleware::from_fn_with_state(state.clone(), record_request))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn config(&self) -> StoreConfig {
        StoreConfig {
            base_url: self.base_url.clone(),
            public_base_url: "https://qr.example".to_string(),
            timeout_secs: 5,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn records(&self) -> Vec<QrRecord> {
        self.state.lock().unwrap().records.clone()
    }

    pub fn insert(&self, record: QrRecord) {
        self.state.lock().unwrap().records.push(record);
    }

    /// Answer the next request with `status` and a JSON `{"error": message}` body.
    pub fn fail_next(&self, status: StatusCode, message: &str) {
        self.state.lock().unwrap().fail_next = Some((status, message.to_string()));
    }
}

async fn record_request(State(state): State<Shared>, request: Request<Body>, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.unwrap_or_default();

    let failure = {
        let mut state = state.lock().unwrap();
        state.requests.push(RecordedRequest {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            authorization: parts
                .headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            body: serde_json::from_slice(&bytes).ok(),
        });
        state.fail_next.take()
    };

    if let Some((status, message)) = failure {
        return (status, Json(json!({ "error": message }))).into_response();
    }
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

async fn list_records(State(state): State<Shared>) -> Json<Vec<QrRecord>> {
    Json(state.lock().unwrap().records.clone())
}

async fn create_record(State(state): State<Shared>, Json(body): Json<NewQrRecord>) -> Json<QrRecord> {
    let mut state = state.lock().unwrap();
    state.next_id += 1;
    let record = QrRecord {
        id: format!("rec-{}", state.next_id),
        short_id: body.short_id,
        owner_id: body.user_id,
        name: body.name,
        kind: body.kind,
        url: Some(body.url),
        original_url: body.original_url,
        links: body.links,
        qr_image: body.qr_code,
        scans: body.scans,
        created_at: body.created_at,
    };
    state.records.push(record.clone());
    Json(record)
}

async fn update_links(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<UpdateLinksRequest>,
) -> Response {
    let mut state = state.lock().unwrap();
    match state.records.iter_mut().find(|r| r.id == id) {
        Some(record) => {
            record.links = Some(body.links);
            Json(record.clone()).into_response()
        }
        None => not_found(),
    }
}

async fn delete_record(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut state = state.lock().unwrap();
    let before = state.records.len();
    state.records.retain(|r| r.id != id);
    if state.records.len() == before {
        return not_found();
    }
    Json(json!({ "message": "QR code deleted" })).into_response()
}

async fn resolve(State(state): State<Shared>, Path(short_id): Path<String>) -> Response {
    let mut state = state.lock().unwrap();
    match state.records.iter_mut().find(|r| r.short_id == short_id) {
        Some(record) => {
            record.scans += 1;
            Json(json!({
                "name": record.name,
                "links": record.links,
                "originalUrl": record.original_url,
                "type": record.kind,
            }))
            .into_response()
        }
        None => not_found(),
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "QR code not found" })),
    )
        .into_response()
}

/// Hands out a new token on every call: `token-1`, `token-2`, ...
#[derive(Default)]
pub struct CountingCredentials {
    issued: AtomicUsize,
    signed_out: std::sync::atomic::AtomicBool,
}

impl CountingCredentials {
    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialProvider for CountingCredentials {
    async fn get_credential(&self) -> Result<String> {
        if self.signed_out.load(Ordering::SeqCst) {
            bail!("signed out");
        }
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("token-{n}"))
    }

    async fn current_user(&self) -> Result<CurrentUser> {
        Ok(CurrentUser {
            id: "user_1".to_string(),
            display_name: "Dana".to_string(),
        })
    }

    async fn sign_out(&self) -> Result<()> {
        self.signed_out.store(true, Ordering::SeqCst);
        Ok(())
    }
}
