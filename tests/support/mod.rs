//! Stateful in-process fake of the document service used by the integration tests.
#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use ezdoc::config::Config;
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::{net::TcpListener, task::JoinHandle};

pub const USERNAME: &str = "ada@example.com";
pub const API_KEY: &str = "key-ada";
pub const PASSWORD: &str = "correct horse";

#[derive(Default)]
struct FakeState {
    tokens: HashSet<String>,
    indices: BTreeMap<String, StoredIndex>,
    upload_calls: usize,
    extract_calls: usize,
}

struct StoredIndex {
    document: String,
    bytes: usize,
}

type Shared = Arc<Mutex<FakeState>>;

/// Running fake bound to an ephemeral local port; stops when dropped.
pub struct FakeService {
    base_url: String,
    state: Shared,
    handle: JoinHandle<()>,
}

impl FakeService {
    pub async fn start() -> Self {
        let state: Shared = Arc::default();
        let app = Router::new()
            .route("/auth", post(auth))
            .route("/config", post(config))
            .route("/upload_document", post(upload_document))
            .route("/extract_information", post(extract_information))
            .route("/indices_details", get(indices_details))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake service");
        let addr = listener.local_addr().expect("fake service address");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake service");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            handle,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> Config {
        Config::for_url(self.base_url.clone())
    }

    pub fn upload_calls(&self) -> usize {
        self.state.lock().unwrap().upload_calls
    }

    pub fn extract_calls(&self) -> usize {
        self.state.lock().unwrap().extract_calls
    }
}

impl Drop for FakeService {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn rejection(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

fn authorize(state: &Shared, headers: &HeaderMap) -> Result<(), Response> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    match token {
        Some(token) if state.lock().unwrap().tokens.contains(token) => Ok(()),
        _ => Err(rejection(StatusCode::UNAUTHORIZED, "Invalid or expired token")),
    }
}

async fn auth(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let username = body.get("username").and_then(Value::as_str);
    let api_key = body.get("api_key").and_then(Value::as_str);
    let password = body.get("password").and_then(Value::as_str);

    let valid =
        username == Some(USERNAME) && (api_key == Some(API_KEY) || password == Some(PASSWORD));
    if !valid {
        return rejection(StatusCode::OK, "Invalid username or api key");
    }

    let token = uuid::Uuid::new_v4().to_string();
    state.lock().unwrap().tokens.insert(token.clone());
    Json(json!({ "success": true, "message": "Authenticated", "token": token })).into_response()
}

async fn config(
    State(state): State<Shared>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    let mut received = false;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") && field.bytes().await.is_ok() {
            received = true;
        }
    }
    if !received {
        return rejection(StatusCode::BAD_REQUEST, "Configuration file is required");
    }
    Json(json!({ "success": true, "message": "Configuration updated" })).into_response()
}

async fn upload_document(
    State(state): State<Shared>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }

    let mut index_name = None;
    let mut overwrite = false;
    let mut document = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("document").to_string();
                if let Ok(bytes) = field.bytes().await {
                    document = Some((file_name, bytes.len()));
                }
            }
            Some("index_name") => index_name = field.text().await.ok(),
            Some("options") => {
                let options = field.text().await.unwrap_or_default();
                overwrite = serde_json::from_str::<Value>(&options)
                    .ok()
                    .and_then(|value| {
                        value
                            .get("overwrite")
                            .and_then(Value::as_str)
                            .map(|flag| flag == "yes")
                    })
                    .unwrap_or(false);
            }
            _ => {}
        }
    }

    let (Some(index_name), Some((file_name, bytes))) = (index_name, document) else {
        return rejection(StatusCode::BAD_REQUEST, "file and index_name are required");
    };

    let mut state = state.lock().unwrap();
    state.upload_calls += 1;
    if state.indices.contains_key(&index_name) && !overwrite {
        return rejection(
            StatusCode::OK,
            &format!("Index {index_name} already exists; set overwrite to replace it"),
        );
    }
    state.indices.insert(
        index_name,
        StoredIndex {
            document: file_name,
            bytes,
        },
    );
    Json(json!({ "success": true, "message": "Document indexed", "indexed": true })).into_response()
}

async fn extract_information(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    let query = body.get("query").and_then(Value::as_str).unwrap_or_default();
    let index_name = body
        .get("index_name")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let mut state = state.lock().unwrap();
    state.extract_calls += 1;
    let Some(index) = state.indices.get(index_name) else {
        return rejection(StatusCode::OK, &format!("Index {index_name} not found"));
    };
    let answer = format!("Answer to '{query}' from {}", index.document);
    Json(json!({ "success": true, "message": "Information extracted", "answer": answer }))
        .into_response()
}

async fn indices_details(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    let state = state.lock().unwrap();
    let details: Vec<Value> = state
        .indices
        .iter()
        .map(|(name, index)| {
            json!({
                "index_name": name,
                "document": index.document,
                "bytes": index.bytes,
            })
        })
        .collect();
    Json(json!({ "success": true, "indices_details": details })).into_response()
}
