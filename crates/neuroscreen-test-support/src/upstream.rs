//! A stub HTTP upstream standing in for the chat API.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::{Json, Router};
use serde_json::Value;

/// One request received by the stub.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// Request path including the query.
    pub path: String,
    /// Value of the `x-goog-api-key` header.
    pub api_key: Option<String>,
    /// Parsed JSON body (`Null` if it was not JSON).
    pub body: Value,
}

#[derive(Clone)]
struct Shared {
    status: StatusCode,
    response: Value,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

/// A local HTTP server answering every request with a canned response.
pub struct StubUpstream {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    task: tokio::task::JoinHandle<()>,
}

impl StubUpstream {
    /// Starts a server that answers `status` with `response` as JSON.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start(status: u16, response: Value) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let shared = Shared {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            response,
            requests: Arc::clone(&requests),
        };
        let app = Router::new().fallback(capture).with_state(shared);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|e| panic!("failed to bind stub upstream: {e}"));
        let addr = listener
            .local_addr()
            .unwrap_or_else(|e| panic!("no local address: {e}"));
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            requests,
            task,
        }
    }

    /// Starts a server answering like a successful `generateContent` call
    /// with `text` as the only part.
    pub async fn gemini_reply(text: &str) -> Self {
        let body = serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        });
        Self::start(200, body).await
    }

    /// Base URL of the server, without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for StubUpstream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn capture(
    State(shared): State<Shared>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let request = CapturedRequest {
        path: uri
            .path_and_query()
            .map_or_else(|| uri.path().to_owned(), ToString::to_string),
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    };
    shared
        .requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(request);

    (shared.status, Json(shared.response))
}
