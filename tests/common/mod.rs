#![allow(dead_code)]

use axum::body::Body;
use futures_util::{SinkExt, StreamExt};
use http::{Method, Request};
use relayserver::config::Config;
use relayserver::db;
use relayserver::models::user::{CreateUser, User};
use relayserver::routes;
use relayserver::state::AppState;
use relayserver::storage;
use sqlx::SqlitePool;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long a test waits before deciding nothing is coming.
pub const QUIET: Duration = Duration::from_millis(300);

/// Test server that owns an in-memory SQLite pool and full AppState.
/// Each instance is isolated, so tests can run in parallel.
pub struct TestServer {
    pub state: AppState,
}

impl TestServer {
    pub async fn new() -> Self {
        Self::with_config(Config {
            storage_path: storage::temp_storage_path(),
            ..Config::default()
        })
        .await
    }

    pub async fn with_config(config: Config) -> Self {
        let pool = db::create_pool("sqlite::memory:")
            .await
            .expect("failed to create test pool");
        std::fs::create_dir_all(config.storage_path.join("avatars")).ok();

        Self {
            state: AppState::new(pool, &config),
        }
    }

    /// Axum router wired to this server's state for `oneshot()` calls.
    pub fn router(&self) -> axum::Router {
        routes::router(self.state.clone())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.state.db
    }

    /// Binds a TCP listener on port 0, spawns the server, returns `host:port`.
    pub async fn spawn(&self) -> String {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("127.0.0.1:{}", addr.port())
    }

    pub async fn create_user(&self, name: &str) -> User {
        db::users::create_user(
            self.pool(),
            &CreateUser {
                name: name.to_string(),
                email: Some(format!("{name}@example.com")),
                phone: None,
                description: None,
            },
        )
        .await
        .expect("failed to create test user")
    }
}

/// Router over a fresh in-memory server.
pub async fn test_app() -> axum::Router {
    TestServer::new().await.router()
}

// ---------------------------------------------------------------------------
// Request builder helpers
// ---------------------------------------------------------------------------

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: Method, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

/// One part of a multipart form: field name, optional filename, bytes.
pub type FormPart<'a> = (&'a str, Option<&'a str>, &'a [u8]);

pub fn multipart_form_request(uri: &str, parts: &[FormPart<'_>]) -> Request<Body> {
    let boundary = "relaytestboundary";
    let mut body = Vec::new();
    for (field, filename, bytes) in parts {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        match filename {
            Some(filename) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{field}\"\r\n\r\n").as_bytes(),
                );
            }
        }
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Single-file multipart body.
pub fn multipart_request(uri: &str, field: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    multipart_form_request(uri, &[(field, Some(filename), bytes)])
}

pub async fn parse_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// WebSocket helpers
// ---------------------------------------------------------------------------

/// Connect and consume the `hello` frame.
pub async fn ws_connect(addr: &str) -> WsClient {
    let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    let hello = next_event(&mut ws).await.expect("expected hello");
    assert_eq!(hello["event"], "hello");
    ws
}

pub async fn send_event(ws: &mut WsClient, event: &str, data: serde_json::Value) {
    let frame = serde_json::json!({ "event": event, "data": data });
    send_raw(ws, &frame.to_string()).await;
}

pub async fn send_raw(ws: &mut WsClient, text: &str) {
    ws.send(Message::Text(text.to_string().into())).await.unwrap();
}

/// Next JSON event, or `None` if nothing arrives within [`QUIET`].
pub async fn next_event(ws: &mut WsClient) -> Option<serde_json::Value> {
    loop {
        let msg = tokio::time::timeout(QUIET, ws.next()).await.ok()??.ok()?;
        if msg.is_text() {
            let text = msg.into_text().unwrap();
            return Some(serde_json::from_str(&text).unwrap());
        }
        if msg.is_close() {
            return None;
        }
    }
}

/// Identify and wait until the server has registered the name. Relies on
/// per-connection ordering: the self presence query is answered only after
/// the identify before it was processed.
pub async fn identify(ws: &mut WsClient, name: &str) {
    send_event(ws, "userjoined", serde_json::json!(name)).await;
    send_event(
        ws,
        "useronlineornot",
        serde_json::json!({ "sender": name, "receiver": name }),
    )
    .await;
    let ack = next_event(ws).await.expect("expected presence answer");
    assert_eq!(ack["event"], "yesonline", "identify as {name} failed: {ack}");
}

/// Wait until every event sent so far on this connection has been processed.
pub async fn sync(ws: &mut WsClient) {
    send_raw(ws, r#"{"event":"heartbeat"}"#).await;
    let ack = next_event(ws).await.expect("expected heartbeat ack");
    assert_eq!(ack["event"], "heartbeat_ack");
}
