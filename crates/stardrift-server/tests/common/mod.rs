use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use stardrift_server::build_app;
use stardrift_server::config::ServerConfig;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestServer {
    pub addr: SocketAddr,
    _shutdown: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn new() -> Self {
        Self::from_config(ServerConfig::default()).await
    }

    pub async fn from_config(config: ServerConfig) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (app, _state) = build_app(config);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            _shutdown: handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

/// Connect and consume the registration frame, returning the stream and
/// the assigned slot id.
pub async fn ws_connect(url: &str) -> (WsStream, usize) {
    let (mut stream, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    let reg = ws_read_json(&mut stream).await;
    assert_eq!(reg["type"], "reg", "Expected registration, got: {reg}");
    let id = reg["data"]
        .as_str()
        .expect("reg data should be a string")
        .parse::<usize>()
        .expect("reg data should parse as a slot id");
    (stream, id)
}

/// Send a pre-built JSON value as a text frame.
pub async fn ws_send_json(stream: &mut WsStream, value: &Value) {
    stream
        .send(Message::Text(value.to_string().into()))
        .await
        .unwrap();
}

/// Send a raw text frame (for malformed-input tests).
pub async fn ws_send_text(stream: &mut WsStream, text: &str) {
    stream
        .send(Message::Text(text.to_string().into()))
        .await
        .unwrap();
}

/// Read the next text frame as JSON (5s timeout).
pub async fn ws_read_json(stream: &mut WsStream) -> Value {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str(text.as_str()).expect("Frame should be JSON");
                },
                Some(Ok(Message::Close(_))) => panic!("WebSocket closed unexpectedly"),
                Some(Err(e)) => panic!("WebSocket error: {e}"),
                None => panic!("WebSocket stream ended"),
                _ => continue,
            }
        }
    })
    .await
    .expect("Timed out waiting for WebSocket message")
}

/// Try to read a text frame as JSON, returning None on timeout.
pub async fn ws_try_read_json(stream: &mut WsStream, timeout_ms: u64) -> Option<Value> {
    tokio::time::timeout(Duration::from_millis(timeout_ms), async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str(text.as_str()).ok();
                },
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return None,
                _ => continue,
            }
        }
    })
    .await
    .ok()
    .flatten()
}
