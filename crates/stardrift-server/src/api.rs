use axum::http::HeaderMap;
use axum::response::Json;
use serde::Serialize;

/// Discovery response telling the browser client where to open its
/// WebSocket.
#[derive(Debug, Serialize)]
pub struct WsInfo {
    #[serde(rename = "wsURL")]
    pub ws_url: String,
}

/// GET /api/ws — derive the relay URL from the request's Host header so
/// the same build works behind any hostname or port mapping.
pub async fn ws_endpoint(headers: HeaderMap) -> Json<WsInfo> {
    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");

    Json(WsInfo {
        ws_url: format!("ws://{host}/ws"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[tokio::test]
    async fn ws_url_reflects_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::HOST,
            HeaderValue::from_static("game.example.com:8080"),
        );
        let Json(info) = ws_endpoint(headers).await;
        assert_eq!(info.ws_url, "ws://game.example.com:8080/ws");
    }

    #[tokio::test]
    async fn ws_url_falls_back_to_localhost() {
        let Json(info) = ws_endpoint(HeaderMap::new()).await;
        assert_eq!(info.ws_url, "ws://localhost/ws");
    }

    #[test]
    fn ws_info_serializes_with_legacy_key() {
        let info = WsInfo {
            ws_url: "ws://localhost/ws".to_string(),
        };
        let json = serde_json::to_string(&info).unwrap();
        assert_eq!(json, r#"{"wsURL":"ws://localhost/ws"}"#);
    }
}
