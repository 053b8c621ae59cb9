use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use stardrift_core::net::messages::{ClientMessage, ServerMessage};
use stardrift_core::net::protocol::{
    MAX_MESSAGE_SIZE, ProtocolError, decode_client_message, encode_server_message,
};
use stardrift_core::player::PlayerId;

use crate::state::{AppState, ConnectionGuard};
use crate::universe_manager::UniverseId;

pub async fn ws_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Result<axum::response::Response, StatusCode> {
    let max_ws = state.config.limits.max_ws_connections;
    let current = state.ws_connection_count.load(Ordering::Relaxed);
    if current >= max_ws {
        tracing::warn!(current, max = max_ws, "WS connection limit reached");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, state))
        .into_response())
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let _guard = ConnectionGuard::new(Arc::clone(&state.ws_connection_count));
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let (tx, rx) = mpsc::channel::<Utf8Bytes>(state.config.limits.player_message_buffer);

    let (universe_id, player_id) = {
        let mut universes = state.universes.write().await;
        universes.place_connection(tx)
    };

    // Registration goes straight down the socket before the writer task
    // takes over, so the client learns its slot id first.
    let reg = ServerMessage::Reg(player_id.to_string());
    let sent = match encode_server_message(&reg) {
        Ok(text) => ws_sender.send(Message::Text(Utf8Bytes::from(text))).await.is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode registration");
            false
        },
    };
    if !sent {
        let mut universes = state.universes.write().await;
        universes.remove_player(universe_id, player_id);
        return;
    }

    spawn_writer(ws_sender, rx);

    read_loop(&mut ws_receiver, &state, universe_id, player_id).await;

    // Player disconnected — clean up
    let mut universes = state.universes.write().await;
    universes.remove_player(universe_id, player_id);
    drop(universes);

    tracing::info!(universe = universe_id, player = player_id, "Player disconnected");
}

fn spawn_writer(
    mut ws_sender: futures::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Utf8Bytes>,
) {
    tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if ws_sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });
}

/// Per-connection rate limiter (token bucket).
struct RateLimiter {
    tokens: f64,
    last_refill: tokio::time::Instant,
    max_tokens: f64,
    refill_rate: f64, // tokens per second
}

impl RateLimiter {
    fn new(max_tokens: f64, refill_rate: f64) -> Self {
        Self {
            tokens: max_tokens,
            last_refill: tokio::time::Instant::now(),
            max_tokens,
            refill_rate,
        }
    }

    /// Returns true if the message is allowed; false if rate-limited.
    fn allow(&mut self) -> bool {
        let now = tokio::time::Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

async fn read_loop(
    ws_receiver: &mut futures::stream::SplitStream<WebSocket>,
    state: &AppState,
    universe_id: UniverseId,
    player_id: PlayerId,
) {
    let rate = state.config.limits.ws_rate_limit_per_sec;
    let mut rate_limiter = RateLimiter::new(rate, rate);

    while let Some(Ok(msg)) = ws_receiver.next().await {
        let text = match msg {
            Message::Text(t) => t,
            Message::Close(_) => break,
            _ => continue,
        };

        // Rate limit: drop messages that exceed per-connection rate
        if !rate_limiter.allow() {
            tracing::warn!(universe = universe_id, player = player_id, "Rate limited");
            continue;
        }

        // Drop oversized messages
        if text.len() > MAX_MESSAGE_SIZE {
            tracing::warn!(
                universe = universe_id,
                player = player_id,
                len = text.len(),
                "Oversized message dropped"
            );
            continue;
        }

        let client_msg = match decode_client_message(text.as_str()) {
            Ok(m) => m,
            // Unknown types get the same trace as dispatched messages,
            // then get ignored; anything else malformed is logged and
            // dropped. The connection stays open either way.
            Err(ProtocolError::UnknownType(_)) => {
                tracing::debug!(
                    universe = universe_id,
                    player = player_id,
                    raw = %text.as_str(),
                    "recv"
                );
                continue;
            },
            Err(e) => {
                tracing::debug!(
                    universe = universe_id,
                    player = player_id,
                    error = %e,
                    "Invalid message dropped"
                );
                continue;
            },
        };

        // Input arrives every frame; logging it would drown everything.
        if !matches!(client_msg, ClientMessage::Input(_)) {
            tracing::debug!(universe = universe_id, player = player_id, msg = ?client_msg, "recv");
        }

        match client_msg {
            ClientMessage::Name { name } => {
                if name.is_empty() {
                    continue;
                }
                let mut universes = state.universes.write().await;
                universes.set_player_name(universe_id, player_id, &name);
            },
            ClientMessage::Input(input) => {
                let universes = state.universes.read().await;
                universes.relay_input(universe_id, player_id, input);
            },
            ClientMessage::Start => {
                let mut universes = state.universes.write().await;
                universes.request_start(universe_id, player_id);
            },
            ClientMessage::StateResponse(data) => {
                let mut universes = state.universes.write().await;
                universes.forward_state(universe_id, data);
            },
            ClientMessage::Join(ship) => {
                let universes = state.universes.read().await;
                universes.relay_join(universe_id, player_id, ship);
            },
        }
    }
}
