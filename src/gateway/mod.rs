pub mod connection;
pub mod dispatcher;
pub mod events;
pub mod fanout;
pub mod heartbeat;
pub mod relay;
pub mod session;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};

use crate::state::AppState;
use events::{InboundEvent, OutboundEvent};
use heartbeat::Liveness;

pub use dispatcher::Gateway;

pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

fn encode(event: &OutboundEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(text) => Some(Message::Text(text.into())),
        Err(e) => {
            tracing::error!("failed to encode {}: {e}", event.name());
            None
        }
    }
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut ws_sink, mut ws_stream) = socket.split();
    let gateway = state.gateway.clone();
    let (mut session, mut rx) = gateway.connect();

    // Send HELLO
    let hello = OutboundEvent::Hello {
        heartbeat_interval: state.heartbeat_interval.as_millis() as u64,
    };
    if let Some(msg) = encode(&hello) {
        if ws_sink.send(msg).await.is_err() {
            gateway.disconnect(session);
            return;
        }
    }

    let mut liveness = Liveness::new(state.heartbeat_timeout);
    let mut heartbeat_check = tokio::time::interval(state.heartbeat_interval);

    loop {
        tokio::select! {
            // Outgoing events queued by the relay and fan-out
            Some(event) = rx.recv() => {
                if let Some(msg) = encode(&event) {
                    if ws_sink.send(msg).await.is_err() {
                        break;
                    }
                }
            }
            _ = heartbeat_check.tick() => {
                if liveness.expired() {
                    tracing::debug!("{} timed out", session.id());
                    break;
                }
            }
            // Incoming frames, handled strictly in arrival order
            msg = ws_stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        liveness.touch();
                        match serde_json::from_str::<InboundEvent>(&text) {
                            Ok(event) => gateway.dispatch(&mut session, event),
                            Err(e) => tracing::debug!("{}: ignoring frame: {e}", session.id()),
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => liveness.touch(),
                    Some(Err(e)) => {
                        tracing::debug!("{}: socket error: {e}", session.id());
                        break;
                    }
                }
            }
        }
    }

    gateway.disconnect(session);
}
