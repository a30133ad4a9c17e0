use axum::extract::{Path, State};
use axum::Json;

use crate::state::AppState;

pub async fn get_gateway(State(state): State<AppState>) -> Json<serde_json::Value> {
    let presence = state.gateway.presence();
    Json(serde_json::json!({
        "data": {
            "url": "/ws",
            "heartbeat_interval": state.heartbeat_interval.as_millis() as u64,
            "online": presence.len(),
            "online_users": presence.online_names()
        }
    }))
}

pub async fn get_presence(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<serde_json::Value> {
    let online = state.gateway.presence().is_online(&name);
    Json(serde_json::json!({ "data": { "name": name, "online": online } }))
}
