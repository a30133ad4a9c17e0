mod gateway;
mod groups;
mod health;
mod messages;
mod users;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::storage::MAX_AVATAR_SIZE;

/// Multipart framing on top of the largest accepted image.
const AVATAR_BODY_LIMIT: usize = MAX_AVATAR_SIZE + 64 * 1024;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let cdn_service = ServeDir::new(&state.storage_path);

    Router::new()
        .route("/health", get(health::health))
        .route("/version", get(health::version))
        .route("/ws", get(crate::gateway::ws_upgrade))
        .nest_service("/cdn", cdn_service)
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        // Gateway / presence
        .route("/gateway", get(gateway::get_gateway))
        .route("/presence/{name}", get(gateway::get_presence))
        // User directory
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/register",
            post(users::register).layer(DefaultBodyLimit::max(AVATAR_BODY_LIMIT)),
        )
        .route("/users/follow", post(users::follow))
        .route("/users/by-name/{name}", get(users::find_users))
        .route("/users/{user_id}", get(users::get_user))
        .route("/users/{user_id}/followings", get(users::list_followings))
        .route("/users/{user_id}/followers", get(users::list_followers))
        .route(
            "/users/by-name/{name}/avatar",
            post(users::upload_avatar).layer(DefaultBodyLimit::max(AVATAR_BODY_LIMIT)),
        )
        // Message store
        .route("/messages", post(messages::create_message))
        .route(
            "/conversations/{conversation_id}/messages",
            get(messages::list_messages),
        )
        // Groups and rooms
        .route("/groups", post(groups::create_group))
        .route("/groups/member/{name}", get(groups::list_member_groups))
        .route("/groups/{group_id}", get(groups::get_group))
        .route("/groups/{group_id}/members", post(groups::add_member))
        .route(
            "/groups/{group_id}/messages",
            get(groups::list_group_messages).post(groups::create_group_message),
        )
        .route("/rooms", get(groups::list_rooms))
}
