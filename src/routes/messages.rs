use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::db;
use crate::error::AppError;
use crate::models::message::{CreateMessage, Message};
use crate::models::DataResponse;
use crate::state::AppState;

pub async fn create_message(
    state: State<AppState>,
    Json(input): Json<CreateMessage>,
) -> Result<(StatusCode, Json<DataResponse<Message>>), AppError> {
    let msg = db::messages::create_message(&state.db, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(msg))))
}

pub async fn list_messages(
    state: State<AppState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<DataResponse<Vec<Message>>>, AppError> {
    let messages = db::messages::list_messages(&state.db, &conversation_id).await?;
    Ok(Json(DataResponse::new(messages)))
}
