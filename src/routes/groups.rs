use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::db;
use crate::error::AppError;
use crate::models::group::{AddMember, CreateGroup, CreateGroupMessage, Group, GroupKind, GroupMessage};
use crate::models::DataResponse;
use crate::state::AppState;

pub async fn create_group(
    state: State<AppState>,
    Json(input): Json<CreateGroup>,
) -> Result<(StatusCode, Json<DataResponse<Group>>), AppError> {
    let group = db::groups::create_group(&state.db, &input).await?;
    tracing::info!(
        "{} created {} {} ({})",
        group.created_by,
        group.kind.as_str(),
        group.group_name,
        group.id
    );
    Ok((StatusCode::CREATED, Json(DataResponse::new(group))))
}

pub async fn get_group(
    state: State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<DataResponse<Group>>, AppError> {
    let group = db::groups::get_group(&state.db, &group_id).await?;
    Ok(Json(DataResponse::new(group)))
}

/// Groups (not rooms) the named user belongs to.
pub async fn list_member_groups(
    state: State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<DataResponse<Vec<Group>>>, AppError> {
    let groups = db::groups::list_for_member(&state.db, &name, GroupKind::Group).await?;
    Ok(Json(DataResponse::new(groups)))
}

pub async fn list_rooms(state: State<AppState>) -> Result<Json<DataResponse<Vec<Group>>>, AppError> {
    let rooms = db::groups::list_by_kind(&state.db, GroupKind::Room).await?;
    Ok(Json(DataResponse::new(rooms)))
}

pub async fn add_member(
    state: State<AppState>,
    Path(group_id): Path<String>,
    Json(input): Json<AddMember>,
) -> Result<Json<DataResponse<Group>>, AppError> {
    let group = db::groups::add_member(&state.db, &group_id, &input.member_name).await?;
    Ok(Json(DataResponse::new(group)))
}

pub async fn list_group_messages(
    state: State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<DataResponse<Vec<GroupMessage>>>, AppError> {
    let messages = db::groups::list_group_messages(&state.db, &group_id).await?;
    Ok(Json(DataResponse::new(messages)))
}

pub async fn create_group_message(
    state: State<AppState>,
    Path(group_id): Path<String>,
    Json(input): Json<CreateGroupMessage>,
) -> Result<(StatusCode, Json<DataResponse<GroupMessage>>), AppError> {
    let msg = db::groups::create_group_message(&state.db, &group_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(msg))))
}
