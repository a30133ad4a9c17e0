use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::db;
use crate::error::AppError;
use crate::models::user::{CreateUser, FollowRequest, FollowResult, User};
use crate::models::DataResponse;
use crate::state::AppState;
use crate::storage;

/// Multipart field carrying the profile picture.
const AVATAR_FIELD: &str = "profilePic";

pub async fn create_user(
    state: State<AppState>,
    Json(input): Json<CreateUser>,
) -> Result<(StatusCode, Json<DataResponse<User>>), AppError> {
    let user = db::users::create_user(&state.db, &input).await?;
    tracing::info!("registered user {} ({})", user.name, user.id);
    Ok((StatusCode::CREATED, Json(DataResponse::new(user))))
}

/// Multipart registration: profile fields plus an optional `profilePic`.
/// The image is checked before the user row is written.
pub async fn register(
    state: State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DataResponse<User>>), AppError> {
    let mut input = CreateUser {
        name: String::new(),
        email: None,
        phone: None,
        description: None,
    };
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == AVATAR_FIELD {
            let data = field.bytes().await.map_err(multipart_error)?;
            if !data.is_empty() {
                image = Some(data);
            }
            continue;
        }
        let text = field.text().await.map_err(multipart_error)?;
        let value = Some(text.trim().to_string()).filter(|v| !v.is_empty());
        match name.as_str() {
            "name" => input.name = text,
            "email" => input.email = value,
            "phone" => input.phone = value,
            "description" => input.description = value,
            other => tracing::debug!("register: ignoring field {other}"),
        }
    }

    if let Some(data) = &image {
        storage::validate_avatar(data)?;
    }

    let mut user = db::users::create_user(&state.db, &input).await?;
    if let Some(data) = image {
        let (url, _) = storage::save_avatar(&state.storage_path, &user.id, &data).await?;
        user = db::users::set_image(&state.db, &user.name, &url).await?;
    }
    tracing::info!("registered user {} ({})", user.name, user.id);

    Ok((StatusCode::CREATED, Json(DataResponse::new(user))))
}

pub async fn list_users(state: State<AppState>) -> Result<Json<DataResponse<Vec<User>>>, AppError> {
    let users = db::users::list_users(&state.db).await?;
    Ok(Json(DataResponse::new(users)))
}

pub async fn find_users(
    state: State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<DataResponse<Vec<User>>>, AppError> {
    let users = db::users::find_by_name(&state.db, &name).await?;
    Ok(Json(DataResponse::new(users)))
}

pub async fn get_user(
    state: State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<DataResponse<User>>, AppError> {
    let user = db::users::get_user(&state.db, &user_id).await?;
    Ok(Json(DataResponse::new(user)))
}

/// The sender starts following the receiver.
pub async fn follow(
    state: State<AppState>,
    Json(input): Json<FollowRequest>,
) -> Result<Json<DataResponse<FollowResult>>, AppError> {
    let receiver = db::users::get_user_by_name(&state.db, &input.receiver_name)
        .await
        .map_err(|e| not_found_as(e, "receiver not found"))?;
    let sender = db::users::get_user(&state.db, &input.sender_id)
        .await
        .map_err(|e| not_found_as(e, "sender not found"))?;

    db::users::follow(&state.db, &sender.id, &receiver.id).await?;

    Ok(Json(DataResponse::new(FollowResult {
        follower: sender.name,
        following: receiver.name,
    })))
}

pub async fn list_followings(
    state: State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<DataResponse<Vec<User>>>, AppError> {
    db::users::get_user(&state.db, &user_id).await?;
    let users = db::users::list_followings(&state.db, &user_id).await?;
    Ok(Json(DataResponse::new(users)))
}

pub async fn list_followers(
    state: State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<DataResponse<Vec<User>>>, AppError> {
    db::users::get_user(&state.db, &user_id).await?;
    let users = db::users::list_followers(&state.db, &user_id).await?;
    Ok(Json(DataResponse::new(users)))
}

pub async fn upload_avatar(
    state: State<AppState>,
    Path(name): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<DataResponse<User>>, AppError> {
    let user = db::users::get_user_by_name(&state.db, &name).await?;

    let mut data = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some(AVATAR_FIELD) {
            data = Some(field.bytes().await.map_err(multipart_error)?);
        }
    }
    let data =
        data.ok_or_else(|| AppError::BadRequest(format!("missing {AVATAR_FIELD} field")))?;

    let (url, format) = storage::save_avatar(&state.storage_path, &user.id, &data).await?;
    let user = db::users::set_image(&state.db, &name, &url).await?;
    tracing::info!("stored {} avatar for {}", format.mime(), user.name);

    Ok(Json(DataResponse::new(user)))
}

/// Rename a lookup miss; every other failure passes through unchanged.
fn not_found_as(e: AppError, message: &str) -> AppError {
    match e {
        AppError::NotFound(_) => AppError::NotFound(message.to_string()),
        other => other,
    }
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(e.body_text())
    }
}
