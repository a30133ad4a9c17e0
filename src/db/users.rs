use sqlx::{Row, SqlitePool};

use crate::error::AppError;
use crate::models::user::{CreateUser, User};
use crate::snowflake;

fn row_to_user(row: sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        description: row.get("description"),
        img: row.get("img"),
        created_at: row.get("created_at"),
    }
}

const SELECT_USERS: &str =
    "SELECT id, name, email, phone, description, img, created_at FROM users";

pub async fn get_user(pool: &SqlitePool, user_id: &str) -> Result<User, AppError> {
    let row = sqlx::query(&format!("{SELECT_USERS} WHERE id = ?"))
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("unknown_user".to_string()))?;

    Ok(row_to_user(row))
}

pub async fn get_user_by_name(pool: &SqlitePool, name: &str) -> Result<User, AppError> {
    let row = sqlx::query(&format!("{SELECT_USERS} WHERE name = ?"))
        .bind(name)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("unknown_user".to_string()))?;

    Ok(row_to_user(row))
}

/// Users whose name matches exactly. Empty when nobody does.
pub async fn find_by_name(pool: &SqlitePool, name: &str) -> Result<Vec<User>, AppError> {
    let rows = sqlx::query(&format!("{SELECT_USERS} WHERE name = ?"))
        .bind(name)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(row_to_user).collect())
}

pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>, AppError> {
    let rows = sqlx::query(&format!("{SELECT_USERS} ORDER BY id ASC"))
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(row_to_user).collect())
}

pub async fn create_user(pool: &SqlitePool, input: &CreateUser) -> Result<User, AppError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }

    let id = snowflake::generate();
    let inserted = sqlx::query(
        "INSERT INTO users (id, name, email, phone, description) VALUES (?, ?, ?, ?, ?) \
         ON CONFLICT(name) DO NOTHING",
    )
    .bind(&id)
    .bind(name)
    .bind(&input.email)
    .bind(&input.phone)
    .bind(&input.description)
    .execute(pool)
    .await?;

    if inserted.rows_affected() == 0 {
        return Err(AppError::Conflict(format!("user {name} already exists")));
    }

    get_user(pool, &id).await
}

pub async fn set_image(pool: &SqlitePool, name: &str, img: &str) -> Result<User, AppError> {
    let updated = sqlx::query(
        "UPDATE users SET img = ?, updated_at = datetime('now') WHERE name = ?",
    )
    .bind(img)
    .bind(name)
    .execute(pool)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(AppError::NotFound("unknown_user".to_string()));
    }

    get_user_by_name(pool, name).await
}

/// Record that `follower_id` follows `following_id`. Following twice is a no-op.
pub async fn follow(
    pool: &SqlitePool,
    follower_id: &str,
    following_id: &str,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO follows (follower_id, following_id) VALUES (?, ?) \
         ON CONFLICT(follower_id, following_id) DO NOTHING",
    )
    .bind(follower_id)
    .bind(following_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_followings(pool: &SqlitePool, user_id: &str) -> Result<Vec<User>, AppError> {
    let rows = sqlx::query(
        "SELECT u.id, u.name, u.email, u.phone, u.description, u.img, u.created_at \
         FROM follows f JOIN users u ON u.id = f.following_id \
         WHERE f.follower_id = ? ORDER BY f.created_at ASC, u.id ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(row_to_user).collect())
}

pub async fn list_followers(pool: &SqlitePool, user_id: &str) -> Result<Vec<User>, AppError> {
    let rows = sqlx::query(
        "SELECT u.id, u.name, u.email, u.phone, u.description, u.img, u.created_at \
         FROM follows f JOIN users u ON u.id = f.follower_id \
         WHERE f.following_id = ? ORDER BY f.created_at ASC, u.id ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(row_to_user).collect())
}
