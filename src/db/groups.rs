use sqlx::{Row, SqlitePool};

use crate::error::AppError;
use crate::models::group::{CreateGroup, CreateGroupMessage, Group, GroupKind, GroupMessage};
use crate::snowflake;

/// Group row before members are attached.
struct GroupRow {
    id: String,
    group_name: String,
    created_by: String,
    group_image: String,
    kind: String,
    created_at: String,
}

fn row_to_group(row: sqlx::sqlite::SqliteRow) -> GroupRow {
    GroupRow {
        id: row.get("id"),
        group_name: row.get("group_name"),
        created_by: row.get("created_by"),
        group_image: row.get("group_image"),
        kind: row.get("kind"),
        created_at: row.get("created_at"),
    }
}

fn row_to_group_message(row: sqlx::sqlite::SqliteRow) -> GroupMessage {
    GroupMessage {
        id: row.get("id"),
        group_id: row.get("group_id"),
        sender: row.get("sender"),
        message: row.get("message"),
        sender_img: row.get("sender_img"),
        created_at: row.get("created_at"),
    }
}

const SELECT_GROUPS: &str =
    "SELECT id, group_name, created_by, group_image, kind, created_at FROM chat_groups";

async fn list_member_names(pool: &SqlitePool, group_id: &str) -> Result<Vec<String>, AppError> {
    let rows = sqlx::query_as::<_, (String,)>(
        "SELECT member_name FROM group_members WHERE group_id = ? ORDER BY position ASC",
    )
    .bind(group_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.0).collect())
}

async fn with_members(pool: &SqlitePool, row: GroupRow) -> Result<Group, AppError> {
    let members = list_member_names(pool, &row.id).await?;
    let kind = GroupKind::parse(&row.kind)
        .ok_or_else(|| AppError::Internal(format!("group {} has kind {}", row.id, row.kind)))?;
    Ok(Group {
        id: row.id,
        group_name: row.group_name,
        created_by: row.created_by,
        members,
        group_image: row.group_image,
        kind,
        created_at: row.created_at,
    })
}

async fn attach_members(pool: &SqlitePool, rows: Vec<GroupRow>) -> Result<Vec<Group>, AppError> {
    let mut groups = Vec::with_capacity(rows.len());
    for row in rows {
        groups.push(with_members(pool, row).await?);
    }
    Ok(groups)
}

pub async fn get_group(pool: &SqlitePool, group_id: &str) -> Result<Group, AppError> {
    let row = sqlx::query(&format!("{SELECT_GROUPS} WHERE id = ?"))
        .bind(group_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("unknown_group".to_string()))?;

    with_members(pool, row_to_group(row)).await
}

pub async fn create_group(pool: &SqlitePool, input: &CreateGroup) -> Result<Group, AppError> {
    if input.group_name.trim().is_empty() || input.created_by.trim().is_empty() {
        return Err(AppError::BadRequest(
            "group_name and created_by are required".to_string(),
        ));
    }

    let id = snowflake::generate();
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO chat_groups (id, group_name, created_by, group_image, kind) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&input.group_name)
    .bind(&input.created_by)
    .bind(input.group_image.as_deref().unwrap_or(""))
    .bind(input.kind.as_str())
    .execute(&mut *tx)
    .await?;

    let mut position: i64 = 0;
    for name in &input.members {
        let inserted = sqlx::query(
            "INSERT INTO group_members (group_id, member_name, position) VALUES (?, ?, ?) \
             ON CONFLICT(group_id, member_name) DO NOTHING",
        )
        .bind(&id)
        .bind(name)
        .bind(position)
        .execute(&mut *tx)
        .await?;
        position += inserted.rows_affected() as i64;
    }

    tx.commit().await?;

    get_group(pool, &id).await
}

/// Groups of `kind` that list `member_name`.
pub async fn list_for_member(
    pool: &SqlitePool,
    member_name: &str,
    kind: GroupKind,
) -> Result<Vec<Group>, AppError> {
    let rows = sqlx::query(&format!(
        "{SELECT_GROUPS} WHERE kind = ? AND id IN \
         (SELECT group_id FROM group_members WHERE member_name = ?) ORDER BY id ASC"
    ))
    .bind(kind.as_str())
    .bind(member_name)
    .fetch_all(pool)
    .await?;

    attach_members(pool, rows.into_iter().map(row_to_group).collect()).await
}

pub async fn list_by_kind(pool: &SqlitePool, kind: GroupKind) -> Result<Vec<Group>, AppError> {
    let rows = sqlx::query(&format!("{SELECT_GROUPS} WHERE kind = ? ORDER BY id ASC"))
        .bind(kind.as_str())
        .fetch_all(pool)
        .await?;

    attach_members(pool, rows.into_iter().map(row_to_group).collect()).await
}

pub async fn add_member(
    pool: &SqlitePool,
    group_id: &str,
    member_name: &str,
) -> Result<Group, AppError> {
    if member_name.trim().is_empty() {
        return Err(AppError::BadRequest("member_name is required".to_string()));
    }
    // 404 before 409
    get_group(pool, group_id).await?;

    let inserted = sqlx::query(
        "INSERT INTO group_members (group_id, member_name, position) \
         SELECT ?, ?, COALESCE(MAX(position), -1) + 1 FROM group_members WHERE group_id = ? \
         ON CONFLICT(group_id, member_name) DO NOTHING",
    )
    .bind(group_id)
    .bind(member_name)
    .bind(group_id)
    .execute(pool)
    .await?;

    if inserted.rows_affected() == 0 {
        return Err(AppError::Conflict("already a member".to_string()));
    }

    get_group(pool, group_id).await
}

pub async fn create_group_message(
    pool: &SqlitePool,
    group_id: &str,
    input: &CreateGroupMessage,
) -> Result<GroupMessage, AppError> {
    if input.sender.is_empty() || input.message.is_empty() {
        return Err(AppError::BadRequest("sender and message are required".to_string()));
    }
    get_group(pool, group_id).await?;

    let id = snowflake::generate();
    sqlx::query(
        "INSERT INTO group_messages (id, group_id, sender, message, sender_img) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(group_id)
    .bind(&input.sender)
    .bind(&input.message)
    .bind(&input.sender_img)
    .execute(pool)
    .await?;

    let row = sqlx::query(
        "SELECT id, group_id, sender, message, sender_img, created_at FROM group_messages WHERE id = ?",
    )
    .bind(&id)
    .fetch_one(pool)
    .await?;

    Ok(row_to_group_message(row))
}

/// Messages of a group in the order they were posted.
pub async fn list_group_messages(
    pool: &SqlitePool,
    group_id: &str,
) -> Result<Vec<GroupMessage>, AppError> {
    get_group(pool, group_id).await?;

    let rows = sqlx::query(
        "SELECT id, group_id, sender, message, sender_img, created_at FROM group_messages \
         WHERE group_id = ? ORDER BY id ASC",
    )
    .bind(group_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(row_to_group_message).collect())
}
