use sqlx::{Row, SqlitePool};

use crate::error::AppError;
use crate::models::message::{CreateMessage, Message};
use crate::snowflake;

fn row_to_message(row: sqlx::sqlite::SqliteRow) -> Message {
    Message {
        id: row.get("id"),
        conversation_id: row.get("conversation_id"),
        sender: row.get("sender"),
        receiver: row.get("receiver"),
        message: row.get("message"),
        time: row.get("time"),
    }
}

const SELECT_MESSAGES: &str =
    "SELECT id, conversation_id, sender, receiver, message, time FROM messages";

pub async fn get_message(pool: &SqlitePool, message_id: &str) -> Result<Message, AppError> {
    let row = sqlx::query(&format!("{SELECT_MESSAGES} WHERE id = ?"))
        .bind(message_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("unknown_message".to_string()))?;

    Ok(row_to_message(row))
}

/// Messages of a conversation, oldest first. Ties on `time` keep insertion order.
pub async fn list_messages(
    pool: &SqlitePool,
    conversation_id: &str,
) -> Result<Vec<Message>, AppError> {
    let rows = sqlx::query(&format!(
        "{SELECT_MESSAGES} WHERE conversation_id = ? ORDER BY time ASC, id ASC"
    ))
    .bind(conversation_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(row_to_message).collect())
}

pub async fn create_message(pool: &SqlitePool, input: &CreateMessage) -> Result<Message, AppError> {
    if input.conversation_id.is_empty() || input.sender.is_empty() || input.receiver.is_empty() {
        return Err(AppError::BadRequest(
            "conversation_id, sender and receiver are required".to_string(),
        ));
    }

    let id = snowflake::generate();
    let time = input
        .time
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());

    sqlx::query(
        "INSERT INTO messages (id, conversation_id, sender, receiver, message, time) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&input.conversation_id)
    .bind(&input.sender)
    .bind(&input.receiver)
    .bind(&input.message)
    .bind(time)
    .execute(pool)
    .await?;

    get_message(pool, &id).await
}
