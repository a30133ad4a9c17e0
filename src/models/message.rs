use serde::{Deserialize, Serialize};

/// A stored direct message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub sender: String,
    pub receiver: String,
    pub message: String,
    /// Unix milliseconds.
    pub time: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateMessage {
    pub conversation_id: String,
    pub sender: String,
    pub receiver: String,
    pub message: String,
    pub time: Option<i64>,
}
