use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    /// Profile image URL, relative to the server root (`/cdn/...`).
    pub img: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FollowRequest {
    pub sender_id: String,
    pub receiver_name: String,
}

#[derive(Debug, Serialize)]
pub struct FollowResult {
    pub follower: String,
    pub following: String,
}
