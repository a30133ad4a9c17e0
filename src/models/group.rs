use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Group,
    Room,
}

impl GroupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKind::Group => "group",
            GroupKind::Room => "room",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "group" => Some(GroupKind::Group),
            "room" => Some(GroupKind::Room),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Group {
    pub id: String,
    pub group_name: String,
    pub created_by: String,
    pub members: Vec<String>,
    pub group_image: String,
    pub kind: GroupKind,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupMessage {
    pub id: String,
    pub group_id: String,
    pub sender: String,
    pub message: String,
    pub sender_img: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroup {
    pub group_name: String,
    pub created_by: String,
    #[serde(default)]
    pub members: Vec<String>,
    pub group_image: Option<String>,
    #[serde(default = "default_kind")]
    pub kind: GroupKind,
}

fn default_kind() -> GroupKind {
    GroupKind::Group
}

#[derive(Debug, Deserialize)]
pub struct AddMember {
    pub member_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupMessage {
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub message: String,
    pub sender_img: Option<String>,
}
