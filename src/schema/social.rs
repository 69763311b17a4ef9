//! Feed and chat payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub content: String,
    pub author_id: String,
    pub author_name: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub like_count: u64,
    pub comment_count: u64,
    pub share_count: u64,
}

/// Following and latest feeds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedData {
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    pub id: String,
    pub name: Option<String>,
    pub is_group: bool,
    pub last_message: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub participant_count: u64,
}

/// User chats and market chats
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatsData {
    pub chats: Vec<ChatSummary>,
}
