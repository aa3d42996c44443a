//! Chat DTOs - Data Transfer Objects per chat

use crate::dtos::UserDTO;
use crate::entities::Chat;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Struct per gestire io col client
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChatDTO {
    pub id: i32,
    pub users: Vec<UserDTO>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatDTO {
    pub fn new(chat: Chat, users: Vec<UserDTO>) -> Self {
        Self {
            id: chat.id,
            users,
            created_at: chat.created_at,
            updated_at: chat.updated_at,
        }
    }
}

/// Evento `create_chat`: il mittente viene aggiunto comunque ai membri
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatDTO {
    #[validate(length(min = 1, message = "userIds must contain at least one user"))]
    pub user_ids: Vec<i32>,
}

/// Evento `enter_chat`
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EnterChatDTO {
    #[validate(length(min = 1, message = "chatIds must contain at least one chat"))]
    pub chat_ids: Vec<i32>,
}
