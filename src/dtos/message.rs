//! Message DTOs - Data Transfer Objects per messaggi

use crate::dtos::UserDTO;
use crate::entities::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Struct per gestire io col client
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MessageDTO {
    pub id: i32,
    pub chat_id: i32,
    pub message: String,
    pub author: Option<UserDTO>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MessageDTO {
    pub fn new(message: Message, author: Option<UserDTO>) -> Self {
        Self {
            id: message.id,
            chat_id: message.chat_id,
            message: message.message,
            author,
            created_at: message.created_at,
            updated_at: message.updated_at,
        }
    }

    pub fn author_id(&self) -> Option<i32> {
        self.author.as_ref().map(|a| a.id)
    }
}

/// Evento `send_message`
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageDTO {
    #[validate(length(min = 1, max = 5000, message = "Message content must be between 1 and 5000 characters"))]
    pub message: String,
    pub chat_id: i32,
}

/// DTO per creare un nuovo messaggio (senza id)
#[derive(Debug, Clone)]
pub struct CreateMessageDTO {
    pub chat_id: i32,
    pub author_id: i32,
    pub message: String,
}
