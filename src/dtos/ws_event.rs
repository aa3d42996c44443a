//! WebSocket Event DTOs - Data Transfer Objects per eventi WebSocket
//!
//! Ogni frame è un oggetto `{ "event": nome, "data": payload }`:
//! `{ "event": "send_message", "data": { "message": "ciao", "chatId": 1 } }`

use crate::dtos::{ChatDTO, CreateChatDTO, EnterChatDTO, MessageDTO, SendMessageDTO};
use serde::{Deserialize, Serialize};

/// Codice inviato quando una chat richiesta non esiste
pub const CHAT_NOT_FOUND_CODE: u16 = 100;
/// Codice inviato per frame malformati o non validi
pub const BAD_FRAME_CODE: u16 = 400;

/// Eventi inviati dal client
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    CreateChat(CreateChatDTO),
    EnterChat(EnterChatDTO),
    SendMessage(SendMessageDTO),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WsExceptionDTO {
    pub message: String,
    pub code: u16,
}

/// Eventi inviati dal server
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    ChatCreated(ChatDTO),
    ReceiveMessage(MessageDTO),
    Exception(WsExceptionDTO),
}

impl ServerEvent {
    pub fn exception(code: u16, message: impl Into<String>) -> Self {
        ServerEvent::Exception(WsExceptionDTO {
            message: message.into(),
            code,
        })
    }
}
