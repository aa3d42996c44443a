//! WebSocket Event Handlers - Handler per gli eventi inviati dal client
//!
//! Gli errori non chiudono mai il socket: diventano un evento `exception` per il solo mittente.

use crate::AppState;
use crate::core::AppError;
use crate::dtos::ws_event::{BAD_FRAME_CODE, CHAT_NOT_FOUND_CODE};
use crate::dtos::{
    ClientEvent, CreateChatDTO, CreateMessageDTO, EnterChatDTO, MessageDTO, SendMessageDTO,
    ServerEvent, UserDTO,
};
use crate::entities::User;
use crate::repositories::Create;
use crate::services::chat::to_chat_dtos;
use crate::ws::usermap::InternalSignal;
use futures::future;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Errore da riportare al client come `exception`
struct WsError {
    code: u16,
    message: String,
}

impl WsError {
    fn chat_not_found(chat_id: i32) -> Self {
        Self {
            code: CHAT_NOT_FOUND_CODE,
            message: format!("Chat does not exist. chatId: {}", chat_id),
        }
    }
}

impl From<AppError> for WsError {
    fn from(err: AppError) -> Self {
        Self {
            code: err.status().as_u16(),
            message: err.to_string(),
        }
    }
}

impl From<sqlx::Error> for WsError {
    fn from(err: sqlx::Error) -> Self {
        AppError::from(err).into()
    }
}

impl From<validator::ValidationErrors> for WsError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self {
            code: BAD_FRAME_CODE,
            message: err.to_string(),
        }
    }
}

fn reply(internal_tx: &UnboundedSender<InternalSignal>, event: ServerEvent) {
    if internal_tx.send(InternalSignal::Event(event)).is_err() {
        debug!("Writer already closed, reply dropped");
    }
}

/// Entry point per ogni frame di testo ricevuto
pub async fn process_frame(
    state: &AppState,
    user: &User,
    internal_tx: &UnboundedSender<InternalSignal>,
    text: &str,
) {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            warn!("Malformed frame: {}", e);
            reply(
                internal_tx,
                ServerEvent::exception(BAD_FRAME_CODE, format!("Malformed event: {}", e)),
            );
            return;
        }
    };

    let result = match event {
        ClientEvent::CreateChat(dto) => create_chat(state, user, internal_tx, dto).await,
        ClientEvent::EnterChat(dto) => enter_chat(state, internal_tx, dto).await,
        ClientEvent::SendMessage(dto) => send_message(state, user, dto).await,
    };

    if let Err(e) = result {
        reply(internal_tx, ServerEvent::exception(e.code, e.message));
    }
}

/// Crea la chat con gli utenti indicati più il mittente, risponde con `chat_created`
/// e fa entrare nella stanza tutti i membri online.
#[instrument(skip(state, user, internal_tx, dto), fields(user_id = user.id))]
async fn create_chat(
    state: &AppState,
    user: &User,
    internal_tx: &UnboundedSender<InternalSignal>,
    dto: CreateChatDTO,
) -> Result<(), WsError> {
    dto.validate()?;

    let mut user_ids = dto.user_ids;
    user_ids.push(user.id);
    user_ids.sort_unstable();
    user_ids.dedup();

    let chat = state.chat.create_with_users(&user_ids).await?;
    info!(chat_id = chat.id, members = user_ids.len(), "Chat created");

    let chat_id = chat.id;
    let created = to_chat_dtos(state, vec![chat])
        .await?
        .pop()
        .ok_or_else(|| AppError::internal_server_error("Chat enrichment failed"))?;

    let _ = internal_tx.send(InternalSignal::AddChat(chat_id));
    for member in user_ids.iter().filter(|id| **id != user.id) {
        state
            .users_online
            .send_server_message_if_online(member, InternalSignal::AddChat(chat_id));
    }

    reply(internal_tx, ServerEvent::ChatCreated(created));
    Ok(())
}

/// Tutte le chat devono esistere, altrimenti non si entra in nessuna
#[instrument(skip(state, internal_tx))]
async fn enter_chat(
    state: &AppState,
    internal_tx: &UnboundedSender<InternalSignal>,
    dto: EnterChatDTO,
) -> Result<(), WsError> {
    dto.validate()?;

    let found = future::try_join_all(dto.chat_ids.iter().map(|id| state.chat.exists(*id))).await?;
    if let Some((chat_id, _)) = dto.chat_ids.iter().zip(found).find(|(_, exists)| !exists) {
        warn!(chat_id, "Enter requested for missing chat");
        return Err(WsError::chat_not_found(*chat_id));
    }

    for chat_id in dto.chat_ids {
        let _ = internal_tx.send(InternalSignal::AddChat(chat_id));
    }
    Ok(())
}

/// Salva il messaggio e lo inoltra alla stanza (il task di scrittura del mittente lo scarta)
#[instrument(skip(state, user, dto), fields(user_id = user.id, chat_id = dto.chat_id))]
async fn send_message(state: &AppState, user: &User, dto: SendMessageDTO) -> Result<(), WsError> {
    dto.validate()?;

    if !state.chat.exists(dto.chat_id).await? {
        return Err(WsError::chat_not_found(dto.chat_id));
    }

    let message = state
        .msg
        .create(&CreateMessageDTO {
            chat_id: dto.chat_id,
            author_id: user.id,
            message: dto.message,
        })
        .await?;

    let outgoing = Arc::new(MessageDTO::new(message, Some(UserDTO::from(user.clone()))));
    match state.chats_online.send(&dto.chat_id, outgoing) {
        Ok(receivers) => debug!(receivers, "Message delivered to room"),
        Err(_) => debug!("Room is empty, message only persisted"),
    }
    Ok(())
}
