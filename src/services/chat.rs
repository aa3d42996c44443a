//! Chat services - Lista delle chat e dei messaggi (la parte real-time sta in `ws`)

use crate::core::pagination::PaginationQuery;
use crate::core::{AppError, AppState};
use crate::dtos::{ChatDTO, MessageDTO, Paginated, UserDTO};
use crate::entities::{Chat, Message};
use crate::repositories::{CHAT_FIELDS, MESSAGE_FIELDS, Paginate, ReadMany};
use axum::extract::{Json, Path, Query, State};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Chat con la lista dei membri, caricati con una sola query
pub async fn to_chat_dtos(state: &AppState, chats: Vec<Chat>) -> Result<Vec<ChatDTO>, AppError> {
    let chat_ids: Vec<i32> = chats.iter().map(|c| c.id).collect();

    let mut members: HashMap<i32, Vec<UserDTO>> = HashMap::new();
    for member in state.chat.find_members(&chat_ids).await? {
        members
            .entry(member.chat_id)
            .or_default()
            .push(UserDTO::from(member.user));
    }

    Ok(chats
        .into_iter()
        .map(|chat| {
            let users = members.remove(&chat.id).unwrap_or_default();
            ChatDTO::new(chat, users)
        })
        .collect())
}

async fn to_message_dtos(
    state: &AppState,
    messages: Vec<Message>,
) -> Result<Vec<MessageDTO>, AppError> {
    let author_ids: Vec<i32> = messages
        .iter()
        .map(|m| m.author_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let authors: HashMap<i32, UserDTO> = state
        .user
        .read_many(&author_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, UserDTO::from(u)))
        .collect();

    Ok(messages
        .into_iter()
        .map(|m| {
            let author = authors.get(&m.author_id).cloned();
            MessageDTO::new(m, author)
        })
        .collect())
}

#[instrument(skip(state, raw))]
pub async fn get_chats(
    State(state): State<Arc<AppState>>,
    Query(raw): Query<Vec<(String, String)>>,
) -> Result<Json<Paginated<ChatDTO>>, AppError> {
    let query = PaginationQuery::parse(raw, CHAT_FIELDS)?;
    let page = state.chat.paginate((), &query).await?;
    let after = query.cursor_after(&page.rows);
    debug!(rows = page.rows.len(), "Chats page loaded");

    let data = to_chat_dtos(&state, page.rows).await?;
    Ok(Json(query.into_response(
        data,
        after,
        page.total,
        &state.config.base_url(),
        "chats",
    )))
}

#[instrument(skip(state, raw))]
pub async fn get_chat_messages(
    State(state): State<Arc<AppState>>,
    Path(chat_id): Path<i32>,
    Query(raw): Query<Vec<(String, String)>>,
) -> Result<Json<Paginated<MessageDTO>>, AppError> {
    let query = PaginationQuery::parse(raw, MESSAGE_FIELDS)?;
    if !state.chat.exists(chat_id).await? {
        return Err(AppError::not_found("Chat not found"));
    }

    let page = state.msg.paginate(chat_id, &query).await?;
    let after = query.cursor_after(&page.rows);
    let data = to_message_dtos(&state, page.rows).await?;

    Ok(Json(query.into_response(
        data,
        after,
        page.total,
        &state.config.base_url(),
        &format!("chats/{}/messages", chat_id),
    )))
}
