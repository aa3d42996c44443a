//! WebSocket Module - Gestione WebSocket per la chat real-time
//!
//! Questo modulo gestisce le connessioni WebSocket su `/chats/ws`. Include:
//! - Gestione upgrade HTTP -> WebSocket (autenticato con access token)
//! - Gestione connessioni (split sender/receiver, un task per lato)
//! - Handler per gli eventi `create_chat`, `enter_chat`, `send_message`
//! - Stanze delle chat (broadcast) e utenti online

pub mod chatmap;
pub mod connection;
pub mod event_handlers;
pub mod usermap;

pub use connection::handle_socket;

use crate::{AppState, entities::User};
use axum::{
    Extension,
    extract::{State, ws::WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;

/// Capacità di ogni canale broadcast di una stanza
pub const BROADCAST_CHANNEL_CAPACITY: usize = 100;
/// Intervallo minimo tra due frame letti dallo stesso socket
pub const RATE_LIMITER_MILLIS: u64 = 10;
/// Connessione chiusa dopo questo tempo senza frame dal client
pub const TIMEOUT_DURATION_SECONDS: u64 = 300;

/// Entry point per gestire richieste di upgrade WebSocket
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>, // ottenuto dall'autenticazione JWT
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, current_user))
}
