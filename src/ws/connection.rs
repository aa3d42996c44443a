//! WebSocket Connection Management - Gestione connessioni WebSocket

use crate::ws::{RATE_LIMITER_MILLIS, TIMEOUT_DURATION_SECONDS};
use crate::{
    AppState,
    dtos::{MessageDTO, ServerEvent},
    entities::User,
    ws::{event_handlers::process_frame, usermap::InternalSignal},
};
use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::Duration;
use tokio::time::{interval, timeout};
use tokio_stream::StreamMap;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, error, info, instrument, warn};

#[instrument(skip(ws, state, user), fields(user_id = user.id))]
pub async fn handle_socket(ws: WebSocket, state: Arc<AppState>, user: User) {
    info!("WebSocket connection established");

    // Dividiamo il WebSocket in due metà: sender e receiver
    let (ws_tx, ws_rx) = ws.split();

    // Canale interno: il listener (e gli altri utenti) parlano col task di scrittura
    let (int_tx, int_rx) = unbounded_channel::<InternalSignal>();

    state.users_online.register_online(user.id, int_tx.clone());

    tokio::spawn(write_ws(user.id, ws_tx, int_rx, state.clone()));
    tokio::spawn(listen_ws(user, ws_rx, int_tx, state));
}

async fn send_event(
    websocket_tx: &mut SplitSink<WebSocket, Message>,
    event: &ServerEvent,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(event).map_err(|e| {
        error!("Failed to serialize event: {:?}", e);
        axum::Error::new(e)
    })?;
    websocket_tx.send(Message::Text(Utf8Bytes::from(json))).await
}

#[instrument(skip(websocket_tx, internal_rx, state))]
pub async fn write_ws(
    user_id: i32,
    mut websocket_tx: SplitSink<WebSocket, Message>,
    mut internal_rx: UnboundedReceiver<InternalSignal>,
    state: Arc<AppState>,
) {
    debug!("Write task started");

    // stanze in cui il socket è entrato con enter_chat (o create_chat)
    let mut rooms: StreamMap<i32, BroadcastStream<Arc<MessageDTO>>> = StreamMap::new();

    'external: loop {
        tokio::select! {
            Some((chat_id, result)) = tokio_stream::StreamExt::next(&mut rooms) => {
                match result {
                    // chi ha scritto il messaggio non lo riceve indietro
                    Ok(msg) if msg.author_id() == Some(user_id) => {}
                    Ok(msg) => {
                        let event = ServerEvent::ReceiveMessage(msg.as_ref().clone());
                        if send_event(&mut websocket_tx, &event).await.is_err() {
                            warn!("Failed to deliver message, closing connection");
                            break 'external;
                        }
                    }
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        warn!(chat_id, skipped, "Receiver lagged, messages skipped");
                    }
                }
            }

            signal = internal_rx.recv() => {
                match signal {
                    Some(InternalSignal::Shutdown) => {
                        info!("Shutdown signal received");
                        break 'external;
                    }
                    Some(InternalSignal::AddChat(chat_id)) => {
                        if !rooms.contains_key(&chat_id) {
                            debug!(chat_id, "Joining room");
                            let rx = state.chats_online.subscribe(&chat_id);
                            rooms.insert(chat_id, BroadcastStream::new(rx));
                        }
                    }
                    Some(InternalSignal::Event(event)) => {
                        if let Err(e) = send_event(&mut websocket_tx, &event).await {
                            error!("Failed to send event: {:?}", e);
                            break 'external;
                        }
                    }
                    None => {
                        debug!("Internal channel closed");
                        break 'external; // canale chiuso, quindi listener ws chiuso, quindi stacca tutto
                    }
                }
            }
        }
    }

    let _ = websocket_tx.close().await;
    debug!("Write task terminated");
}

#[instrument(skip(user, websocket_rx, internal_tx, state), fields(user_id = user.id))]
pub async fn listen_ws(
    user: User,
    mut websocket_rx: SplitStream<WebSocket>,
    internal_tx: UnboundedSender<InternalSignal>,
    state: Arc<AppState>,
) {
    debug!("Listen task started");

    let mut rate_limiter = interval(Duration::from_millis(RATE_LIMITER_MILLIS));
    let timeout_duration = Duration::from_secs(TIMEOUT_DURATION_SECONDS);

    loop {
        match timeout(timeout_duration, StreamExt::next(&mut websocket_rx)).await {
            Ok(Some(msg_result)) => {
                rate_limiter.tick().await;

                let msg = match msg_result {
                    Ok(m) => m,
                    Err(e) => {
                        warn!("WebSocket error: {:?}", e);
                        break;
                    }
                };

                match msg {
                    Message::Text(text) => {
                        process_frame(&state, &user, &internal_tx, text.as_str()).await;
                    }
                    Message::Close(_) => {
                        info!("Close message received");
                        break;
                    }
                    _ => {}
                }
            }
            Ok(None) => {
                info!("WebSocket stream ended");
                break;
            }
            Err(_) => {
                warn!(timeout_secs = TIMEOUT_DURATION_SECONDS, "Connection timeout");
                break;
            }
        }
    }

    // Cleanup
    let _ = internal_tx.send(InternalSignal::Shutdown);
    state.users_online.remove_from_online(&user.id, &internal_tx);
    info!("Connection closed");
}
