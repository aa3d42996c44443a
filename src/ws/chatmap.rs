use crate::dtos::MessageDTO;
use crate::ws::BROADCAST_CHANNEL_CAPACITY;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::SendError;
use tokio::sync::broadcast::{Receiver, Sender};
use tracing::{debug, instrument, warn};

/// Stanze delle chat: un canale broadcast per chat, creato alla prima iscrizione
pub struct ChatMap {
    /// Attribute to retrieve the tx head of a broadcast channel by chat id
    channels: DashMap<i32, Sender<Arc<MessageDTO>>>,
}

impl Default for ChatMap {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatMap {
    pub fn new() -> Self {
        ChatMap {
            channels: DashMap::new(),
        }
    }

    #[instrument(skip(self))]
    pub fn subscribe(&self, chat_id: &i32) -> Receiver<Arc<MessageDTO>> {
        // entry() tiene il lock sulla shard: due iscrizioni concorrenti non creano due canali
        self.channels
            .entry(*chat_id)
            .or_insert_with(|| {
                debug!("Creating new broadcast channel for chat");
                broadcast::channel::<Arc<MessageDTO>>(BROADCAST_CHANNEL_CAPACITY).0
            })
            .subscribe()
    }

    /// Invia a tutti i socket nella stanza; senza ricevitori il canale viene eliminato
    #[instrument(skip(self, msg))]
    pub fn send(
        &self,
        chat_id: &i32,
        msg: Arc<MessageDTO>,
    ) -> Result<usize, SendError<Arc<MessageDTO>>> {
        let Some(chat) = self.channels.get(chat_id) else {
            debug!("Nobody is in the room");
            return Err(SendError(msg));
        };

        match chat.send(msg) {
            Ok(n) => {
                debug!(receivers = n, "Message broadcast to receivers");
                Ok(n)
            }
            Err(e) => {
                warn!("No active receivers, removing channel");
                drop(chat); // Rilascia il lock
                self.remove_if_empty(chat_id);
                Err(e)
            }
        }
    }

    /// Tra il send fallito e la rimozione qualcuno può essersi iscritto
    fn remove_if_empty(&self, chat_id: &i32) {
        self.channels
            .remove_if(chat_id, |_, tx| tx.receiver_count() == 0);
    }
}
