use crate::dtos::ServerEvent;
use dashmap::DashMap;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};

/// Segnali verso il task di scrittura di un socket
#[derive(Debug)]
pub enum InternalSignal {
    Shutdown,
    /// entra nella stanza della chat
    AddChat(i32),
    /// evento da inoltrare così com'è al client
    Event(ServerEvent),
}

impl InternalSignal {
    fn kind(&self) -> &'static str {
        match self {
            InternalSignal::Shutdown => "Shutdown",
            InternalSignal::AddChat(_) => "AddChat",
            InternalSignal::Event(_) => "Event",
        }
    }
}

pub struct UserMap {
    users_online: DashMap<i32, UnboundedSender<InternalSignal>>,
}

impl Default for UserMap {
    fn default() -> Self {
        Self::new()
    }
}

impl UserMap {
    pub fn new() -> Self {
        UserMap {
            users_online: DashMap::new(),
        }
    }

    /// Una seconda connessione dello stesso utente sostituisce la precedente
    #[instrument(skip(self, tx))]
    pub fn register_online(&self, user_id: i32, tx: UnboundedSender<InternalSignal>) {
        if let Some(previous) = self.users_online.insert(user_id, tx) {
            debug!("Replacing previous connection");
            let _ = previous.send(InternalSignal::Shutdown);
        }
        info!("Total online users: {}", self.users_online.len());
    }

    /// Rimuove l'utente solo se il canale registrato è ancora quello della connessione che chiude
    #[instrument(skip(self, tx))]
    pub fn remove_from_online(&self, user_id: &i32, tx: &UnboundedSender<InternalSignal>) {
        let removed = self
            .users_online
            .remove_if(user_id, |_, current| current.same_channel(tx));
        if removed.is_some() {
            info!("User removed from online");
        }
    }

    #[instrument(skip(self, message))]
    pub fn send_server_message_if_online(&self, user_id: &i32, message: InternalSignal) {
        let kind = message.kind();
        if let Some(entry) = self.users_online.get(user_id) {
            if let Err(e) = entry.value().send(message) {
                warn!("Failed to send {} signal to user: {:?}", kind, e);
            } else {
                debug!("{} signal sent to online user", kind);
            }
        } else {
            debug!("User {} not online, {} signal not sent", user_id, kind);
        }
    }
}
