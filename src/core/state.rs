//! Application State - Stato globale dell'applicazione
//!
//! Contiene tutti i repository, la configurazione e lo stato condiviso
//! necessario per gestire l'applicazione.

use crate::core::Config;
use crate::repositories::{
    ChatRepository, CommentRepository, ImageRepository, MessageRepository, PostRepository,
    UserFollowerRepository, UserRepository,
};
use crate::ws::chatmap::ChatMap;
use crate::ws::usermap::UserMap;
use sqlx::MySqlPool;

/// Stato globale dell'applicazione condiviso tra tutte le route e middleware
pub struct AppState {
    pub user: UserRepository,
    pub post: PostRepository,
    pub image: ImageRepository,
    pub comment: CommentRepository,
    pub follow: UserFollowerRepository,
    pub chat: ChatRepository,
    pub msg: MessageRepository,

    /// Secret JWT, TTL dei token, cartelle pubbliche e URL base per la paginazione
    pub config: Config,

    /// Mappa concorrente degli utenti online con i loro canali WebSocket
    /// Key: user_id, Value: Sender per inviare segnali al task di scrittura dell'utente
    pub users_online: UserMap,

    /// Stanze delle chat con almeno un socket collegato
    pub chats_online: ChatMap,
}

impl AppState {
    /// Crea una nuova istanza di AppState inizializzando tutti i repository
    /// con il pool di connessioni fornito.
    pub fn new(pool: MySqlPool, config: Config) -> Self {
        Self {
            user: UserRepository::new(pool.clone()),
            post: PostRepository::new(pool.clone()),
            image: ImageRepository::new(pool.clone()),
            comment: CommentRepository::new(pool.clone()),
            follow: UserFollowerRepository::new(pool.clone()),
            chat: ChatRepository::new(pool.clone()),
            msg: MessageRepository::new(pool),
            config,
            users_online: UserMap::new(),
            chats_online: ChatMap::new(),
        }
    }
}
