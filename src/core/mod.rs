//! Core Module - Componenti infrastrutturali dell'applicazione
//!
//! Questo modulo contiene tutti i componenti "core" dell'applicazione:
//! - Autenticazione e JWT
//! - Configurazione
//! - Gestione errori
//! - Paginazione generica
//! - Storage delle immagini
//! - Stato applicazione

pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod pagination;
pub mod state;
pub mod storage;

// Re-exports per facilitare l'import
pub use auth::{
    Claims, TokenType, access_token_middleware, admin_middleware, is_comment_mine_or_admin,
    is_post_mine_or_admin, refresh_token_middleware,
};
pub use config::Config;
pub use error::AppError;
pub use pagination::{PaginatedField, PaginationQuery};
pub use state::AppState;
