//! Services module - Coordinatore per tutti i service handler HTTP
//!
//! Questo modulo organizza i service handlers in sotto-moduli separati per una migliore manutenibilità.
//! Ogni modulo gestisce gli endpoint HTTP per una specifica funzionalità.

pub mod auth;
pub mod chat;
pub mod comment;
pub mod common;
pub mod post;
pub mod user;

// Re-exports per facilitare l'import
pub use auth::{login_email, register_email, token_access, token_refresh};
pub use chat::{get_chat_messages, get_chats};
pub use comment::{delete_comment, get_comment, get_comments, patch_comment, post_comment};
pub use common::post_image;
pub use post::{delete_post, get_post, get_posts, patch_post, post_posts, post_random_posts};
pub use user::{delete_follow, get_followers, get_users, patch_follow_confirm, post_follow};

use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

/// Root endpoint - health check
pub async fn root(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, "Server is running!")
}
