//! Server library - espone i moduli principali per i test

pub mod core;
pub mod dtos;
pub mod entities;
pub mod repositories;
pub mod services;
pub mod ws;

// Re-export dei tipi principali per facilitare l'import
pub use core::{AppError, AppState, auth, config};
pub use services::root;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{any, get, patch, post},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir};

/// Limite del body per l'upload, un po' sopra la dimensione massima dell'immagine
const UPLOAD_BODY_LIMIT: usize = core::storage::MAX_IMAGE_BYTES + 1024 * 1024;

/// Crea il router principale dell'applicazione
pub fn create_router(state: Arc<AppState>) -> Router {
    use core::access_token_middleware;

    // Tutto ciò che sta fuori da /auth richiede un access token
    let protected = Router::new()
        .nest("/users", configure_user_routes(state.clone()))
        .nest("/posts", configure_post_routes(state.clone()))
        .nest("/common", configure_common_routes())
        .nest("/chats", configure_chat_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            access_token_middleware,
        ));

    Router::new()
        .route("/", get(root))
        .nest("/auth", configure_auth_routes(state.clone()))
        .merge(protected)
        .nest_service("/public", ServeDir::new(&state.config.public_dir))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(core::logging::log_requests))
        .with_state(state)
}

/// Configura le routes di autenticazione (registrazione, login, rotazione token)
fn configure_auth_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::refresh_token_middleware;
    use services::*;

    let rotation = Router::new()
        .route("/token/access", post(token_access))
        .route("/token/refresh", post(token_refresh))
        .layer(middleware::from_fn_with_state(
            state,
            refresh_token_middleware,
        ));

    Router::new()
        .route("/register/email", post(register_email))
        .route("/login/email", post(login_email))
        .merge(rotation)
}

/// Configura le routes per utenti e follow
fn configure_user_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::admin_middleware;
    use services::*;

    Router::new()
        .route(
            "/",
            get(get_users).route_layer(middleware::from_fn_with_state(state, admin_middleware)),
        )
        .route("/follow/me", get(get_followers))
        .route("/follow/{user_id}", post(post_follow).delete(delete_follow))
        .route("/follow/{user_id}/confirm", patch(patch_follow_confirm))
}

/// Configura le routes per post e commenti
fn configure_post_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::{is_comment_mine_or_admin, is_post_mine_or_admin};
    use services::*;

    // modifica e cancellazione solo per l'autore (o un admin)
    let post_owner_only = patch(patch_post)
        .delete(delete_post)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            is_post_mine_or_admin,
        ));

    let comment_owner_only = patch(patch_comment)
        .delete(delete_comment)
        .route_layer(middleware::from_fn_with_state(
            state,
            is_comment_mine_or_admin,
        ));

    Router::new()
        .route("/", get(get_posts).post(post_posts))
        .route("/random", post(post_random_posts))
        .route("/{post_id}", get(get_post).merge(post_owner_only))
        .route(
            "/{post_id}/comments",
            get(get_comments).post(post_comment),
        )
        .route(
            "/{post_id}/comments/{comment_id}",
            get(get_comment).merge(comment_owner_only),
        )
}

/// Configura le routes di utilità (upload immagini)
fn configure_common_routes() -> Router<Arc<AppState>> {
    use services::*;

    Router::new()
        .route("/image", post(post_image))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}

/// Configura le routes per la gestione delle chat
fn configure_chat_routes() -> Router<Arc<AppState>> {
    use services::*;
    use ws::ws_handler;

    Router::new()
        .route("/", get(get_chats))
        .route("/{chat_id}/messages", get(get_chat_messages))
        .route("/ws", any(ws_handler))
}
