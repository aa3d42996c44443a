//! Auth services - Registrazione, login e rotazione dei token

use crate::core::auth::{
    RawToken, TokenType, decode_basic_token, extract_token_from_header, login_user, rotate_token,
};
use crate::core::{AppError, AppState};
use crate::dtos::{AccessTokenDTO, CreateUserDTO, RefreshTokenDTO, RegisterUserDTO, TokensDTO};
use crate::entities::User;
use crate::repositories::Create;
use axum::{
    Extension,
    extract::{Json, State},
    http::{HeaderMap, StatusCode, header},
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Verifica email e password, con lo stesso errore per utente inesistente e password errata
pub async fn authenticate_with_email_and_password(
    state: &AppState,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    let user = state.user.find_by_email(email).await?.ok_or_else(|| {
        warn!("Login attempted for unknown email");
        AppError::unauthorized("Email or password are not correct")
    })?;

    if !user.verify_password(password) {
        warn!(user_id = user.id, "Wrong password");
        return Err(AppError::unauthorized("Email or password are not correct"));
    }

    Ok(user)
}

#[instrument(skip(state, body), fields(nickname = %body.nickname))]
pub async fn register_email(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterUserDTO>,
) -> Result<(StatusCode, Json<TokensDTO>), AppError> {
    // 1. Validare il DTO (nickname 1..=20, email, password 3..=8)
    // 2. Nickname ed email devono essere liberi, altrimenti 400
    // 3. Hash della password con il costo configurato
    // 4. Salvare l'utente e restituire subito la coppia di token
    body.validate()?;

    if state.user.find_by_nickname(&body.nickname).await?.is_some() {
        warn!("Nickname already in use");
        return Err(AppError::bad_request("Nickname already in use"));
    }
    if state.user.find_by_email(&body.email).await?.is_some() {
        warn!("Email already in use");
        return Err(AppError::bad_request("Email already in use"));
    }

    let password = User::hash_password(&body.password, state.config.hash_rounds)
        .map_err(|_| AppError::internal_server_error("Failed to hash password"))?;

    let user = state
        .user
        .create(&CreateUserDTO {
            nickname: body.nickname,
            email: body.email,
            password,
        })
        .await?;

    info!(user_id = user.id, "User registered");
    Ok((StatusCode::CREATED, Json(login_user(&user, &state.config)?)))
}

#[instrument(skip(state, headers))]
pub async fn login_email(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<TokensDTO>, AppError> {
    let raw = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("No token provided"))?;

    let token = extract_token_from_header(raw, false)?;
    let (email, password) = decode_basic_token(token)?;
    debug!("Basic credentials decoded");

    let user = authenticate_with_email_and_password(&state, &email, &password).await?;
    info!(user_id = user.id, "User logged in");
    Ok(Json(login_user(&user, &state.config)?))
}

/// Nuovo access token a partire dal refresh token
#[instrument(skip(state, token))]
pub async fn token_access(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<RawToken>,
) -> Result<Json<AccessTokenDTO>, AppError> {
    let access_token = rotate_token(&token.0, TokenType::Access, &state.config)?;
    Ok(Json(AccessTokenDTO { access_token }))
}

/// Nuovo refresh token a partire dal refresh token
#[instrument(skip(state, token))]
pub async fn token_refresh(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<RawToken>,
) -> Result<Json<RefreshTokenDTO>, AppError> {
    let refresh_token = rotate_token(&token.0, TokenType::Refresh, &state.config)?;
    Ok(Json(RefreshTokenDTO { refresh_token }))
}
