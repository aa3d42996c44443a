use crate::core::{AppError, AppState, Config};
use crate::dtos::TokensDTO;
use crate::entities::{User, UserRole};
use crate::repositories::Read;
use axum::extract::{Path, State};
use axum::{Extension, body::Body, extract::Request, http, http::Response, middleware::Next};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

// struct che codifica il contenuto del token jwt
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32, // id dell'utente
    pub email: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub iat: usize, // Issued at time of the token
    pub exp: usize, // Expiry time of the token
}

#[instrument(skip(user, secret), fields(user_id = %user.id, ?token_type))]
pub fn sign_token(
    user: &User,
    token_type: TokenType,
    secret: &str,
    ttl_secs: i64,
) -> Result<String, AppError> {
    debug!("Encoding JWT token for user");
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        token_type,
        iat: now as usize,
        exp: (now + ttl_secs) as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        warn!("Failed to encode JWT token: {:?}", e);
        AppError::internal_server_error("Error in encoding jwt token")
    })?;
    Ok(token)
}

/// Coppia access/refresh restituita da register e login
pub fn login_user(user: &User, config: &Config) -> Result<TokensDTO, AppError> {
    let tokens = TokensDTO {
        access_token: sign_token(
            user,
            TokenType::Access,
            &config.jwt_secret,
            config.access_token_ttl_secs,
        )?,
        refresh_token: sign_token(
            user,
            TokenType::Refresh,
            &config.jwt_secret,
            config.refresh_token_ttl_secs,
        )?,
    };
    info!(user_id = user.id, "Tokens issued");
    Ok(tokens)
}

/// `Bearer xxx` oppure `Basic xxx`: esattamente due parti, prefisso coerente con il tipo richiesto
pub fn extract_token_from_header(header: &str, is_bearer: bool) -> Result<&str, AppError> {
    let parts: Vec<&str> = header.split_whitespace().collect();
    let prefix = if is_bearer { "Bearer" } else { "Basic" };

    match parts.as_slice() {
        [p, token] if *p == prefix => Ok(token),
        _ => {
            warn!("Malformed authorization header");
            Err(AppError::unauthorized("Invalid token").with_details(format!(
                "expected '{} <token>'",
                prefix
            )))
        }
    }
}

/// base64(`email:password`) -> (email, password)
pub fn decode_basic_token(token: &str) -> Result<(String, String), AppError> {
    let invalid = || AppError::unauthorized("Invalid basic token");

    let bytes = STANDARD.decode(token).map_err(|_| invalid())?;
    let decoded = String::from_utf8(bytes).map_err(|_| invalid())?;

    let split: Vec<&str> = decoded.split(':').collect();
    match split.as_slice() {
        [email, password] => Ok((email.to_string(), password.to_string())),
        _ => {
            warn!("Basic token does not contain exactly one ':'");
            Err(invalid())
        }
    }
}

#[instrument(skip(token, secret))]
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    debug!("Decoding JWT token");
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// Firma un nuovo token del tipo richiesto a partire da un refresh token valido
#[instrument(skip(token, config))]
pub fn rotate_token(token: &str, target: TokenType, config: &Config) -> Result<String, AppError> {
    let claims = verify_token(token, &config.jwt_secret)?;

    if claims.token_type != TokenType::Refresh {
        warn!("Rotation attempted with an access token");
        return Err(AppError::unauthorized(
            "Token rotation requires a refresh token",
        ));
    }

    let ttl = match target {
        TokenType::Access => config.access_token_ttl_secs,
        TokenType::Refresh => config.refresh_token_ttl_secs,
    };

    let now = Utc::now().timestamp();
    let rotated = Claims {
        sub: claims.sub,
        email: claims.email,
        token_type: target,
        iat: now as usize,
        exp: (now + ttl) as usize,
    };
    encode(
        &Header::default(),
        &rotated,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| {
        warn!("Failed to encode rotated token: {:?}", e);
        AppError::internal_server_error("Error in encoding jwt token")
    })
}

/// Legge e valida il bearer token dagli header, poi carica l'utente dal db
pub async fn authenticate_bearer(
    state: &AppState,
    headers: &http::HeaderMap,
    expected: TokenType,
) -> Result<(User, String), AppError> {
    let auth_header = match headers.get(http::header::AUTHORIZATION) {
        Some(header) => header.to_str().map_err(|_| {
            warn!("Invalid authorization header format");
            AppError::unauthorized("Invalid authorization header")
        })?,
        None => {
            warn!("Missing authorization header");
            return Err(AppError::unauthorized("No token provided"));
        }
    };

    let token = extract_token_from_header(auth_header, true)?;
    let claims = verify_token(token, &state.config.jwt_secret)?;

    if claims.token_type != expected {
        warn!(?expected, found = ?claims.token_type, "Wrong token type");
        return Err(AppError::unauthorized("Wrong token type"));
    }

    // Fetch the user details from the database
    let user = state.user.read(&claims.sub).await?.ok_or_else(|| {
        warn!("User not found in database: {}", claims.sub);
        AppError::unauthorized("You are not an authorized user")
    })?;

    Ok((user, token.to_string()))
}

/// Token già validato, disponibile agli handler di rotazione
#[derive(Debug, Clone)]
pub struct RawToken(pub String);

#[instrument(skip(state, req, next))]
pub async fn access_token_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    debug!("Running access token middleware");
    let (user, _) = authenticate_bearer(&state, req.headers(), TokenType::Access).await?;
    debug!("User authenticated: {}", user.id);
    req.extensions_mut().insert(user);
    // voledo si può recuperare lo user da extension
    Ok(next.run(req).await)
}

#[instrument(skip(state, req, next))]
pub async fn refresh_token_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    debug!("Running refresh token middleware");
    let (user, token) = authenticate_bearer(&state, req.headers(), TokenType::Refresh).await?;
    req.extensions_mut().insert(user);
    req.extensions_mut().insert(RawToken(token));
    Ok(next.run(req).await)
}

/// Verifica che l'utente abbia il ruolo richiesto
pub fn require_role(user: &User, role: UserRole) -> Result<(), AppError> {
    if user.role != role {
        warn!(
            "User {} has role {:?}, required {:?}",
            user.id, user.role, role
        );
        return Err(AppError::forbidden("Insufficient role")
            .with_details(format!("This action requires role {:?}", role)));
    }
    Ok(())
}

/// Da montare dopo `access_token_middleware`
pub async fn admin_middleware(
    Extension(current_user): Extension<User>,
    req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    require_role(&current_user, UserRole::Admin)?;
    Ok(next.run(req).await)
}

/// Il post deve esistere ed appartenere all'utente corrente, gli admin passano sempre
#[instrument(skip(state, current_user, req, next), fields(user_id = %current_user.id))]
pub async fn is_post_mine_or_admin(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(post_id): Path<i32>,
    req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    let post = state
        .post
        .read(&post_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))?;

    if !current_user.is_admin() && post.author_id != current_user.id {
        warn!("User is not the author of post {}", post_id);
        return Err(AppError::forbidden("You are not the author of this post"));
    }

    Ok(next.run(req).await)
}

#[instrument(skip(state, current_user, req, next), fields(user_id = %current_user.id))]
pub async fn is_comment_mine_or_admin(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path((post_id, comment_id)): Path<(i32, i32)>,
    req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    let comment = state
        .comment
        .read(&comment_id)
        .await?
        .filter(|c| c.post_id == post_id)
        .ok_or_else(|| AppError::not_found("Comment not found"))?;

    if !current_user.is_admin() && comment.author_id != current_user.id {
        warn!("User is not the author of comment {}", comment_id);
        return Err(AppError::forbidden("You are not the author of this comment"));
    }

    Ok(next.run(req).await)
}
