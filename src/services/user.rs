//! User services - Lista utenti (admin) e gestione dei follower

use crate::core::{AppError, AppState};
use crate::dtos::{FollowerDTO, FollowersQuery, UserDTO};
use crate::entities::User;
use crate::repositories::{Create, FollowPair, Read};
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Solo admin (vedi `admin_middleware` sulla route)
#[instrument(skip(state))]
pub async fn get_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<UserDTO>>, AppError> {
    let users = state.user.find_all().await?;
    Ok(Json(users.into_iter().map(UserDTO::from).collect()))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.id))]
pub async fn get_followers(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Query(query): Query<FollowersQuery>,
) -> Result<Json<Vec<FollowerDTO>>, AppError> {
    let followers = state
        .follow
        .find_followers(current_user.id, query.include_not_confirmed)
        .await?;
    Ok(Json(followers))
}

/// L'utente corrente chiede di seguire `followee_id`
#[instrument(skip(state, current_user), fields(user_id = %current_user.id))]
pub async fn post_follow(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(followee_id): Path<i32>,
) -> Result<(StatusCode, Json<bool>), AppError> {
    if followee_id == current_user.id {
        warn!("User tried to follow themselves");
        return Err(AppError::bad_request("You cannot follow yourself"));
    }
    if state.user.read(&followee_id).await?.is_none() {
        return Err(AppError::bad_request("User to follow does not exist"));
    }

    let pair = FollowPair {
        follower_id: current_user.id,
        followee_id,
    };
    if state.follow.read(&pair).await?.is_some() {
        return Err(AppError::bad_request("Follow request already exists"));
    }

    state.follow.create(&pair).await?;
    info!(followee_id, "Follow requested");
    Ok((StatusCode::CREATED, Json(true)))
}

/// L'utente corrente (followee) conferma la richiesta di `follower_id`
#[instrument(skip(state, current_user), fields(user_id = %current_user.id))]
pub async fn patch_follow_confirm(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(follower_id): Path<i32>,
) -> Result<Json<bool>, AppError> {
    let pair = FollowPair {
        follower_id,
        followee_id: current_user.id,
    };

    state.follow.confirm(pair).await.map_err(|e| match e {
        sqlx::Error::RowNotFound => AppError::bad_request("No pending follow request"),
        other => AppError::from(other),
    })?;

    info!(follower_id, "Follow confirmed");
    Ok(Json(true))
}

/// L'utente corrente smette di seguire `followee_id`.
/// Idempotente: risponde `true` anche se la relazione non esisteva.
#[instrument(skip(state, current_user), fields(user_id = %current_user.id))]
pub async fn delete_follow(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(followee_id): Path<i32>,
) -> Result<Json<bool>, AppError> {
    let removed = state
        .follow
        .remove(FollowPair {
            follower_id: current_user.id,
            followee_id,
        })
        .await?;

    info!(followee_id, removed, "Unfollow");
    Ok(Json(true))
}
