//! Post services - CRUD dei post con immagini e paginazione

use crate::core::pagination::PaginationQuery;
use crate::core::storage;
use crate::core::{AppError, AppState};
use crate::dtos::{CreatePostDTO, ImageDTO, Paginated, PostDTO, UpdatePostDTO, UserDTO};
use crate::entities::{Post, User};
use crate::repositories::{Delete, POST_FIELDS, Paginate, Read, ReadMany, Update};
use axum_macros::debug_handler;
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use sqlx::{MySql, Transaction};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

const RANDOM_POSTS: usize = 100;

/// Arricchisce i post con autore e immagini (due query in parallelo, non una per post)
pub async fn to_post_dtos(state: &AppState, posts: Vec<Post>) -> Result<Vec<PostDTO>, AppError> {
    if posts.is_empty() {
        return Ok(Vec::new());
    }

    let author_ids: Vec<i32> = posts
        .iter()
        .map(|p| p.author_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let post_ids: Vec<i32> = posts.iter().map(|p| p.id).collect();

    let (authors, images) = tokio::try_join!(
        state.user.read_many(&author_ids),
        state.image.find_by_post_ids(&post_ids)
    )?;

    let authors: HashMap<i32, UserDTO> = authors
        .into_iter()
        .map(|u| (u.id, UserDTO::from(u)))
        .collect();

    let mut images_by_post: HashMap<i32, Vec<ImageDTO>> = HashMap::new();
    for image in images {
        if let Some(post_id) = image.post_id {
            images_by_post
                .entry(post_id)
                .or_default()
                .push(ImageDTO::from(image));
        }
    }

    Ok(posts
        .into_iter()
        .map(|post| {
            let author = authors.get(&post.author_id).cloned();
            let images = images_by_post.remove(&post.id).unwrap_or_default();
            PostDTO::new(post, author, images)
        })
        .collect())
}

async fn post_dto(state: &AppState, post: Post) -> Result<PostDTO, AppError> {
    to_post_dtos(state, vec![post])
        .await?
        .pop()
        .ok_or_else(|| AppError::internal_server_error("Post enrichment failed"))
}

#[instrument(skip(state, raw))]
pub async fn get_posts(
    State(state): State<Arc<AppState>>,
    Query(raw): Query<Vec<(String, String)>>,
) -> Result<Json<Paginated<PostDTO>>, AppError> {
    let query = PaginationQuery::parse(raw, POST_FIELDS)?;
    let page = state.post.paginate((), &query).await?;
    let after = query.cursor_after(&page.rows);
    debug!(rows = page.rows.len(), ?after, "Posts page loaded");

    let data = to_post_dtos(&state, page.rows).await?;
    Ok(Json(query.into_response(
        data,
        after,
        page.total,
        &state.config.base_url(),
        "posts",
    )))
}

#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i32>,
) -> Result<Json<PostDTO>, AppError> {
    let post = state
        .post
        .read(&post_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))?;
    Ok(Json(post_dto(&state, post).await?))
}

/// Inserisce post e immagini nella transazione, spostando i file da temp a posts.
/// I file spostati finiscono in `moved` per poterli ripristinare in caso di errore.
async fn insert_post_with_images(
    state: &AppState,
    tx: &mut Transaction<'_, MySql>,
    moved: &mut Vec<String>,
    author_id: i32,
    body: &CreatePostDTO,
) -> Result<i32, AppError> {
    let post_id = state
        .post
        .create_in_tx(tx, author_id, &body.title, &body.content)
        .await?;

    for (order, file_name) in body.images.iter().enumerate() {
        storage::move_temp_to_posts(&state.config.public_dir, file_name).await?;
        moved.push(file_name.clone());
        state
            .image
            .create_in_tx(tx, post_id, order as i32, file_name)
            .await?;
    }

    Ok(post_id)
}

#[debug_handler]
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.id, images = body.images.len()))]
pub async fn post_posts(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreatePostDTO>,
) -> Result<(StatusCode, Json<PostDTO>), AppError> {
    body.validate()?;

    let mut tx = state.post.begin().await?;
    let mut moved = Vec::new();

    let post_id =
        match insert_post_with_images(&state, &mut tx, &mut moved, current_user.id, &body).await {
            Ok(id) => id,
            Err(e) => {
                warn!("Post creation failed, rolling back: {}", e);
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("Rollback failed: {:?}", rollback_err);
                }
                storage::restore_to_temp(&state.config.public_dir, &moved).await;
                return Err(e);
            }
        };

    if let Err(e) = tx.commit().await {
        storage::restore_to_temp(&state.config.public_dir, &moved).await;
        return Err(e.into());
    }

    info!(post_id, "Post created");
    let post = state.post.read(&post_id).await?.ok_or_else(|| AppError::not_found("Post not found"))?;
    Ok((StatusCode::CREATED, Json(post_dto(&state, post).await?)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.id))]
pub async fn post_random_posts(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<(StatusCode, Json<bool>), AppError> {
    let created = state
        .post
        .generate_random(current_user.id, RANDOM_POSTS)
        .await?;
    info!(created, "Random posts generated");
    Ok((StatusCode::CREATED, Json(true)))
}

/// Autorizzazione in `is_post_mine_or_admin`
#[instrument(skip(state, body))]
pub async fn patch_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i32>,
    Json(body): Json<UpdatePostDTO>,
) -> Result<Json<PostDTO>, AppError> {
    body.validate()?;
    let post = state.post.update(&post_id, &body).await?;
    Ok(Json(post_dto(&state, post).await?))
}

#[instrument(skip(state))]
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i32>,
) -> Result<Json<i32>, AppError> {
    state.post.delete(&post_id).await?;
    info!(post_id, "Post deleted");
    Ok(Json(post_id))
}
