//! Comment services - commenti sotto `/posts/{post_id}/comments`

use crate::core::pagination::PaginationQuery;
use crate::core::{AppError, AppState};
use crate::dtos::{CommentDTO, CreateCommentDTO, Paginated, UpdateCommentDTO, UserDTO};
use crate::entities::{Comment, User};
use crate::repositories::{COMMENT_FIELDS, Delete, Paginate, Read, ReadMany, Update};
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

async fn to_comment_dtos(
    state: &AppState,
    comments: Vec<Comment>,
) -> Result<Vec<CommentDTO>, AppError> {
    let author_ids: Vec<i32> = comments
        .iter()
        .map(|c| c.author_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let authors: HashMap<i32, UserDTO> = state
        .user
        .read_many(&author_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, UserDTO::from(u)))
        .collect();

    Ok(comments
        .into_iter()
        .map(|c| {
            let author = authors.get(&c.author_id).cloned();
            CommentDTO::new(c, author)
        })
        .collect())
}

async fn comment_dto(state: &AppState, comment: Comment) -> Result<CommentDTO, AppError> {
    to_comment_dtos(state, vec![comment])
        .await?
        .pop()
        .ok_or_else(|| AppError::internal_server_error("Comment enrichment failed"))
}

async fn ensure_post_exists(state: &AppState, post_id: i32) -> Result<(), AppError> {
    state
        .post
        .read(&post_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::not_found("Post not found"))
}

#[instrument(skip(state, raw))]
pub async fn get_comments(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i32>,
    Query(raw): Query<Vec<(String, String)>>,
) -> Result<Json<Paginated<CommentDTO>>, AppError> {
    let query = PaginationQuery::parse(raw, COMMENT_FIELDS)?;
    ensure_post_exists(&state, post_id).await?;

    let page = state.comment.paginate(post_id, &query).await?;
    let after = query.cursor_after(&page.rows);
    let data = to_comment_dtos(&state, page.rows).await?;

    Ok(Json(query.into_response(
        data,
        after,
        page.total,
        &state.config.base_url(),
        &format!("posts/{}/comments", post_id),
    )))
}

/// Un commento inesistente (o di un altro post) è un 400
#[instrument(skip(state))]
pub async fn get_comment(
    State(state): State<Arc<AppState>>,
    Path((post_id, comment_id)): Path<(i32, i32)>,
) -> Result<Json<CommentDTO>, AppError> {
    let comment = state
        .comment
        .read(&comment_id)
        .await?
        .filter(|c| c.post_id == post_id)
        .ok_or_else(|| {
            AppError::bad_request("Comment not found")
                .with_details(format!("commentId: {}", comment_id))
        })?;

    Ok(Json(comment_dto(&state, comment).await?))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.id))]
pub async fn post_comment(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(post_id): Path<i32>,
    Json(body): Json<CreateCommentDTO>,
) -> Result<(StatusCode, Json<CommentDTO>), AppError> {
    body.validate()?;
    ensure_post_exists(&state, post_id).await?;

    let comment = state
        .comment
        .create_for_post(post_id, current_user.id, &body.comment)
        .await?;
    info!(comment_id = comment.id, "Comment created");

    Ok((StatusCode::CREATED, Json(comment_dto(&state, comment).await?)))
}

/// Autorizzazione in `is_comment_mine_or_admin`
#[instrument(skip(state, body))]
pub async fn patch_comment(
    State(state): State<Arc<AppState>>,
    Path((_post_id, comment_id)): Path<(i32, i32)>,
    Json(body): Json<UpdateCommentDTO>,
) -> Result<Json<CommentDTO>, AppError> {
    body.validate()?;
    let comment = state.comment.update(&comment_id, &body).await?;
    Ok(Json(comment_dto(&state, comment).await?))
}

#[instrument(skip(state))]
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Path((_post_id, comment_id)): Path<(i32, i32)>,
) -> Result<Json<i32>, AppError> {
    state.comment.delete(&comment_id).await?;
    info!(comment_id, "Comment deleted");
    Ok(Json(comment_id))
}
