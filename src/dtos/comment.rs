use crate::dtos::UserDTO;
use crate::entities::Comment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CommentDTO {
    pub id: i32,
    pub post_id: i32,
    pub comment: String,
    pub like_count: i32,
    pub author: Option<UserDTO>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommentDTO {
    pub fn new(comment: Comment, author: Option<UserDTO>) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            comment: comment.comment,
            like_count: comment.like_count,
            author,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateCommentDTO {
    #[validate(length(min = 1, message = "comment must not be empty"))]
    pub comment: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateCommentDTO {
    #[validate(length(min = 1, message = "comment must not be empty"))]
    pub comment: Option<String>,
}
