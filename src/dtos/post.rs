//! Post DTOs - Data Transfer Objects per post e immagini

use crate::core::storage::public_post_image_path;
use crate::dtos::UserDTO;
use crate::entities::{Image, ImageType, Post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageDTO {
    pub id: i32,
    pub order: i32,
    #[serde(rename = "type")]
    pub image_type: ImageType,
    /// `/public/posts/{file}`
    pub path: String,
}

impl From<Image> for ImageDTO {
    fn from(value: Image) -> Self {
        Self {
            id: value.id,
            order: value.order,
            image_type: value.image_type,
            path: public_post_image_path(&value.path),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PostDTO {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub like_count: i32,
    pub comment_count: i32,
    pub author: Option<UserDTO>,
    pub images: Vec<ImageDTO>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostDTO {
    pub fn new(post: Post, author: Option<UserDTO>, images: Vec<ImageDTO>) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            like_count: post.like_count,
            comment_count: post.comment_count,
            author,
            images,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreatePostDTO {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,

    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: String,

    /// nomi dei file caricati in precedenza in `public/temp`
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdatePostDTO {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: Option<String>,
}

/// Risposta di POST /common/image
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageUploadDTO {
    pub file_name: String,
}
