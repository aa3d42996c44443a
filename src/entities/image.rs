//! Image entity - Immagine allegata ad un post

use super::enums::ImageType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Image {
    pub id: i32,
    // ordine di visualizzazione all'interno del post
    pub order: i32,
    #[sqlx(rename = "type")]
    pub image_type: ImageType,
    // solo il nome del file, il path pubblico viene composto nel DTO
    pub path: String,
    pub post_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
