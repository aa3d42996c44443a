//! Common services - upload delle immagini in `public/temp`

use crate::core::storage::{self, MAX_IMAGE_BYTES};
use crate::core::{AppError, AppState};
use crate::dtos::ImageUploadDTO;
use axum_macros::debug_handler;
use axum::{
    extract::{Json, Multipart, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

const IMAGE_FIELD: &str = "image";

/// Accetta un solo campo multipart `image` (jpg/jpeg/png, al massimo 10MB)
#[debug_handler]
#[instrument(skip(state, multipart))]
pub async fn post_image(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ImageUploadDTO>), AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let extension = storage::allowed_extension(&original_name).ok_or_else(|| {
            warn!("Rejected upload with name {}", original_name);
            AppError::bad_request("Only jpg, jpeg and png files are allowed")
        })?;

        let bytes = field.bytes().await?;
        if bytes.len() > MAX_IMAGE_BYTES {
            warn!(size = bytes.len(), "Upload too large");
            return Err(AppError::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                "File exceeds the 10MB limit",
            ));
        }

        let file_name =
            storage::save_temp_image(&state.config.public_dir, extension, &bytes).await?;
        info!(file_name = %file_name, "Image uploaded");
        return Ok((StatusCode::CREATED, Json(ImageUploadDTO { file_name })));
    }

    Err(AppError::bad_request("Missing 'image' field"))
}
