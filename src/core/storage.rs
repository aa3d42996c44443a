//! Storage locale delle immagini
//!
//! Il client carica prima l'immagine in `public/temp` (POST /common/image) e
//! poi la referenzia per nome alla creazione del post: in quel momento il file
//! viene spostato in `public/posts`.

use crate::core::AppError;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

pub const TEMP_FOLDER: &str = "temp";
pub const POSTS_FOLDER: &str = "posts";
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

lazy_static! {
    // solo nomi generati dal server: niente separatori, niente `..`
    static ref FILE_NAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]+\.(jpg|jpeg|png)$").unwrap();
}

pub fn temp_dir(public_dir: &Path) -> PathBuf {
    public_dir.join(TEMP_FOLDER)
}

pub fn posts_dir(public_dir: &Path) -> PathBuf {
    public_dir.join(POSTS_FOLDER)
}

pub async fn ensure_dirs(public_dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(temp_dir(public_dir)).await?;
    fs::create_dir_all(posts_dir(public_dir)).await?;
    Ok(())
}

/// Estensione normalizzata del file caricato, se ammessa
pub fn allowed_extension(original_name: &str) -> Option<&'static str> {
    let ext = Path::new(original_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    ALLOWED_EXTENSIONS.iter().copied().find(|allowed| *allowed == ext)
}

pub fn is_valid_file_name(file_name: &str) -> bool {
    FILE_NAME_RE.is_match(file_name)
}

/// Path pubblico con cui un'immagine di post viene esposta
pub fn public_post_image_path(file_name: &str) -> String {
    format!("/public/{}/{}", POSTS_FOLDER, file_name)
}

/// Salva i byte in `temp/{uuid}.{ext}` e ritorna il nome del file
pub async fn save_temp_image(
    public_dir: &Path,
    extension: &str,
    bytes: &[u8],
) -> Result<String, AppError> {
    let file_name = format!("{}.{}", uuid::Uuid::new_v4(), extension);
    let dir = temp_dir(public_dir);
    fs::create_dir_all(&dir).await?;
    fs::write(dir.join(&file_name), bytes).await?;
    info!(file_name = %file_name, size = bytes.len(), "Temp image stored");
    Ok(file_name)
}

/// Sposta un file da `temp/` a `posts/`. Un file inesistente è un errore del client.
pub async fn move_temp_to_posts(public_dir: &Path, file_name: &str) -> Result<(), AppError> {
    if !is_valid_file_name(file_name) {
        warn!("Rejected image file name: {}", file_name);
        return Err(AppError::bad_request("Invalid image file name")
            .with_details(file_name.to_string()));
    }

    let source = temp_dir(public_dir).join(file_name);
    if !fs::try_exists(&source).await.unwrap_or(false) {
        warn!("Temp file not found: {}", source.display());
        return Err(AppError::bad_request("Temp file does not exist")
            .with_details(file_name.to_string()));
    }

    let target_dir = posts_dir(public_dir);
    fs::create_dir_all(&target_dir).await?;
    fs::rename(&source, target_dir.join(file_name)).await?;
    debug!("Moved {} to posts", file_name);
    Ok(())
}

/// Riporta in `temp/` i file già spostati quando la transazione del post fallisce
pub async fn restore_to_temp(public_dir: &Path, file_names: &[String]) {
    for file_name in file_names {
        let source = posts_dir(public_dir).join(file_name);
        if let Err(e) = fs::rename(&source, temp_dir(public_dir).join(file_name)).await {
            warn!("Unable to restore {} to temp: {:?}", file_name, e);
        }
    }
}
