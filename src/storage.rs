use std::path::{Path, PathBuf};

use crate::error::AppError;

pub const MAX_AVATAR_SIZE: usize = 2 * 1024 * 1024; // 2 MB

/// Image formats accepted for profile pictures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Identify an upload by its leading bytes; the client's declared type is
/// not trusted.
pub fn sniff_image(bytes: &[u8]) -> Option<ImageFormat> {
    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];

    if bytes.starts_with(PNG) {
        Some(ImageFormat::Png)
    } else if bytes.starts_with(JPEG) {
        Some(ImageFormat::Jpeg)
    } else {
        None
    }
}

/// Check size and type of a profile picture without storing it.
pub fn validate_avatar(bytes: &[u8]) -> Result<ImageFormat, AppError> {
    if bytes.is_empty() {
        return Err(AppError::BadRequest("image is empty".to_string()));
    }
    if bytes.len() > MAX_AVATAR_SIZE {
        return Err(AppError::PayloadTooLarge(format!(
            "image exceeds maximum size of {} MB",
            MAX_AVATAR_SIZE / (1024 * 1024)
        )));
    }
    sniff_image(bytes).ok_or_else(|| {
        AppError::BadRequest("unsupported image type. allowed: png, jpg, jpeg".to_string())
    })
}

/// Validate and store a profile picture under `<storage>/avatars/`.
/// Returns `(relative_url, format)`.
pub async fn save_avatar(
    storage_path: &Path,
    entity_id: &str,
    bytes: &[u8],
) -> Result<(String, ImageFormat), AppError> {
    let format = validate_avatar(bytes)?;

    let dir = storage_path.join("avatars");
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::Internal(format!("failed to create avatars directory: {e}")))?;

    let filename = format!("{}.{}", sanitize_filename(entity_id), format.extension());
    // Land the new file under a name no cleanup matches, then swap it in.
    let staging = dir.join(format!(".{filename}.{}.tmp", uuid::Uuid::new_v4()));
    if let Err(e) = tokio::fs::write(&staging, bytes).await {
        return Err(AppError::Internal(format!("failed to write avatar file: {e}")));
    }
    if let Err(e) = tokio::fs::rename(&staging, dir.join(&filename)).await {
        if let Err(cleanup) = tokio::fs::remove_file(&staging).await {
            tracing::warn!("failed to remove staged avatar {:?}: {cleanup}", staging);
        }
        return Err(AppError::Internal(format!("failed to store avatar file: {e}")));
    }

    // Re-uploads may change extension.
    remove_stale_avatars(&dir, entity_id, &filename).await;

    Ok((format!("/cdn/avatars/{filename}"), format))
}

/// Remove `entity_id.*` files in `dir` other than `keep`. Failures are logged.
async fn remove_stale_avatars(dir: &Path, entity_id: &str, keep: &str) {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("failed to read avatars directory {:?}: {e}", dir);
            return;
        }
    };
    let prefix = format!("{}.", sanitize_filename(entity_id));
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("failed to read avatars directory entry: {e}");
                break;
            }
        };
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name != keep && name.starts_with(&prefix) {
            if let Err(e) = tokio::fs::remove_file(entry.path()).await {
                tracing::warn!("failed to remove stale avatar {name}: {e}");
            }
        }
    }
}

/// Strip path separators and leading dots so a name cannot escape its directory.
fn sanitize_filename(name: &str) -> String {
    let name = name.replace(['/', '\\', '\0'], "_");
    let name = name.trim_start_matches('.');
    if name.is_empty() {
        "file".to_string()
    } else {
        name.to_string()
    }
}

/// Fresh, unique storage root for tests.
pub fn temp_storage_path() -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("relay-test-{}", uuid::Uuid::new_v4()));
    path
}
