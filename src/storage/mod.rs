use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    config::Config,
    errors::{AppError, Result},
    utils::file::sanitize_filename,
};

pub mod local;

pub use local::LocalStorage;

/// URL prefix under which stored uploads are served.
pub const UPLOADS_URL_PREFIX: &str = "/static/uploads";

#[async_trait]
pub trait Storage: Send + Sync {
    async fn store(&self, path: &str, data: &[u8]) -> Result<()>;

    async fn remove(&self, path: &str) -> Result<()>;

    /// Public URL a stored object is reachable at.
    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", UPLOADS_URL_PREFIX, path)
    }
}

pub fn create_storage(config: &Config) -> Result<LocalStorage> {
    LocalStorage::new(&config.upload_dir)
}

/// An image file attached to a resume form.
#[derive(Debug, Clone)]
pub struct ProfilePicture {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct UploadRules {
    pub max_size: usize,
    pub allowed_mime_types: Vec<String>,
}

impl UploadRules {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_size: config.max_upload_size,
            allowed_mime_types: config.allowed_mime_types.clone(),
        }
    }
}

/// A picture written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub path: String,
    pub url: String,
}

/// Validates a profile picture and stores it under its sanitized name,
/// prefixed so uploads never overwrite each other.
pub async fn save_profile_picture(
    storage: &dyn Storage,
    rules: &UploadRules,
    picture: &ProfilePicture,
) -> Result<StoredUpload> {
    let filename = sanitize_filename(&picture.filename);
    if filename.is_empty() {
        return Err(AppError::Validation("Invalid file name".to_string()));
    }

    if picture.data.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }

    if picture.data.len() > rules.max_size {
        return Err(AppError::Validation(format!(
            "File too large, maximum size is {} bytes",
            rules.max_size
        )));
    }

    // The declared content type only counts when the name has no known extension.
    let mime_type = mime_guess::from_path(&filename)
        .first()
        .or_else(|| picture.content_type.as_deref()?.parse::<mime::Mime>().ok())
        .unwrap_or(mime::APPLICATION_OCTET_STREAM);
    if !rules
        .allowed_mime_types
        .iter()
        .any(|allowed| allowed == mime_type.essence_str())
    {
        return Err(AppError::Validation(format!(
            "Unsupported file type: {}",
            mime_type
        )));
    }

    image::guess_format(&picture.data)
        .map_err(|_| AppError::Validation("File is not a valid image".to_string()))?;

    let stored_name = format!("{}_{}", Uuid::new_v4().simple(), filename);

    storage.store(&stored_name, &picture.data).await?;
    tracing::debug!(file = %stored_name, bytes = picture.data.len(), "Stored profile picture");

    Ok(StoredUpload {
        url: storage.public_url(&stored_name),
        path: stored_name,
    })
}

/// Removes an upload whose resume was never saved. Failures are only logged.
pub async fn discard_upload(storage: &dyn Storage, upload: &StoredUpload) {
    if let Err(e) = storage.remove(&upload.path).await {
        tracing::warn!(error = %e, file = %upload.path, "Failed to remove orphaned upload");
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    /// Smallest valid PNG: 1x1 transparent pixel.
    pub const TINY_PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
        0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
        0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];
}

#[cfg(test)]
mod tests {
    use super::test_support::TINY_PNG;
    use super::*;
    use tempfile::tempdir;

    fn rules() -> UploadRules {
        UploadRules {
            max_size: 1024,
            allowed_mime_types: vec!["image/png".into(), "image/jpeg".into()],
        }
    }

    fn picture(filename: &str, data: &[u8]) -> ProfilePicture {
        ProfilePicture {
            filename: filename.into(),
            content_type: Some("image/png".into()),
            data: data.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_valid_picture_is_stored_under_unique_name() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).unwrap();

        let upload = save_profile_picture(&storage, &rules(), &picture("../me.png", TINY_PNG))
            .await
            .unwrap();

        assert!(upload.path.ends_with("_me.png"));
        assert_eq!(upload.url, format!("/static/uploads/{}", upload.path));
        let stored = tokio::fs::read(dir.path().join(&upload.path)).await.unwrap();
        assert_eq!(stored, TINY_PNG);
    }

    #[tokio::test]
    async fn test_discarded_upload_is_removed() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).unwrap();
        let upload = save_profile_picture(&storage, &rules(), &picture("me.png", TINY_PNG))
            .await
            .unwrap();

        discard_upload(&storage, &upload).await;

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_disallowed_extension_is_rejected() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).unwrap();

        let err = save_profile_picture(&storage, &rules(), &picture("me.exe", TINY_PNG))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_non_image_content_is_rejected() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).unwrap();

        let err = save_profile_picture(&storage, &rules(), &picture("me.png", b"not an image"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_oversized_picture_is_rejected() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).unwrap();
        let mut data = TINY_PNG.to_vec();
        data.resize(2048, 0);

        let err = save_profile_picture(&storage, &rules(), &picture("me.png", &data))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }
}
