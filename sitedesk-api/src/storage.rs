/// Avatar file storage
///
/// Thin wrapper over disk storage for profile images. The core only ever
/// sees the generated filename string that lives on the User row; files
/// are written under the configured upload directory as
/// `profile-{user_id}-{random}.{ext}` and the previous avatar is removed
/// when a new one replaces it.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;
use uuid::Uuid;

/// Maximum accepted avatar size: 2 MiB
pub const MAX_AVATAR_BYTES: usize = 2 * 1024 * 1024;

/// Accepted image file extensions
const ALLOWED_EXTENSIONS: [&str; 5] = ["jpeg", "jpg", "png", "gif", "webp"];

/// Error type for avatar storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// File exceeds [`MAX_AVATAR_BYTES`]
    #[error("Image exceeds the {} byte limit", MAX_AVATAR_BYTES)]
    TooLarge,

    /// Extension is not an accepted image type
    #[error("Only image files are allowed (jpeg, jpg, png, gif, webp)")]
    UnsupportedType,

    /// Filesystem failure
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Disk-backed avatar storage rooted at one directory
#[derive(Debug, Clone)]
pub struct AvatarStorage {
    dir: PathBuf,
}

impl AvatarStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Extracts and checks the extension of an uploaded filename
    pub fn image_extension(original_name: &str) -> Result<&str, StorageError> {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .ok_or(StorageError::UnsupportedType)?;

        if ALLOWED_EXTENSIONS
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        {
            Ok(ext)
        } else {
            Err(StorageError::UnsupportedType)
        }
    }

    /// Stores an uploaded avatar, returning the generated filename
    ///
    /// The filename embeds the owning user's id plus a random component so
    /// successive uploads never collide.
    pub async fn save(
        &self,
        user_id: Uuid,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        if bytes.len() > MAX_AVATAR_BYTES {
            return Err(StorageError::TooLarge);
        }

        let ext = Self::image_extension(original_name)?;
        let filename = format!("profile-{}-{}.{}", user_id, Uuid::new_v4(), ext.to_lowercase());

        fs::create_dir_all(&self.dir).await?;
        fs::write(self.dir.join(&filename), bytes).await?;

        Ok(filename)
    }

    /// Removes a previously stored avatar, best-effort
    ///
    /// Missing files and I/O failures are logged and ignored: a stale file
    /// on disk never blocks replacing the avatar reference.
    pub async fn delete(&self, filename: &str) {
        // Stored filenames are generated by save(); anything with a path
        // separator did not come from us.
        if filename.contains('/') || filename.contains('\\') {
            warn!(filename, "Refusing to delete suspicious avatar filename");
            return;
        }

        if let Err(e) = fs::remove_file(self.dir.join(filename)).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(filename, "Failed to delete old avatar: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_storage() -> AvatarStorage {
        let dir = std::env::temp_dir().join(format!("sitedesk-avatars-{}", Uuid::new_v4()));
        AvatarStorage::new(dir)
    }

    #[test]
    fn test_image_extension_allowed() {
        assert_eq!(AvatarStorage::image_extension("photo.png").unwrap(), "png");
        assert_eq!(AvatarStorage::image_extension("photo.JPG").unwrap(), "JPG");
        assert!(AvatarStorage::image_extension("script.sh").is_err());
        assert!(AvatarStorage::image_extension("noextension").is_err());
    }

    #[tokio::test]
    async fn test_save_and_delete_roundtrip() {
        let storage = temp_storage();
        let user_id = Uuid::new_v4();

        let filename = storage
            .save(user_id, "avatar.png", b"fake image bytes")
            .await
            .unwrap();

        assert!(filename.starts_with(&format!("profile-{}-", user_id)));
        assert!(filename.ends_with(".png"));

        let on_disk = storage.dir.join(&filename);
        assert!(on_disk.exists());

        storage.delete(&filename).await;
        assert!(!on_disk.exists());
    }

    #[tokio::test]
    async fn test_save_rejects_oversized_upload() {
        let storage = temp_storage();
        let bytes = vec![0u8; MAX_AVATAR_BYTES + 1];

        let result = storage.save(Uuid::new_v4(), "big.png", &bytes).await;
        assert!(matches!(result, Err(StorageError::TooLarge)));
    }

    #[tokio::test]
    async fn test_save_rejects_non_image() {
        let storage = temp_storage();

        let result = storage.save(Uuid::new_v4(), "malware.exe", b"nope").await;
        assert!(matches!(result, Err(StorageError::UnsupportedType)));
    }

    #[tokio::test]
    async fn test_delete_ignores_missing_file() {
        let storage = temp_storage();

        // No panic, no error surfaced.
        storage.delete("profile-does-not-exist.png").await;
        storage.delete("../escape-attempt.png").await;
    }
}
