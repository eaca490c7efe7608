use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use super::{MediaError, MediaStore, MediaUpload, UploadedMedia};

/// Stores uploads as `<root>/<uuid>.<ext>` and hands out
/// `<public_base_url>/<uuid>.<ext>` URLs. The router serves `root`.
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Extensions a stored file may carry. `delete` tries exactly these.
const EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg", "avif", "bmp", "bin"];

/// Picks a known extension from the file name, then the content type.
fn extension_for(file: &MediaUpload) -> &'static str {
    let from_name = file
        .file_name
        .as_deref()
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .and_then(|ext| EXTENSIONS.iter().copied().find(|known| *known == ext));

    if let Some(ext) = from_name {
        return ext;
    }

    match file.content_type.as_deref() {
        Some("image/jpeg") => "jpg",
        Some("image/png") => "png",
        Some("image/gif") => "gif",
        Some("image/webp") => "webp",
        Some("image/svg+xml") => "svg",
        Some("image/avif") => "avif",
        Some("image/bmp") => "bmp",
        _ => "bin",
    }
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn upload(&self, file: MediaUpload) -> Result<UploadedMedia, MediaError> {
        if file.bytes.is_empty() {
            return Err(MediaError::EmptyUpload);
        }

        tokio::fs::create_dir_all(&self.root).await?;

        let id = Uuid::new_v4().to_string();
        let file_name = format!("{}.{}", id, extension_for(&file));
        tokio::fs::write(self.root.join(&file_name), &file.bytes).await?;

        tracing::debug!("Stored media {} ({} bytes)", file_name, file.bytes.len());

        Ok(UploadedMedia {
            url: format!("{}/{}", self.public_base_url, file_name),
            id,
        })
    }

    async fn delete(&self, id: &str) -> Result<(), MediaError> {
        if !is_valid_id(id) {
            return Err(MediaError::InvalidId(id.to_string()));
        }

        for ext in EXTENSIONS {
            let path = self.root.join(format!("{}.{}", id, ext));
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    tracing::debug!("Removed media {}", path.display());
                    return Ok(());
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(MediaError::NotFound(id.to_string()))
    }
}
