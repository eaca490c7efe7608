//! Media (cover image) store contract.
//!
//! Any blob backend can sit behind [`MediaStore`]. The shipped
//! implementation is [`local::LocalMediaStore`], which writes files to disk
//! and relies on the router to serve them.

pub mod local;

use std::fmt;

use async_trait::async_trait;
use url::Url;

/// A binary blob received from a client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaUpload {
    pub bytes: Vec<u8>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMedia {
    /// Durable public URL stored in `Post::image_url`.
    pub url: String,
    /// Opaque identifier accepted by `MediaStore::delete`.
    pub id: String,
}

#[derive(Debug)]
pub enum MediaError {
    EmptyUpload,
    InvalidId(String),
    NotFound(String),
    Io(std::io::Error),
    Backend(String),
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaError::EmptyUpload => write!(f, "uploaded file is empty"),
            MediaError::InvalidId(id) => write!(f, "invalid media id '{}'", id),
            MediaError::NotFound(id) => write!(f, "media '{}' not found", id),
            MediaError::Io(e) => write!(f, "media io error: {}", e),
            MediaError::Backend(msg) => write!(f, "media backend error: {}", msg),
        }
    }
}

impl std::error::Error for MediaError {}

impl From<std::io::Error> for MediaError {
    fn from(err: std::io::Error) -> Self {
        MediaError::Io(err)
    }
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, file: MediaUpload) -> Result<UploadedMedia, MediaError>;

    async fn delete(&self, id: &str) -> Result<(), MediaError>;

    /// Derives the identifier of a previously returned URL.
    /// Returns `None` for anything it cannot parse; never panics.
    fn extract_id(&self, url: &str) -> Option<String> {
        id_from_url(url)
    }
}

/// File stem of the last path segment: `http://host/covers/old.jpg` gives `old`.
pub fn id_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.next_back()?;
    let stem = segment.split('.').next()?;

    if stem.is_empty() {
        return None;
    }
    Some(stem.to_string())
}
