//! Object storage for separated stems

mod supabase;

pub use supabase::{SupabaseConfig, SupabaseStorage};

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::StorageError;

/// Content type of every uploaded stem
pub const STEM_CONTENT_TYPE: &str = "audio/wav";

/// Cache lifetime requested for uploaded stems
pub const STEM_CACHE_MAX_AGE: Duration = Duration::from_secs(3600);

/// Per-upload object options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub content_type: String,
    pub cache_max_age: Duration,
}

impl UploadOptions {
    /// Options used for separated stems
    pub fn stem() -> Self {
        Self {
            content_type: STEM_CONTENT_TYPE.to_string(),
            cache_max_age: STEM_CACHE_MAX_AGE,
        }
    }
}

/// Object store capability used by the orchestrator
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` at `path`
    async fn upload(&self, path: &str, bytes: Vec<u8>, options: &UploadOptions) -> Result<(), StorageError>;

    /// Public URL of the object at `path`
    fn public_url(&self, path: &str) -> String;
}

/// Owner directory used when the owner id has no usable characters
const FALLBACK_OWNER_SEGMENT: &str = "anonymous";

/// Reduce caller-influenced text to one safe object path segment
///
/// Keeps ASCII letters, digits, `-` and `_`; every other character
/// (separators and dots included) becomes `_`. Empty input yields `None`.
pub fn path_segment(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    Some(
        raw.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect(),
    )
}

/// Destination path of a stem: `{owner}/separated/{random_id}_{stem}.wav`
///
/// Owner and stem label are reduced with [`path_segment`], so the result
/// always stays three segments deep under the owner directory.
pub fn stem_object_path(owner: &str, stem_name: &str) -> String {
    let owner = path_segment(owner).unwrap_or_else(|| FALLBACK_OWNER_SEGMENT.to_string());
    let stem = path_segment(stem_name).unwrap_or_else(|| "stem".to_string());
    format!("{owner}/separated/{}_{stem}.wav", uuid::Uuid::new_v4())
}

/// Upload one local stem and return its public URL
///
/// Never fails the caller: a missing store, an unreadable file or a
/// rejected upload is logged and yields `None`.
pub async fn upload_stem(
    store: Option<&dyn ObjectStore>,
    local_path: &Path,
    stem_name: &str,
    owner: &str,
) -> Option<String> {
    let Some(store) = store else {
        tracing::error!(stem = stem_name, "Storage is not configured, cannot upload stem");
        return None;
    };

    let object_path = stem_object_path(owner, stem_name);
    match try_upload(store, local_path, &object_path).await {
        Ok(()) => {
            let url = store.public_url(&object_path);
            let url = url.trim_end_matches('?').to_string();
            tracing::info!(stem = stem_name, %url, "Uploaded stem");
            Some(url)
        }
        Err(e) => {
            tracing::error!(stem = stem_name, path = %object_path, error = %e, "Failed to upload stem");
            None
        }
    }
}

async fn try_upload(store: &dyn ObjectStore, local_path: &Path, object_path: &str) -> Result<(), StorageError> {
    let bytes = tokio::fs::read(local_path)
        .await
        .map_err(|source| StorageError::Read { path: local_path.to_path_buf(), source })?;
    store.upload(object_path, bytes, &UploadOptions::stem()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem_object_path_shape() {
        let path = stem_object_path("U1", "vocals");
        let rest = path.strip_prefix("U1/separated/").unwrap();
        let (id, tail) = rest.split_once('_').unwrap();

        assert!(uuid::Uuid::parse_str(id).is_ok());
        assert_eq!(tail, "vocals.wav");
    }

    #[test]
    fn test_path_segment_neutralises_separators_and_dots() {
        assert_eq!(path_segment("vocals").as_deref(), Some("vocals"));
        assert_eq!(path_segment("no_guitar").as_deref(), Some("no_guitar"));
        assert_eq!(path_segment("3f2a-b9").as_deref(), Some("3f2a-b9"));
        assert_eq!(path_segment("..").as_deref(), Some("__"));
        assert_eq!(path_segment("a/../b").as_deref(), Some("a____b"));
        assert_eq!(path_segment("x\\y z?").as_deref(), Some("x_y_z_"));
        assert_eq!(path_segment(""), None);
    }

    #[test]
    fn test_stem_object_path_cannot_escape_owner_dir() {
        let path = stem_object_path("..", "x/../../../../private-bucket/pwned");
        let segments: Vec<&str> = path.split('/').collect();

        assert_eq!(segments.len(), 3, "{path}");
        assert_eq!(segments[0], "__");
        assert_eq!(segments[1], "separated");
        assert!(segments[2].ends_with("_x_____________private-bucket_pwned.wav"), "{path}");
        assert!(segments.iter().all(|s| *s != "." && *s != ".."));
    }

    #[test]
    fn test_empty_owner_and_stem_fall_back() {
        let path = stem_object_path("", "");
        assert!(path.starts_with("anonymous/separated/"), "{path}");
        assert!(path.ends_with("_stem.wav"), "{path}");
    }

    #[test]
    fn test_stem_object_paths_are_unique() {
        assert_ne!(stem_object_path("a", "bass"), stem_object_path("a", "bass"));
    }

    #[test]
    fn test_stem_upload_options() {
        let options = UploadOptions::stem();
        assert_eq!(options.content_type, "audio/wav");
        assert_eq!(options.cache_max_age.as_secs(), 3600);
    }

    #[tokio::test]
    async fn test_upload_without_store_returns_none() {
        let url = upload_stem(None, Path::new("/nonexistent.wav"), "vocals", "U1").await;
        assert!(url.is_none());
    }
}
