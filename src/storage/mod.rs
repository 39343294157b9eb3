//! Filesystem-backed blob store for uploaded cover images and PDFs.
//!
//! Models the external object storage: `put` returns a public URL, `delete`
//! is best-effort and never fails the caller. Storage paths are recovered
//! from public URLs by matching the known bucket segment.

use std::path::PathBuf;

use crate::errors::AppError;

/// Bucket segment under which all thesis files live.
pub const BUCKET: &str = "research-files";

/// Blob store rooted at a local directory.
#[derive(Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    public_base: String,
}

impl FsBlobStore {
    pub fn new(root: PathBuf, public_base: String) -> Self {
        Self {
            root,
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }

    /// Store a blob under a unique object name and return its public URL.
    pub async fn put(&self, filename: &str, bytes: &[u8]) -> Result<String, AppError> {
        let object = format!("{}-{}", uuid::Uuid::new_v4(), sanitize(filename));
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&object), bytes).await?;

        Ok(format!("{}/{}/{}", self.public_base, BUCKET, object))
    }

    /// Remove blobs by storage path. Failures are logged and returned as
    /// warnings; the caller's operation proceeds regardless.
    pub async fn delete(&self, paths: &[String]) -> Vec<String> {
        let mut warnings = Vec::new();

        for path in paths {
            if let Err(e) = tokio::fs::remove_file(self.root.join(path)).await {
                tracing::warn!("Failed to delete blob {}: {}", path, e);
                warnings.push(format!("Failed to delete blob {}: {}", path, e));
            }
        }

        warnings
    }
}

/// Extract the storage path from a public URL by matching the bucket
/// segment; returns None for empty or foreign URLs.
pub fn object_path(url: &str) -> Option<String> {
    let marker = format!("/{}/", BUCKET);
    let (_, path) = url.split_once(&marker)?;
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}

/// Keep object names flat; path separators would escape the store root.
fn sanitize(filename: &str) -> String {
    filename
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect()
}
