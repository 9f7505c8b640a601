//! Object storage for uploaded files (images, PDFs, documents).
//!
//! Objects live under `<root>/<owner_id>/<name>` on the local filesystem
//! and are addressed by that relative path.

use crate::config::StorageConfig;
use crate::error::OpsError;
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    /// `<owner_id>/<name>`
    pub path: String,
    pub url: Url,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(
        &self,
        owner_id: &str,
        name: &str,
        bytes: &[u8],
    ) -> Result<StoredObject, OpsError>;

    async fn read(&self, path: &str) -> Result<Vec<u8>, OpsError>;

    /// Objects stored for one owner, sorted by name.
    async fn list(&self, owner_id: &str) -> Result<Vec<StoredObject>, OpsError>;

    async fn delete(&self, path: &str) -> Result<(), OpsError>;

    /// Retrievable URL for a stored path.
    fn url_for(&self, path: &str) -> Result<Url, OpsError>;
}

#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    public_base: Url,
}

impl LocalObjectStore {
    pub fn new(cfg: &StorageConfig) -> Self {
        let mut public_base = cfg.public_base_url.clone();
        if !public_base.path().ends_with('/') {
            let path = format!("{}/", public_base.path());
            public_base.set_path(&path);
        }
        Self {
            root: cfg.root.clone(),
            public_base,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    fn url_for(&self, path: &str) -> Result<Url, OpsError> {
        let clean = validate_path(path)?;
        Ok(self.public_base.join(&clean)?)
    }

    async fn upload(
        &self,
        owner_id: &str,
        name: &str,
        bytes: &[u8],
    ) -> Result<StoredObject, OpsError> {
        if owner_id.contains('/') || name.contains('/') {
            return Err(OpsError::InvalidPath(format!("{owner_id}/{name}")));
        }
        let path = validate_path(&format!("{owner_id}/{name}"))?;
        let full = self.root.join(&path);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, bytes).await?;
        info!(path = %path, size = bytes.len(), "object stored");

        Ok(StoredObject {
            url: self.url_for(&path)?,
            size: Some(bytes.len() as u64),
            path,
        })
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, OpsError> {
        let clean = validate_path(path)?;
        match tokio::fs::read(self.root.join(&clean)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(OpsError::not_found("storage", &clean))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Unknown owners list empty.
    async fn list(&self, owner_id: &str) -> Result<Vec<StoredObject>, OpsError> {
        let owner = validate_path(owner_id)?;
        if owner.contains('/') {
            return Err(OpsError::InvalidPath(owner_id.to_string()));
        }

        let mut dir = match tokio::fs::read_dir(self.root.join(&owner)).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut out = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let path = format!("{owner}/{name}");
            out.push(StoredObject {
                url: self.url_for(&path)?,
                size: Some(meta.len()),
                path,
            });
        }
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }

    async fn delete(&self, path: &str) -> Result<(), OpsError> {
        let clean = validate_path(path)?;
        match tokio::fs::remove_file(self.root.join(&clean)).await {
            Ok(()) => {
                debug!(path = %clean, "object deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(OpsError::not_found("storage", &clean))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Normalize a relative object path; rejects traversal, absolute paths and
/// empty segments.
fn validate_path(path: &str) -> Result<String, OpsError> {
    let invalid = || OpsError::InvalidPath(path.to_string());
    if path.is_empty() || path.starts_with('/') || path.contains('\\') {
        return Err(invalid());
    }

    let mut parts = Vec::new();
    for segment in path.split('/') {
        if segment.is_empty() {
            return Err(invalid());
        }
        match Path::new(segment).components().next() {
            Some(Component::Normal(_)) => parts.push(segment),
            _ => return Err(invalid()),
        }
    }
    Ok(parts.join("/"))
}
