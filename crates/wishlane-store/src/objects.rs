//! Object storage for uploaded images.
//!
//! Objects are addressed by a relative slash-separated path such as
//! `avatars/<owner>.jpg` and resolved to a retrievable URL after upload.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, StoreError};

pub trait ObjectStorage: Send + Sync {
    /// Store `data` at `path`, replacing any previous object, and return its URL.
    fn put(&self, path: &str, data: &[u8]) -> Result<String>;
    fn get(&self, path: &str) -> Result<Vec<u8>>;
    /// Returns `true` if an object was removed.
    fn delete(&self, path: &str) -> Result<bool>;
    /// URL under which `path` is (or would be) served.
    fn url_for(&self, path: &str) -> Result<String>;
    /// Inverse of [`url_for`](Self::url_for); `None` for URLs this store
    /// does not serve.
    fn path_for_url(&self, url: &str) -> Option<String>;
}

/// Reject absolute paths, `..` and empty segments; only plain relative
/// components survive.
fn sanitize(path: &str) -> Result<PathBuf> {
    if path.is_empty() || path.contains('\\') {
        return Err(StoreError::InvalidPath(path.to_string()));
    }

    let mut clean = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(c) => clean.push(c),
            _ => return Err(StoreError::InvalidPath(path.to_string())),
        }
    }

    if clean.as_os_str().is_empty() {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(clean)
}

/// [`ObjectStorage`] on a local directory.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    base_path: PathBuf,
    base_url: String,
    max_size: usize,
}

impl FsObjectStore {
    /// Create the store, making `base_path` if needed.  URLs are built as
    /// `<base_url>/<path>`.
    pub fn new(base_path: PathBuf, base_url: impl Into<String>, max_size: usize) -> Result<Self> {
        std::fs::create_dir_all(&base_path)?;

        info!(path = %base_path.display(), "object store initialized");

        Ok(Self {
            base_path,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_size,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        Ok(self.base_path.join(sanitize(path)?))
    }
}

impl ObjectStorage for FsObjectStore {
    fn put(&self, path: &str, data: &[u8]) -> Result<String> {
        if data.is_empty() {
            return Err(StoreError::InvalidPath(format!("{path}: empty object")));
        }
        if data.len() > self.max_size {
            return Err(StoreError::ObjectTooLarge {
                size: data.len(),
                max: self.max_size,
            });
        }

        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, data)?;

        debug!(path, size = data.len(), "stored object");
        self.url_for(path)
    }

    fn get(&self, path: &str) -> Result<Vec<u8>> {
        let target = self.resolve(path)?;
        if !target.exists() {
            return Err(StoreError::NotFound);
        }
        Ok(std::fs::read(&target)?)
    }

    fn delete(&self, path: &str) -> Result<bool> {
        let target = self.resolve(path)?;
        if !target.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&target)?;
        debug!(path, "deleted object");
        Ok(true)
    }

    fn url_for(&self, path: &str) -> Result<String> {
        let clean = sanitize(path)?;
        let segments: Vec<String> = clean
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Ok(format!("{}/{}", self.base_url, segments.join("/")))
    }

    fn path_for_url(&self, url: &str) -> Option<String> {
        let rest = url.strip_prefix(&self.base_url)?.strip_prefix('/')?;
        sanitize(rest).ok().map(|_| rest.to_string())
    }
}
