use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::storage::domain::object_store::{ChunkKey, ObjectStore, RetrievalUrl, StoredObject};

/// Stores chunk media under a local directory.
///
/// Retrieval URLs are `file://` URLs with an `expires` query parameter; the
/// expiry is advisory since the filesystem does not enforce it.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, reference: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let relative = Path::new(reference);
        if relative.is_absolute() || relative.components().any(|c| c.as_os_str() == "..") {
            return Err(format!("object reference escapes store root: {reference}").into());
        }
        Ok(self.root.join(relative))
    }
}

impl ObjectStore for LocalObjectStore {
    fn put_chunk(&mut self, key: &ChunkKey, media: &[u8]) -> Result<StoredObject, Box<dyn std::error::Error>> {
        let reference = key.object_path();
        let path = self.resolve(&reference)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, media)?;
        log::debug!("Stored chunk {} ({} bytes)", reference, media.len());
        Ok(StoredObject { reference })
    }

    fn retrieval_url(
        &self,
        object: &StoredObject,
        ttl: Duration,
    ) -> Result<RetrievalUrl, Box<dyn std::error::Error>> {
        let path = self.resolve(&object.reference)?;
        if !path.exists() {
            return Err(format!("object not found: {}", object.reference).into());
        }
        let absolute = fs::canonicalize(&path)?;
        let expires_at = (SystemTime::now() + ttl).duration_since(UNIX_EPOCH)?.as_secs();
        Ok(RetrievalUrl {
            url: format!("file://{}?expires={expires_at}", absolute.display()),
            expires_at,
        })
    }
}
