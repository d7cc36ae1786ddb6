use std::fmt;
use std::time::Duration;

/// Where a chunk's media lives: `(owner, video_id, chunk_index)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkKey {
    pub owner: String,
    pub video_id: String,
    pub chunk_index: usize,
    pub chunk_id: String,
}

impl ChunkKey {
    /// Object path, e.g. `owner/video/0003_<chunk id>.mp4`.
    pub fn object_path(&self) -> String {
        format!(
            "{}/{}/{:04}_{}.mp4",
            self.owner, self.video_id, self.chunk_index, self.chunk_id
        )
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.object_path())
    }
}

/// Reference to an uploaded object, resolvable by the store that made it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub reference: String,
}

/// A retrieval URL and the unix time (seconds) after which it is invalid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetrievalUrl {
    pub url: String,
    pub expires_at: u64,
}

pub trait ObjectStore: Send {
    fn put_chunk(&mut self, key: &ChunkKey, media: &[u8]) -> Result<StoredObject, Box<dyn std::error::Error>>;

    fn retrieval_url(
        &self,
        object: &StoredObject,
        ttl: Duration,
    ) -> Result<RetrievalUrl, Box<dyn std::error::Error>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_path_pads_index() {
        let key = ChunkKey {
            owner: "u1".into(),
            video_id: "v9".into(),
            chunk_index: 7,
            chunk_id: "abc".into(),
        };
        assert_eq!(key.object_path(), "u1/v9/0007_abc.mp4");
    }
}
