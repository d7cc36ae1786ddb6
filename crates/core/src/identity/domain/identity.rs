use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::shared::embedding::Embedding;

/// Opaque identity key, stable across videos.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(String);

impl IdentityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random id for an identity discovered during analysis.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IdentityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A known or newly discovered person.
///
/// `embedding` is `None` for identities seeded from a reference photo that
/// has not been embedded yet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    #[serde(default)]
    pub embedding: Option<Embedding>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Identity {
    pub fn new(id: IdentityId) -> Self {
        Self {
            id,
            embedding: None,
            display_name: None,
            metadata: BTreeMap::new(),
        }
    }

    /// An identity created for an unmatched face in `video_id`.
    pub fn discovered(id: IdentityId, embedding: Embedding, video_id: &str, chunk_index: usize) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert("source".into(), "auto_generated".into());
        metadata.insert("first_seen_video".into(), video_id.into());
        metadata.insert("first_seen_chunk".into(), chunk_index.into());
        Self {
            id,
            embedding: Some(embedding),
            display_name: None,
            metadata,
        }
    }

    pub fn with_embedding(mut self, embedding: Embedding) -> Self {
        self.embedding = Some(embedding);
        self
    }
}
