use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::identity::domain::identity::IdentityId;
use crate::interaction::domain::interaction_aggregator::InteractionRecord;
use crate::shared::embedding::Embedding;
use crate::shared::face_box::FaceBox;

/// One cluster resolved to an identity in one chunk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkDetection {
    pub chunk_index: usize,
    pub identity_id: IdentityId,
    pub confidence: f64,
    pub is_new: bool,
    pub bbox: FaceBox,
}

/// An identity discovered while analysing this video.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewIdentity {
    pub identity_id: IdentityId,
    pub embedding: Embedding,
}

/// Result of analysing one video, published only on success.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VideoAnalysis {
    pub video_id: String,
    pub owner: String,
    pub total_chunks: usize,
    pub identities: BTreeMap<IdentityId, InteractionRecord>,
    pub new_identities: Vec<NewIdentity>,
    pub detections: Vec<ChunkDetection>,
}
