//! Builds the per-video interaction graph from per-chunk identity sets.
//!
//! Counts are plain sums, so the result does not depend on the order in
//! which chunks are recorded. Sample faces keep the first ones offered.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::identity::domain::identity::IdentityId;
use crate::interaction::domain::face_crop::FaceCrop;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub identity_id: IdentityId,
    pub chunk_appearances: usize,
    pub co_occurrences: BTreeMap<IdentityId, usize>,
    pub sample_faces: Vec<FaceCrop>,
}

pub struct InteractionAggregator {
    max_sample_faces: usize,
    chunks_recorded: usize,
    appearances: BTreeMap<IdentityId, usize>,
    co_occurrences: BTreeMap<IdentityId, BTreeMap<IdentityId, usize>>,
    samples: BTreeMap<IdentityId, Vec<FaceCrop>>,
}

impl InteractionAggregator {
    pub fn new(max_sample_faces: usize) -> Self {
        Self {
            max_sample_faces,
            chunks_recorded: 0,
            appearances: BTreeMap::new(),
            co_occurrences: BTreeMap::new(),
            samples: BTreeMap::new(),
        }
    }

    pub fn chunks_recorded(&self) -> usize {
        self.chunks_recorded
    }

    /// Records the identities present in one chunk. Duplicates count once.
    pub fn record_chunk(&mut self, identities: &[IdentityId]) {
        self.chunks_recorded += 1;
        let present: Vec<&IdentityId> = identities.iter().collect::<BTreeSet<_>>().into_iter().collect();

        for id in &present {
            *self.appearances.entry((*id).clone()).or_default() += 1;
        }
        for (i, a) in present.iter().enumerate() {
            for b in &present[i + 1..] {
                self.bump(a, b);
                self.bump(b, a);
            }
        }
    }

    fn bump(&mut self, from: &IdentityId, to: &IdentityId) {
        *self
            .co_occurrences
            .entry(from.clone())
            .or_default()
            .entry(to.clone())
            .or_default() += 1;
    }

    /// Offers a face crop for `id`; ignored once the identity has enough.
    pub fn add_sample(&mut self, id: &IdentityId, crop: FaceCrop) {
        let samples = self.samples.entry(id.clone()).or_default();
        if samples.len() < self.max_sample_faces {
            samples.push(crop);
        }
    }

    /// One record per identity that appeared in at least one chunk.
    pub fn finish(mut self) -> BTreeMap<IdentityId, InteractionRecord> {
        self.appearances
            .into_iter()
            .map(|(id, chunk_appearances)| {
                let record = InteractionRecord {
                    identity_id: id.clone(),
                    chunk_appearances,
                    co_occurrences: self.co_occurrences.remove(&id).unwrap_or_default(),
                    sample_faces: self.samples.remove(&id).unwrap_or_default(),
                };
                (id, record)
            })
            .collect()
    }
}
