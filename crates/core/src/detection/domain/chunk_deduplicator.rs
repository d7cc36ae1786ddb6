//! Groups the face observations of one chunk into distinct people.
//!
//! Greedy anchor clustering: observations are visited in descending
//! quality; each unassigned observation opens a cluster and absorbs every
//! remaining unassigned observation closer than the threshold to it.
//! Membership is relative to the anchor only, so clusters are not
//! transitive.

use crate::detection::domain::face_observation::FaceObservation;

/// Indices into the observation slice that make up one person.
///
/// `members[0]` is the anchor, which is also the representative: the
/// highest-quality observation, earliest on ties.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaceCluster {
    pub members: Vec<usize>,
}

impl FaceCluster {
    pub fn representative(&self) -> usize {
        self.members[0]
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

pub fn deduplicate(observations: &[FaceObservation], grouping_threshold: f64) -> Vec<FaceCluster> {
    let mut order: Vec<usize> = (0..observations.len()).collect();
    // Stable sort keeps encounter order among equal qualities.
    order.sort_by(|&a, &b| observations[b].quality.total_cmp(&observations[a].quality));

    let mut assigned = vec![false; observations.len()];
    let mut clusters = Vec::new();

    for (pos, &anchor) in order.iter().enumerate() {
        if assigned[anchor] {
            continue;
        }
        assigned[anchor] = true;
        let mut members = vec![anchor];
        let anchor_embedding = &observations[anchor].embedding;

        for &candidate in &order[pos + 1..] {
            if assigned[candidate] {
                continue;
            }
            if anchor_embedding.distance(&observations[candidate].embedding) < grouping_threshold {
                assigned[candidate] = true;
                members.push(candidate);
            }
        }
        clusters.push(FaceCluster { members });
    }

    clusters
}
