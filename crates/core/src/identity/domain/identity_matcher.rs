use crate::detection::domain::face_observation::FaceObservation;
use crate::identity::domain::identity::IdentityId;
use crate::identity::domain::identity_pool::IdentityPool;
use crate::shared::embedding::Embedding;
use crate::shared::error::AnalysisError;

/// Outcome of resolving one cluster representative.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchResult {
    pub identity_id: IdentityId,
    /// `1 - distance` (the cosine similarity) for matches, clamped to
    /// `[0, 1]`; the detection quality for newly created identities.
    pub confidence: f64,
    pub is_new: bool,
}

/// Threshold policy for matching faces against the identity pool.
#[derive(Clone, Copy, Debug)]
pub struct IdentityMatcher {
    match_threshold: f64,
    new_identity_threshold: f64,
}

impl IdentityMatcher {
    pub fn new(match_threshold: f64, new_identity_threshold: f64) -> Self {
        Self {
            match_threshold,
            new_identity_threshold,
        }
    }

    /// Closest identity and its confidence, regardless of threshold.
    ///
    /// Among exact distance ties the earliest identity in pool order wins.
    pub fn closest(&self, embedding: &Embedding, pool: &IdentityPool) -> Option<(IdentityId, f64)> {
        let mut best: Option<(&IdentityId, f64)> = None;
        for (id, known) in pool.iter() {
            let d = embedding.distance(known);
            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((id, d));
            }
        }
        best.map(|(id, d)| (id.clone(), (1.0 - d).clamp(0.0, 1.0)))
    }

    /// Matches `observation` against `pool` or creates a new identity.
    ///
    /// A created identity is inserted into `pool` before returning so later
    /// clusters and chunks can match it. Returns `Ok(None)` when the face
    /// neither matches nor is good enough to become a new identity.
    pub fn resolve(
        &self,
        observation: &FaceObservation,
        pool: &mut IdentityPool,
    ) -> Result<Option<MatchResult>, AnalysisError> {
        pool.check_dimension(&observation.embedding)?;

        if let Some((identity_id, confidence)) = self.closest(&observation.embedding, pool) {
            if confidence >= self.match_threshold {
                return Ok(Some(MatchResult {
                    identity_id,
                    confidence,
                    is_new: false,
                }));
            }
        }

        if observation.quality < self.new_identity_threshold {
            return Ok(None);
        }

        let identity_id = IdentityId::generate();
        pool.insert(identity_id.clone(), observation.embedding.clone())?;
        Ok(Some(MatchResult {
            identity_id,
            confidence: observation.quality.clamp(0.0, 1.0),
            is_new: true,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::{DEFAULT_FACE_MATCH_THRESHOLD, DEFAULT_NEW_IDENTITY_THRESHOLD};
    use crate::shared::face_box::FaceBox;
    use approx::assert_relative_eq;

    fn obs(values: &[f32], quality: f64) -> FaceObservation {
        FaceObservation {
            embedding: Embedding::new(values.to_vec()),
            bbox: FaceBox::new(0, 50, 50, 0),
            quality,
            frame_index: 0,
            chunk_index: 0,
        }
    }

    fn pool(entries: &[(&str, [f32; 2])]) -> IdentityPool {
        let mut pool = IdentityPool::new(2);
        for (id, v) in entries {
            pool.insert((*id).into(), Embedding::new(v.to_vec())).unwrap();
        }
        pool
    }

    /// Unit vector of `dim` dimensions with cosine `cos` to axis 0, leaning
    /// towards `axis`.
    fn unit(dim: usize, cos: f32, axis: usize) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        v[0] = cos;
        v[axis] = (1.0 - cos * cos).sqrt();
        v
    }

    #[test]
    fn test_matches_closest_identity() {
        let mut pool = pool(&[("a", [0.0, 1.0]), ("b", [1.0, 0.0])]);
        let matcher = IdentityMatcher::new(0.6, 0.5);
        let result = matcher
            .resolve(&obs(&[0.9, 0.19f32.sqrt()], 0.9), &mut pool)
            .unwrap()
            .unwrap();
        assert_eq!(result.identity_id.as_str(), "b");
        assert_relative_eq!(result.confidence, 0.9, epsilon = 1e-6);
        assert!(!result.is_new);
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        // cosine 3/5 -> confidence exactly 0.6
        let mut pool = pool(&[("a", [3.0, 4.0])]);
        let matcher = IdentityMatcher::new(0.6, 1.0);
        let result = matcher.resolve(&obs(&[1.0, 0.0], 0.2), &mut pool).unwrap();
        assert_eq!(result.unwrap().identity_id.as_str(), "a");
    }

    #[test]
    fn test_exact_tie_picks_first_in_pool_order() {
        let mut pool = pool(&[("first", [1.0, 0.0]), ("second", [0.0, 1.0])]);
        let matcher = IdentityMatcher::new(0.0, 1.0);
        let result = matcher.resolve(&obs(&[1.0, 1.0], 0.9), &mut pool).unwrap().unwrap();
        assert_eq!(result.identity_id.as_str(), "first");
    }

    #[test]
    fn test_unmatched_good_face_creates_identity_in_pool() {
        let mut pool = pool(&[("a", [1.0, 0.0])]);
        let matcher = IdentityMatcher::new(0.6, 0.5);
        let result = matcher.resolve(&obs(&[0.0, 1.0], 0.8), &mut pool).unwrap().unwrap();
        assert!(result.is_new);
        assert_relative_eq!(result.confidence, 0.8);
        assert_eq!(pool.len(), 2);
        assert!(pool.contains(&result.identity_id));

        // The same face now matches the identity just created.
        let again = matcher.resolve(&obs(&[0.0, 1.0], 0.8), &mut pool).unwrap().unwrap();
        assert_eq!(again.identity_id, result.identity_id);
        assert!(!again.is_new);
    }

    #[test]
    fn test_empty_pool_creates_identity() {
        let mut pool = IdentityPool::new(2);
        let matcher = IdentityMatcher::new(0.6, 0.5);
        let result = matcher.resolve(&obs(&[0.1, 0.1], 0.7), &mut pool).unwrap().unwrap();
        assert!(result.is_new);
    }

    #[test]
    fn test_low_quality_unmatched_face_is_dropped() {
        let mut pool = IdentityPool::new(2);
        let matcher = IdentityMatcher::new(0.4, 0.3);
        let result = matcher.resolve(&obs(&[0.1, 0.1], 0.2), &mut pool).unwrap();
        assert!(result.is_none());
        assert!(pool.is_empty());
    }

    #[test]
    fn test_opposite_face_confidence_clamped_to_zero() {
        let pool = pool(&[("a", [1.0, 0.0])]);
        let matcher = IdentityMatcher::new(0.6, 0.5);
        let (_, confidence) = matcher.closest(&Embedding::new(vec![-1.0, 0.0]), &pool).unwrap();
        assert_relative_eq!(confidence, 0.0);
    }

    #[test]
    fn test_dimension_mismatch_is_input_error() {
        let mut pool = pool(&[("a", [1.0, 0.0])]);
        let matcher = IdentityMatcher::new(0.6, 0.5);
        let result = matcher.resolve(&obs(&[0.0, 0.0, 1.0], 0.9), &mut pool);
        assert!(matches!(result, Err(AnalysisError::Input(_))));
    }

    #[test]
    fn test_default_threshold_matches_arcface_scale_embedding() {
        let mut pool = IdentityPool::new(512);
        pool.insert("alice".into(), Embedding::new(unit(512, 1.0, 1))).unwrap();
        pool.insert("bob".into(), Embedding::new(unit(512, 0.0, 2))).unwrap();
        let matcher =
            IdentityMatcher::new(DEFAULT_FACE_MATCH_THRESHOLD, DEFAULT_NEW_IDENTITY_THRESHOLD);

        let result = matcher.resolve(&obs(&unit(512, 0.7, 3), 0.9), &mut pool).unwrap().unwrap();
        assert_eq!(result.identity_id.as_str(), "alice");
        assert!(!result.is_new);
        assert_relative_eq!(result.confidence, 0.7, epsilon = 1e-6);
    }

    #[test]
    fn test_default_threshold_keeps_unrelated_arcface_faces_apart() {
        let mut pool = IdentityPool::new(512);
        pool.insert("alice".into(), Embedding::new(unit(512, 1.0, 1))).unwrap();
        let matcher =
            IdentityMatcher::new(DEFAULT_FACE_MATCH_THRESHOLD, DEFAULT_NEW_IDENTITY_THRESHOLD);

        let result = matcher.resolve(&obs(&unit(512, 0.2, 3), 0.9), &mut pool).unwrap().unwrap();
        assert!(result.is_new);
        assert_eq!(pool.len(), 2);
    }
}
