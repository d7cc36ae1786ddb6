use serde::{Deserialize, Serialize};

/// Fixed-length face embedding produced by the encoder capability.
///
/// Compared by cosine, the metric ArcFace embeddings are trained for, so
/// vectors need not be normalized. Smaller distance means more likely the
/// same person.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f32] {
        &self.0
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    /// Cosine similarity in `[-1, 1]`. A zero vector is similar to nothing.
    ///
    /// Vectors of different length compare only their shared prefix;
    /// callers validate dimensions up front.
    pub fn similarity(&self, other: &Embedding) -> f64 {
        let mut dot = 0.0;
        let mut norm_a = 0.0;
        let mut norm_b = 0.0;
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            let (a, b) = (*a as f64, *b as f64);
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot / (norm_a.sqrt() * norm_b.sqrt())
    }

    /// Cosine distance, `1 - similarity`, in `[0, 2]`.
    pub fn distance(&self, other: &Embedding) -> f64 {
        1.0 - self.similarity(other)
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_distance_identical_is_zero() {
        let a = Embedding::new(vec![0.3, 0.4, 0.5]);
        assert_relative_eq!(a.distance(&a), 0.0, epsilon = 1e-12);
    }

    #[rstest]
    #[case::orthogonal([0.0, 1.0], 1.0)]
    #[case::opposite([-2.0, 0.0], 2.0)]
    #[case::same_direction([5.0, 0.0], 0.0)]
    #[case::three_four_five([3.0, 4.0], 0.4)]
    fn test_distance_is_cosine(#[case] other: [f32; 2], #[case] expected: f64) {
        let a = Embedding::new(vec![1.0, 0.0]);
        assert_relative_eq!(a.distance(&Embedding::new(other.to_vec())), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = Embedding::new(vec![0.1, 0.9, -0.2]);
        let b = Embedding::new(vec![-0.4, 0.2, 0.7]);
        assert_relative_eq!(a.distance(&b), b.distance(&a));
    }

    #[test]
    fn test_zero_vector_is_unrelated() {
        let zero = Embedding::new(vec![0.0, 0.0]);
        let a = Embedding::new(vec![1.0, 0.0]);
        assert_relative_eq!(zero.similarity(&a), 0.0);
        assert_relative_eq!(zero.distance(&a), 1.0);
    }

    #[test]
    fn test_l2_normalize_unit_vector() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector() {
        let mut v = vec![0.0, 0.0, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let e = Embedding::new(vec![1.0, 2.5]);
        assert_eq!(serde_json::to_string(&e).unwrap(), "[1.0,2.5]");
    }
}
