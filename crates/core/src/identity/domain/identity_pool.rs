use crate::identity::domain::identity::IdentityId;
use crate::shared::embedding::Embedding;
use crate::shared::error::AnalysisError;

/// In-memory identity embeddings for one video's analysis.
///
/// Iteration follows insertion order, which makes distance tie-breaks
/// deterministic. Every embedding must share the pool's dimension.
#[derive(Clone, Debug)]
pub struct IdentityPool {
    dimension: usize,
    entries: Vec<(IdentityId, Embedding)>,
}

impl IdentityPool {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            entries: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IdentityId, &Embedding)> {
        self.entries.iter().map(|(id, e)| (id, e))
    }

    pub fn contains(&self, id: &IdentityId) -> bool {
        self.entries.iter().any(|(existing, _)| existing == id)
    }

    pub fn check_dimension(&self, embedding: &Embedding) -> Result<(), AnalysisError> {
        if embedding.dimension() != self.dimension {
            return Err(AnalysisError::Input(format!(
                "embedding has dimension {}, expected {}",
                embedding.dimension(),
                self.dimension
            )));
        }
        Ok(())
    }

    /// Adds or replaces the embedding for `id`.
    pub fn insert(&mut self, id: IdentityId, embedding: Embedding) -> Result<(), AnalysisError> {
        self.check_dimension(&embedding)?;
        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some(entry) => entry.1 = embedding,
            None => self.entries.push((id, embedding)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_preserves_order() {
        let mut pool = IdentityPool::new(2);
        pool.insert("b".into(), Embedding::new(vec![0.0, 1.0])).unwrap();
        pool.insert("a".into(), Embedding::new(vec![1.0, 0.0])).unwrap();
        let ids: Vec<&str> = pool.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_insert_replaces_existing() {
        let mut pool = IdentityPool::new(2);
        pool.insert("a".into(), Embedding::new(vec![0.0, 1.0])).unwrap();
        pool.insert("a".into(), Embedding::new(vec![1.0, 0.0])).unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.iter().next().unwrap().1.values(), &[1.0, 0.0]);
    }

    #[test]
    fn test_insert_rejects_wrong_dimension() {
        let mut pool = IdentityPool::new(128);
        let result = pool.insert("a".into(), Embedding::new(vec![0.0; 64]));
        assert!(matches!(result, Err(AnalysisError::Input(_))));
        assert!(pool.is_empty());
    }
}
