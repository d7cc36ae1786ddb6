use serde::{Deserialize, Serialize};

/// A free-text document for later semantic retrieval.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchEntry {
    pub key: String,
    pub text: String,
    pub namespace: String,
}

/// Write-only search index; nothing in the analysis reads it back.
pub trait SearchIndex: Send {
    fn upsert(&mut self, entry: &SearchEntry) -> Result<(), Box<dyn std::error::Error>>;
}
