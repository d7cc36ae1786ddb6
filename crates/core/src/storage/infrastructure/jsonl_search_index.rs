use std::fs;
use std::path::PathBuf;

use crate::shared::file_store::write_atomic;
use crate::storage::domain::search_index::{SearchEntry, SearchIndex};

/// Keeps entries as JSON lines in a local file, one line per
/// `(namespace, key)`.
///
/// An upsert rewrites the file, replacing the line with the same key in
/// place or appending a new one, so re-analysing a video leaves one entry
/// per chunk.
pub struct JsonlSearchIndex {
    path: PathBuf,
}

impl JsonlSearchIndex {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Every entry in file order.
    pub fn entries(&self) -> Result<Vec<SearchEntry>, Box<dyn std::error::Error>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        fs::read_to_string(&self.path)?
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(n, line)| {
                serde_json::from_str::<SearchEntry>(line).map_err(|e| -> Box<dyn std::error::Error> {
                    format!("corrupt index line {} in {}: {e}", n + 1, self.path.display()).into()
                })
            })
            .collect()
    }
}

impl SearchIndex for JsonlSearchIndex {
    fn upsert(&mut self, entry: &SearchEntry) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut entries = self.entries()?;
        match entries
            .iter_mut()
            .find(|e| e.key == entry.key && e.namespace == entry.namespace)
        {
            Some(existing) => *existing = entry.clone(),
            None => entries.push(entry.clone()),
        }

        let mut contents = String::new();
        for e in &entries {
            contents.push_str(&serde_json::to_string(e)?);
            contents.push('\n');
        }
        write_atomic(&self.path, contents.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_keys_get_one_line_each() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index").join("chunks.jsonl");
        let mut index = JsonlSearchIndex::new(&path);
        for i in 0..2 {
            index
                .upsert(&SearchEntry {
                    key: format!("vid:{i}"),
                    text: "two people".into(),
                    namespace: "owner".into(),
                })
                .unwrap();
        }

        let contents = fs::read_to_string(&path).unwrap();
        let entries: Vec<SearchEntry> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].key, "vid:1");
        assert_eq!(entries[0].namespace, "owner");
    }

    fn entry(key: &str, text: &str, namespace: &str) -> SearchEntry {
        SearchEntry {
            key: key.into(),
            text: text.into(),
            namespace: namespace.into(),
        }
    }

    #[test]
    fn test_upsert_replaces_entry_with_same_key() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = JsonlSearchIndex::new(dir.path().join("chunks.jsonl"));
        index.upsert(&entry("vid:0", "nobody", "owner")).unwrap();
        index.upsert(&entry("vid:1", "A", "owner")).unwrap();
        index.upsert(&entry("vid:0", "A, B", "owner")).unwrap();

        let entries = index.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], entry("vid:0", "A, B", "owner"));
        assert_eq!(entries[1].key, "vid:1");
    }

    #[test]
    fn test_same_key_in_other_namespace_is_separate() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = JsonlSearchIndex::new(dir.path().join("chunks.jsonl"));
        index.upsert(&entry("vid:0", "A", "alice")).unwrap();
        index.upsert(&entry("vid:0", "B", "bob")).unwrap();
        assert_eq!(index.entries().unwrap().len(), 2);
    }
}
