//! Helpers for the JSON file-backed stores.

use std::fs;
use std::path::Path;

/// Rejects values that would escape the store root when used as a path.
pub(crate) fn safe_component<'a>(value: &'a str, what: &str) -> Result<&'a str, Box<dyn std::error::Error>> {
    let valid = !value.is_empty()
        && value != "."
        && value != ".."
        && !value.contains(['/', '\\', '\0']);
    if valid {
        Ok(value)
    } else {
        Err(format!("invalid {what}: {value:?}").into())
    }
}

/// Writes to a sibling temp file, then renames it over `path`.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain("video-1", true)]
    #[case::dotted("clip.v2", true)]
    #[case::parent("..", false)]
    #[case::current(".", false)]
    #[case::slash("a/b", false)]
    #[case::backslash("a\\b", false)]
    #[case::empty("", false)]
    fn test_safe_component(#[case] value: &str, #[case] ok: bool) {
        assert_eq!(safe_component(value, "id").is_ok(), ok);
    }

    #[test]
    fn test_write_atomic_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert!(!dir.path().join("data.tmp").exists());
    }
}
