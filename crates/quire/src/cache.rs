use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct ContentHashes {
    hashes: HashMap<PathBuf, String>,
}

impl ContentHashes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the current contents of `path` and reports whether they differ
    /// from the previous record. A file that cannot be read counts as changed
    /// and its record is dropped.
    pub fn update(&mut self, path: &Path) -> bool {
        match hash_file(path) {
            Some(hash) => match self.hashes.get(path) {
                Some(previous) if *previous == hash => false,
                _ => {
                    self.hashes.insert(path.to_path_buf(), hash);
                    true
                }
            },
            None => {
                self.hashes.remove(path);
                true
            }
        }
    }

    pub fn forget(&mut self, path: &Path) {
        self.hashes.remove(path);
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

pub fn hash_file(path: &Path) -> Option<String> {
    let content = fs::read(path).ok()?;
    Some(hash_bytes(&content))
}

pub fn hash_bytes(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_hash_bytes_deterministic() {
        assert_eq!(hash_bytes(b"quire"), hash_bytes(b"quire"));
        assert_ne!(hash_bytes(b"quire"), hash_bytes(b"quires"));
        assert_eq!(hash_bytes(b"").len(), 64);
    }

    #[test]
    fn test_update_detects_changes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("intro.md");
        fs::write(&path, "one").unwrap();

        let mut hashes = ContentHashes::new();
        assert!(hashes.update(&path));
        assert!(!hashes.update(&path));

        fs::write(&path, "two").unwrap();
        assert!(hashes.update(&path));
        assert!(!hashes.update(&path));
        assert_eq!(hashes.len(), 1);
    }

    #[test]
    fn test_missing_file_counts_as_changed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gone.md");
        fs::write(&path, "x").unwrap();

        let mut hashes = ContentHashes::new();
        hashes.update(&path);
        fs::remove_file(&path).unwrap();

        assert!(hashes.update(&path));
        assert!(hashes.is_empty());
    }

    #[test]
    fn test_forget_makes_next_update_a_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.md");
        fs::write(&path, "x").unwrap();

        let mut hashes = ContentHashes::new();
        hashes.update(&path);
        hashes.forget(&path);
        assert!(hashes.update(&path));
    }
}
