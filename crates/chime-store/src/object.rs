//! Object-store abstraction — S3-flavored key/value semantics.
//!
//! Reads of missing keys return `None`, listings of missing prefixes return
//! empty, deletes are idempotent. The filesystem backend maps keys to files
//! under a root directory; swapping in a bucket-backed implementation is a
//! matter of implementing the trait.

use std::path::{Path, PathBuf};

use chime_core::error::{ChimeError, Result};

/// Key/value object storage with folder-style listing.
pub trait ObjectStore: Send + Sync {
    /// Read an object. Missing keys are `None`, not an error.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write an object, creating any missing parents.
    fn put(&self, key: &str, body: &[u8]) -> Result<()>;

    /// Delete an object. Deleting a missing key is a no-op.
    fn delete(&self, key: &str) -> Result<()>;

    /// List the immediate child names under a prefix (no recursion).
    fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Filesystem-backed object store.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn resolve(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl ObjectStore for FsObjectStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match std::fs::read(self.resolve(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ChimeError::Storage(format!("read {key}: {e}"))),
        }
    }

    fn put(&self, key: &str, body: &[u8]) -> Result<()> {
        let path = self.resolve(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ChimeError::Storage(format!("mkdir for {key}: {e}")))?;
        }
        std::fs::write(&path, body).map_err(|e| ChimeError::Storage(format!("write {key}: {e}")))
    }

    fn delete(&self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.resolve(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ChimeError::Storage(format!("delete {key}: {e}"))),
        }
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let dir = self.resolve(prefix);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ChimeError::Storage(format!("list {prefix}: {e}"))),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ChimeError::Storage(format!("list {prefix}: {e}")))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> (FsObjectStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("chime-test-object-{name}"));
        std::fs::remove_dir_all(&dir).ok();
        (FsObjectStore::new(&dir), dir)
    }

    #[test]
    fn test_get_put_delete_round_trip() {
        let (store, dir) = temp_store("roundtrip");
        assert!(store.get("a/b/c.json").unwrap().is_none());

        store.put("a/b/c.json", b"{}").unwrap();
        assert_eq!(store.get("a/b/c.json").unwrap().unwrap(), b"{}");

        store.delete("a/b/c.json").unwrap();
        assert!(store.get("a/b/c.json").unwrap().is_none());
        // idempotent
        store.delete("a/b/c.json").unwrap();

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_list_missing_prefix_is_empty() {
        let (store, dir) = temp_store("list-missing");
        assert!(store.list("nothing/here").unwrap().is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_list_returns_sorted_children() {
        let (store, dir) = temp_store("list-sorted");
        store.put("slots/13-55/b.json", b"{}").unwrap();
        store.put("slots/13-55/a.json", b"{}").unwrap();
        store.put("slots/14-00/c.json", b"{}").unwrap();

        assert_eq!(store.list("slots/13-55").unwrap(), vec!["a.json", "b.json"]);
        assert_eq!(store.list("slots").unwrap(), vec!["13-55", "14-00"]);

        std::fs::remove_dir_all(&dir).ok();
    }
}
