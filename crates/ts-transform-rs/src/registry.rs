//! In-memory source file registry.

use camino::{Utf8Path, Utf8PathBuf};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::debug;

/// A point-in-time view of one registered file.
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    pub path: Utf8PathBuf,
    pub text: Arc<str>,
    pub version: u64,
}

#[derive(Debug)]
struct SourceFileEntry {
    text: Arc<str>,
    version: u64,
    digest: blake3::Hash,
}

/// Tracks the current text and version of every file seen by the compiler.
///
/// The version advances strictly when the text changes; re-registering equal
/// text leaves it untouched, which is what lets the program manager skip
/// re-synchronization on repeat compiles.
#[derive(Debug, Default)]
pub struct SourceFileRegistry {
    files: FxHashMap<Utf8PathBuf, SourceFileEntry>,
}

impl SourceFileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or updates `path` with `text`, returning the entry version.
    pub fn update(&mut self, path: &Utf8Path, text: &str) -> u64 {
        let digest = blake3::hash(text.as_bytes());
        match self.files.get_mut(path) {
            Some(entry) => {
                if entry.digest != digest {
                    entry.text = Arc::from(text);
                    entry.digest = digest;
                    entry.version += 1;
                    debug!(%path, version = entry.version, "source file updated");
                }
                entry.version
            }
            None => {
                debug!(%path, version = 1u64, "source file registered");
                self.files.insert(
                    path.to_owned(),
                    SourceFileEntry {
                        text: Arc::from(text),
                        version: 1,
                        digest,
                    },
                );
                1
            }
        }
    }

    /// Returns a snapshot of one file, if registered.
    pub fn get(&self, path: &Utf8Path) -> Option<FileSnapshot> {
        self.files.get(path).map(|entry| FileSnapshot {
            path: path.to_owned(),
            text: Arc::clone(&entry.text),
            version: entry.version,
        })
    }

    /// Returns the current version of one file, if registered.
    pub fn version(&self, path: &Utf8Path) -> Option<u64> {
        self.files.get(path).map(|entry| entry.version)
    }

    /// Snapshots every registered file, ordered by path so downstream
    /// consumers see a deterministic root set.
    pub fn snapshots(&self) -> Vec<FileSnapshot> {
        let mut snapshots: Vec<FileSnapshot> = self
            .files
            .iter()
            .map(|(path, entry)| FileSnapshot {
                path: path.clone(),
                text: Arc::clone(&entry.text),
                version: entry.version,
            })
            .collect();
        snapshots.sort_by(|a, b| a.path.cmp(&b.path));
        snapshots
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_version_starts_at_one() {
        let mut registry = SourceFileRegistry::new();
        let version = registry.update(Utf8Path::new("/p/a.ts"), "const a = 1\n");
        assert_eq!(version, 1);
    }

    #[test]
    fn test_equal_text_does_not_bump_version() {
        let mut registry = SourceFileRegistry::new();
        registry.update(Utf8Path::new("/p/a.ts"), "const a = 1\n");
        let version = registry.update(Utf8Path::new("/p/a.ts"), "const a = 1\n");
        assert_eq!(version, 1);
    }

    #[test]
    fn test_changed_text_bumps_version() {
        let mut registry = SourceFileRegistry::new();
        registry.update(Utf8Path::new("/p/a.ts"), "const a = 1\n");
        let version = registry.update(Utf8Path::new("/p/a.ts"), "const a = 2\n");
        assert_eq!(version, 2);
        let snapshot = registry.get(Utf8Path::new("/p/a.ts")).unwrap();
        assert_eq!(&*snapshot.text, "const a = 2\n");
    }

    #[test]
    fn test_snapshots_are_ordered() {
        let mut registry = SourceFileRegistry::new();
        registry.update(Utf8Path::new("/p/b.ts"), "b");
        registry.update(Utf8Path::new("/p/a.ts"), "a");
        let paths: Vec<_> = registry
            .snapshots()
            .into_iter()
            .map(|s| s.path.to_string())
            .collect();
        assert_eq!(paths, vec!["/p/a.ts".to_string(), "/p/b.ts".to_string()]);
    }
}
