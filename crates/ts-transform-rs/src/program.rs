//! The long-lived type-checking program.
//!
//! [`ProgramManager`] owns one incremental compilation unit behind a
//! [`ProgramBackend`]. Synchronization against the registry is an explicit
//! step that compares file versions against the last synchronized set and
//! only touches the backend when something actually changed.

use crate::registry::{FileSnapshot, SourceFileRegistry};
use camino::{Utf8Path, Utf8PathBuf};
use rustc_hash::FxHashMap;
use tracing::debug;
use ts_diagnostics::Diagnostic;

/// Failures inside the backing compiler, distinct from code diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error(transparent)]
    Tsc(#[from] tsc_runner::TscError),

    #[error("{0}")]
    Unavailable(String),
}

/// Artifacts the backend emitted for one file.
#[derive(Debug, Clone)]
pub struct EmitOutput {
    pub code: String,
    /// The raw source map JSON, still referencing staged paths.
    pub source_map: Option<String>,
    pub declaration: Option<String>,
}

/// The surface the program manager drives.
///
/// The production implementation wraps the external compiler; tests script
/// this trait directly.
pub trait ProgramBackend {
    /// Rebuilds the backend's view of the world from the given snapshots.
    fn synchronize(&mut self, snapshots: &[FileSnapshot]) -> Result<(), BackendError>;

    /// Returns the emitted artifacts for `path` as of the last
    /// synchronization, or `None` when nothing was emitted for it.
    fn emit(&mut self, path: &Utf8Path) -> Result<Option<EmitOutput>, BackendError>;

    /// Returns the diagnostics attributable to `path` (plus project-level
    /// diagnostics that name no file) as of the last synchronization.
    fn diagnostics(&mut self, path: &Utf8Path) -> Result<Vec<Diagnostic>, BackendError>;
}

/// Keeps a [`ProgramBackend`] in step with a [`SourceFileRegistry`].
#[derive(Debug)]
pub struct ProgramManager<B> {
    backend: B,
    synced_versions: FxHashMap<Utf8PathBuf, u64>,
}

impl<B: ProgramBackend> ProgramManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            synced_versions: FxHashMap::default(),
        }
    }

    /// Synchronizes the backend when any registry version advanced since the
    /// last call. Returns whether the backend was touched, so callers can
    /// assert the no-unnecessary-re-check property.
    pub fn synchronize(&mut self, registry: &SourceFileRegistry) -> Result<bool, BackendError> {
        let snapshots = registry.snapshots();
        let unchanged = snapshots.len() == self.synced_versions.len()
            && snapshots
                .iter()
                .all(|s| self.synced_versions.get(&s.path) == Some(&s.version));
        if unchanged {
            debug!(files = snapshots.len(), "program already in sync");
            return Ok(false);
        }

        debug!(files = snapshots.len(), "synchronizing program");
        self.backend.synchronize(&snapshots)?;
        self.synced_versions = snapshots
            .into_iter()
            .map(|s| (s.path, s.version))
            .collect();
        Ok(true)
    }

    /// Emitted artifacts for one file, per the last synchronized state.
    pub fn output(&mut self, path: &Utf8Path) -> Result<Option<EmitOutput>, BackendError> {
        self.backend.emit(path)
    }

    /// Diagnostics for one file, per the last synchronized state.
    pub fn diagnostics_for(&mut self, path: &Utf8Path) -> Result<Vec<Diagnostic>, BackendError> {
        self.backend.diagnostics(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct CountingBackend {
        sync_calls: usize,
        last_paths: Vec<Utf8PathBuf>,
    }

    impl ProgramBackend for CountingBackend {
        fn synchronize(&mut self, snapshots: &[FileSnapshot]) -> Result<(), BackendError> {
            self.sync_calls += 1;
            self.last_paths = snapshots.iter().map(|s| s.path.clone()).collect();
            Ok(())
        }

        fn emit(&mut self, _path: &Utf8Path) -> Result<Option<EmitOutput>, BackendError> {
            Ok(None)
        }

        fn diagnostics(&mut self, _path: &Utf8Path) -> Result<Vec<Diagnostic>, BackendError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_sync_skipped_when_versions_unchanged() {
        let mut registry = SourceFileRegistry::new();
        registry.update(Utf8Path::new("/p/a.ts"), "const a = 1\n");

        let mut manager = ProgramManager::new(CountingBackend::default());
        assert!(manager.synchronize(&registry).unwrap());
        assert!(!manager.synchronize(&registry).unwrap());
        assert_eq!(manager.backend.sync_calls, 1);

        // Re-registering identical text does not advance any version.
        registry.update(Utf8Path::new("/p/a.ts"), "const a = 1\n");
        assert!(!manager.synchronize(&registry).unwrap());
        assert_eq!(manager.backend.sync_calls, 1);
    }

    #[test]
    fn test_sync_runs_on_text_change() {
        let mut registry = SourceFileRegistry::new();
        registry.update(Utf8Path::new("/p/a.ts"), "const a = 1\n");

        let mut manager = ProgramManager::new(CountingBackend::default());
        manager.synchronize(&registry).unwrap();

        registry.update(Utf8Path::new("/p/a.ts"), "const a = 2\n");
        assert!(manager.synchronize(&registry).unwrap());
        assert_eq!(manager.backend.sync_calls, 2);
    }

    #[test]
    fn test_sync_runs_on_new_file() {
        let mut registry = SourceFileRegistry::new();
        registry.update(Utf8Path::new("/p/a.ts"), "a");

        let mut manager = ProgramManager::new(CountingBackend::default());
        manager.synchronize(&registry).unwrap();

        registry.update(Utf8Path::new("/p/b.ts"), "b");
        assert!(manager.synchronize(&registry).unwrap());
        assert_eq!(manager.backend.last_paths.len(), 2);
    }
}
