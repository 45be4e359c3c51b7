//! Scripted program backend for hermetic orchestration tests.

use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use ts_diagnostics::Diagnostic;
use ts_transform_rs::{BackendError, EmitOutput, FileSnapshot, ProgramBackend};

/// A backend that "compiles" by prefixing the staged text and returns a
/// staged-looking source map, so tests can assert the orchestrator's
/// normalization and synchronization behavior without an external binary.
pub struct FakeBackend {
    pub diagnostics: Vec<Diagnostic>,
    pub no_emit: bool,
    pub sync_count: Arc<AtomicUsize>,
    texts: HashMap<Utf8PathBuf, String>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
            no_emit: false,
            sync_count: Arc::new(AtomicUsize::new(0)),
            texts: HashMap::new(),
        }
    }

    pub fn with_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            diagnostics,
            ..Self::new()
        }
    }
}

impl ProgramBackend for FakeBackend {
    fn synchronize(&mut self, snapshots: &[FileSnapshot]) -> Result<(), BackendError> {
        self.sync_count.fetch_add(1, Ordering::SeqCst);
        self.texts = snapshots
            .iter()
            .map(|s| (s.path.clone(), s.text.to_string()))
            .collect();
        Ok(())
    }

    fn emit(&mut self, path: &Utf8Path) -> Result<Option<EmitOutput>, BackendError> {
        if self.no_emit {
            return Ok(None);
        }
        let Some(text) = self.texts.get(path) else {
            return Ok(None);
        };
        // Paths as an out-of-tree compiler would encode them, relative to
        // its staging directory. The orchestrator must rewrite these.
        let map = serde_json::json!({
            "version": 3,
            "file": "out/staged.js",
            "sourceRoot": "",
            "sources": ["../files/staged.ts"],
            "names": [],
            "mappings": "AAAA"
        })
        .to_string();
        Ok(Some(EmitOutput {
            code: format!("\"use strict\";\n{text}"),
            source_map: Some(map),
            declaration: None,
        }))
    }

    fn diagnostics(&mut self, path: &Utf8Path) -> Result<Vec<Diagnostic>, BackendError> {
        Ok(self
            .diagnostics
            .iter()
            .filter(|d| match &d.file {
                Some(file) => file == path,
                None => true,
            })
            .cloned()
            .collect())
    }
}
