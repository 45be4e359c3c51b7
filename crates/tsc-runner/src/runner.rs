//! Compiler staging and invocation.

use crate::parser::parse_compiler_output;
use camino::{Utf8Path, Utf8PathBuf};
use fs2::FileExt;
use serde_json::{Map, Value};
use source_map::{LineCol, LineIndex, Span};
use std::collections::{HashMap, HashSet};
use std::process::{Command, Stdio};
use std::time::Instant;
use tracing::debug;
use ts_diagnostics::Diagnostic;
use walkdir::WalkDir;

const SOURCES_DIR: &str = "files";
const OUT_DIR: &str = "out";
const TSCONFIG_NAME: &str = "tsconfig.json";
const BUILD_INFO_NAME: &str = ".tsbuildinfo";
const LOCK_NAME: &str = ".lock";

/// Environment variable that overrides compiler binary discovery.
pub const TSC_PATH_ENV: &str = "TS_TRANSFORM_RS_TSC";

/// Errors from staging or running the compiler.
#[derive(Debug, thiserror::Error)]
pub enum TscError {
    #[error("failed to spawn compiler process: {0}")]
    SpawnFailed(#[from] std::io::Error),

    #[error("compiler process failed with code {code}: {stderr}")]
    ProcessFailed { code: i32, stderr: String },

    #[error("compiler binary not found at {0}")]
    NotFound(Utf8PathBuf),

    #[error("failed to stage sources: {0}")]
    StagingFailed(String),

    #[error("failed to write tsconfig: {0}")]
    TsconfigFailed(String),
}

/// One source snapshot handed to the runner for staging.
#[derive(Debug, Clone, Copy)]
pub struct StagedFile<'a> {
    /// The original path the caller knows the file by.
    pub path: &'a Utf8Path,
    /// The current text of the file.
    pub text: &'a str,
}

/// Counters from one staging pass.
#[derive(Debug, Default, Clone)]
pub struct StagingStats {
    pub written: usize,
    pub skipped: usize,
    pub stale_removed: usize,
}

/// The result of one compiler run.
#[derive(Debug, Default)]
pub struct TscCheckOutput {
    /// Diagnostics with paths mapped back to the original source files.
    pub diagnostics: Vec<Diagnostic>,
    pub stats: StagingStats,
}

/// Files the compiler emitted for one input.
#[derive(Debug, Clone)]
pub struct EmitArtifacts {
    /// The generated JavaScript.
    pub code: String,
    /// The raw source map JSON, when the compiler wrote one.
    pub source_map: Option<String>,
    /// The declaration file, when the compiler wrote one.
    pub declaration: Option<String>,
}

/// Runs an external TypeScript compiler against staged registry snapshots.
///
/// Sources are mirrored into a stable staging directory with content-compare
/// writes, so repeat runs leave unchanged files untouched and the compiler's
/// incremental build info stays valid. The staging root is guarded with an
/// exclusive file lock against concurrent runners sharing a cache directory.
#[derive(Debug)]
pub struct TscRunner {
    tsc_path: Utf8PathBuf,
    project_root: Utf8PathBuf,
    staging_root: Utf8PathBuf,
    compiler_options: Map<String, Value>,
}

impl TscRunner {
    /// Creates a runner. When `staging_root` is `None` a stable directory
    /// under the user cache dir is derived from the project root.
    pub fn new(
        tsc_path: Utf8PathBuf,
        project_root: Utf8PathBuf,
        staging_root: Option<Utf8PathBuf>,
        compiler_options: Map<String, Value>,
    ) -> Result<Self, TscError> {
        let staging_root = match staging_root {
            Some(root) => root,
            None => Self::default_staging_root(&project_root).ok_or_else(|| {
                TscError::StagingFailed("could not determine a cache directory".into())
            })?,
        };
        Ok(Self {
            tsc_path,
            project_root,
            staging_root,
            compiler_options,
        })
    }

    /// Attempts to find a compiler binary.
    ///
    /// Search order:
    /// 1. The `TS_TRANSFORM_RS_TSC` environment variable
    /// 2. Workspace `node_modules/.bin` (tsgo preferred over tsc)
    /// 3. System PATH
    /// 4. Common installation locations
    /// 5. Cache directory
    pub fn find_tsc(workspace_root: Option<&Utf8Path>) -> Option<Utf8PathBuf> {
        if let Ok(path) = std::env::var(TSC_PATH_ENV) {
            let path = Utf8PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Some(workspace) = workspace_root {
            for name in ["tsgo", "tsc"] {
                let candidate = workspace.join("node_modules/.bin").join(name);
                if candidate.exists() {
                    return Some(candidate);
                }
            }
        }

        for name in ["tsgo", "tsc"] {
            if let Ok(path) = which::which(name) {
                if let Ok(utf8_path) = Utf8PathBuf::try_from(path) {
                    return Some(utf8_path);
                }
            }
        }

        for path in ["/usr/local/bin/tsc", "/usr/bin/tsc"] {
            let path = Utf8Path::new(path);
            if path.exists() {
                return Some(path.to_owned());
            }
        }

        if let Some(cache_dir) = Self::get_cache_dir() {
            for name in ["tsgo", "tsc"] {
                let candidate = cache_dir.join("node_modules/.bin").join(name);
                if candidate.exists() {
                    return Some(candidate);
                }
            }
        }

        None
    }

    /// Gets the cache directory for ts-transform-rs.
    pub fn get_cache_dir() -> Option<Utf8PathBuf> {
        dirs::cache_dir()
            .and_then(|p| Utf8PathBuf::try_from(p).ok())
            .map(|p| p.join("ts-transform-rs"))
    }

    /// The staging directory this runner writes into.
    pub fn staging_root(&self) -> &Utf8Path {
        &self.staging_root
    }

    fn default_staging_root(project_root: &Utf8Path) -> Option<Utf8PathBuf> {
        let fingerprint = blake3::hash(project_root.as_str().as_bytes());
        let short = &fingerprint.to_hex()[..16];
        Self::get_cache_dir().map(|dir| dir.join("staging").join(short))
    }

    /// Stages sources, regenerates the tsconfig and runs the compiler once.
    pub fn check(&self, files: &[StagedFile<'_>]) -> Result<TscCheckOutput, TscError> {
        if !self.tsc_path.exists() {
            return Err(TscError::NotFound(self.tsc_path.clone()));
        }

        std::fs::create_dir_all(&self.staging_root)
            .map_err(|e| TscError::StagingFailed(e.to_string()))?;
        let lock = std::fs::File::create(self.staging_root.join(LOCK_NAME))
            .map_err(|e| TscError::StagingFailed(format!("create lock: {e}")))?;
        lock.lock_exclusive()
            .map_err(|e| TscError::StagingFailed(format!("acquire lock: {e}")))?;

        let stage_start = Instant::now();
        let (staged, stats) = self.stage_sources(files)?;
        self.link_node_modules()?;
        let tsconfig = self.write_tsconfig(&staged)?;
        debug!(
            files = staged.len(),
            written = stats.written,
            skipped = stats.skipped,
            stale_removed = stats.stale_removed,
            elapsed = ?stage_start.elapsed(),
            "staged sources"
        );

        let run_start = Instant::now();
        let output = Command::new(&self.tsc_path)
            .arg("--project")
            .arg(&tsconfig)
            .arg("--pretty")
            .arg("false")
            .current_dir(&self.staging_root)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!(status = ?output.status.code(), elapsed = ?run_start.elapsed(), "compiler finished");

        // The compiler exits non-zero on type errors, which is the normal
        // path. Only a run that produced no diagnostics at all is a failure.
        if !output.status.success() && stderr.contains("error") && !stdout.contains(':') {
            let _ = fs2::FileExt::unlock(&lock);
            return Err(TscError::ProcessFailed {
                code: output.status.code().unwrap_or(-1),
                stderr: stderr.to_string(),
            });
        }

        let diagnostics = self.resolve_diagnostics(&stdout, files);
        let _ = fs2::FileExt::unlock(&lock);
        Ok(TscCheckOutput { diagnostics, stats })
    }

    /// Reads the artifacts the compiler emitted for one original path.
    ///
    /// Output files are located by the derived relative output path under the
    /// staging out dir. Returns `Ok(None)` when nothing was emitted.
    pub fn emitted(&self, original: &Utf8Path) -> Result<Option<EmitArtifacts>, TscError> {
        let rel = self.staged_rel(original);
        let ext = rel.extension().unwrap_or("ts");
        let out_ext = output_extension(ext, self.jsx_preserve());
        let out_path = self.staging_root.join(OUT_DIR).join(rel.with_extension(out_ext));

        let code = match std::fs::read_to_string(&out_path) {
            Ok(code) => code,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(TscError::StagingFailed(format!("read {out_path}: {e}"))),
        };
        let source_map = std::fs::read_to_string(format!("{out_path}.map")).ok();
        let decl_ext = match out_ext {
            "mjs" => "d.mts",
            "cjs" => "d.cts",
            _ => "d.ts",
        };
        let declaration = std::fs::read_to_string(out_path.with_extension(decl_ext)).ok();

        Ok(Some(EmitArtifacts {
            code,
            source_map,
            declaration,
        }))
    }

    /// The path a source is staged under, relative to the sources dir.
    /// Files outside the project root fall back to their file name.
    fn staged_rel(&self, path: &Utf8Path) -> Utf8PathBuf {
        match path.strip_prefix(&self.project_root) {
            Ok(rel) => rel.to_owned(),
            Err(_) => Utf8PathBuf::from(path.file_name().unwrap_or("input.ts")),
        }
    }

    fn jsx_preserve(&self) -> bool {
        self.compiler_options.get("jsx").and_then(Value::as_str) == Some("preserve")
    }

    /// Mirrors the snapshots into the staging sources dir and removes staged
    /// files whose source no longer exists.
    fn stage_sources(
        &self,
        files: &[StagedFile<'_>],
    ) -> Result<(Vec<Utf8PathBuf>, StagingStats), TscError> {
        let sources_root = self.staging_root.join(SOURCES_DIR);
        std::fs::create_dir_all(&sources_root)
            .map_err(|e| TscError::StagingFailed(e.to_string()))?;

        let mut stats = StagingStats::default();
        let mut staged = Vec::with_capacity(files.len());
        let mut keep_files: HashSet<Utf8PathBuf> = HashSet::new();
        let mut keep_dirs: HashSet<Utf8PathBuf> = HashSet::new();
        keep_dirs.insert(sources_root.clone());

        for file in files {
            let rel = self.staged_rel(file.path);
            let target = sources_root.join(&rel);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| TscError::StagingFailed(e.to_string()))?;
                let mut dir = parent.to_owned();
                while dir.starts_with(&sources_root) && dir != sources_root {
                    keep_dirs.insert(dir.clone());
                    match dir.parent() {
                        Some(p) => dir = p.to_owned(),
                        None => break,
                    }
                }
            }
            if write_if_changed(&target, file.text.as_bytes(), "write source")? {
                stats.written += 1;
            } else {
                stats.skipped += 1;
            }
            keep_files.insert(target);
            staged.push(Utf8PathBuf::from(SOURCES_DIR).join(rel));
        }

        // Clean up staged files whose original was removed from the registry.
        for entry in WalkDir::new(&sources_root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(_) => continue,
            };
            let path = match Utf8Path::from_path(entry.path()) {
                Some(path) => path,
                None => continue,
            };
            if entry.file_type().is_file() && !keep_files.contains(path) {
                let _ = std::fs::remove_file(path);
                stats.stale_removed += 1;
            }
        }
        // Remove empty directories (contents_first processes children before parents).
        for entry in WalkDir::new(&sources_root)
            .follow_links(false)
            .contents_first(true)
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(_) => continue,
            };
            let path = match Utf8Path::from_path(entry.path()) {
                Some(path) => path,
                None => continue,
            };
            if entry.file_type().is_dir() && !keep_dirs.contains(path) {
                let _ = std::fs::remove_dir(path);
            }
        }

        Ok((staged, stats))
    }

    /// Symlinks the project's node_modules into the staging root so module
    /// and lib resolution see the real installed packages.
    fn link_node_modules(&self) -> Result<(), TscError> {
        let source = self.project_root.join("node_modules");
        let target = self.staging_root.join("node_modules");
        if source.exists() && !target.exists() {
            #[cfg(unix)]
            std::os::unix::fs::symlink(&source, &target)
                .map_err(|e| TscError::StagingFailed(format!("symlink node_modules: {e}")))?;

            #[cfg(windows)]
            std::os::windows::fs::symlink_dir(&source, &target)
                .map_err(|e| TscError::StagingFailed(format!("symlink node_modules: {e}")))?;
        }
        Ok(())
    }

    /// Writes the tsconfig for this run, listing the staged files explicitly.
    fn write_tsconfig(&self, staged: &[Utf8PathBuf]) -> Result<Utf8PathBuf, TscError> {
        let mut options = self.compiler_options.clone();
        options.insert("incremental".to_string(), Value::Bool(true));
        options.insert(
            "tsBuildInfoFile".to_string(),
            Value::String(BUILD_INFO_NAME.to_string()),
        );
        options.insert("rootDir".to_string(), Value::String(SOURCES_DIR.to_string()));
        options.insert("outDir".to_string(), Value::String(OUT_DIR.to_string()));
        options.insert("sourceMap".to_string(), Value::Bool(true));
        options.insert("declaration".to_string(), Value::Bool(true));
        options.insert("noEmitOnError".to_string(), Value::Bool(false));

        let mut root = Map::new();
        root.insert("compilerOptions".to_string(), Value::Object(options));
        root.insert(
            "files".to_string(),
            Value::Array(
                staged
                    .iter()
                    .map(|p| Value::String(p.to_string()))
                    .collect(),
            ),
        );
        let content = serde_json::to_string_pretty(&Value::Object(root))
            .map_err(|e| TscError::TsconfigFailed(e.to_string()))?;

        let path = self.staging_root.join(TSCONFIG_NAME);
        write_if_changed(&path, content.as_bytes(), "write tsconfig")?;
        Ok(path)
    }

    /// Maps parsed diagnostic lines back to original paths and byte spans.
    fn resolve_diagnostics(&self, stdout: &str, files: &[StagedFile<'_>]) -> Vec<Diagnostic> {
        let mut by_staged: HashMap<Utf8PathBuf, (&Utf8Path, LineIndex)> = HashMap::new();
        for file in files {
            let key = Utf8PathBuf::from(SOURCES_DIR).join(self.staged_rel(file.path));
            by_staged.insert(key, (file.path, LineIndex::new(file.text)));
        }

        let mut diagnostics = Vec::new();
        for raw in parse_compiler_output(stdout) {
            let mut diag = Diagnostic::error(raw.code, raw.message).with_category(raw.category);
            if let Some(printed) = raw.path {
                match by_staged.get(&self.normalize_printed(&printed)) {
                    Some((original, index)) => {
                        diag.file = Some((*original).to_owned());
                        let pos = LineCol::new(
                            raw.line.saturating_sub(1),
                            raw.column.saturating_sub(1),
                        );
                        if let Some(start) = index.offset(pos) {
                            let start = u32::from(start);
                            diag.span = Some(Span::new(start, start + 1));
                        }
                    }
                    // Not one of ours, e.g. a lib or dependency file.
                    None => diag.file = Some(printed),
                }
            }
            diagnostics.push(diag);
        }
        diagnostics
    }

    /// Normalizes a path as printed by the compiler to the staged key form.
    fn normalize_printed(&self, printed: &Utf8Path) -> Utf8PathBuf {
        let printed = printed.strip_prefix(".").unwrap_or(printed);
        match printed.strip_prefix(&self.staging_root) {
            Ok(rel) => rel.to_owned(),
            Err(_) => printed.to_owned(),
        }
    }
}

fn write_if_changed(path: &Utf8Path, contents: &[u8], context: &str) -> Result<bool, TscError> {
    if let Ok(metadata) = std::fs::metadata(path) {
        if metadata.len() == contents.len() as u64 {
            if let Ok(existing) = std::fs::read(path) {
                if existing == contents {
                    return Ok(false);
                }
            }
        }
    }

    std::fs::write(path, contents).map_err(|e| TscError::StagingFailed(format!("{context}: {e}")))?;
    Ok(true)
}

fn output_extension(ext: &str, jsx_preserve: bool) -> &'static str {
    match ext {
        "tsx" | "jsx" if jsx_preserve => "jsx",
        "mts" | "mjs" => "mjs",
        "cts" | "cjs" => "cjs",
        _ => "js",
    }
}
