//! Transpile options and file-kind detection.

/// The module system the output targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModuleKind {
    /// Leave import/export syntax as-is.
    #[default]
    EsNext,
    /// Lower import/export syntax to `require`/`exports`.
    CommonJs,
}

/// How JSX syntax is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsxMode {
    /// Leave JSX syntax untouched in the output.
    #[default]
    Preserve,
    /// Lower JSX to factory calls.
    React,
}

/// Options for a single transpile call.
#[derive(Debug, Clone)]
pub struct TranspileOptions {
    /// The module system to emit.
    pub module: ModuleKind,
    /// How to handle JSX in `.tsx`/`.jsx` files.
    pub jsx: JsxMode,
    /// Factory called for each lowered JSX element.
    pub jsx_factory: String,
    /// Factory passed as the tag for lowered JSX fragments.
    pub jsx_fragment_factory: String,
}

impl Default for TranspileOptions {
    fn default() -> Self {
        Self {
            module: ModuleKind::default(),
            jsx: JsxMode::default(),
            jsx_factory: "React.createElement".to_owned(),
            jsx_fragment_factory: "React.Fragment".to_owned(),
        }
    }
}

/// The source language of an input file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// `.ts`, `.mts`, `.cts`
    Ts,
    /// `.tsx`
    Tsx,
    /// `.js`, `.mjs`, `.cjs`
    Js,
    /// `.jsx`
    Jsx,
}

impl FileKind {
    /// Detects the file kind from a path's extension. Returns `None` for
    /// extensions the pipeline does not compile.
    pub fn from_path(path: &str) -> Option<Self> {
        let ext = path.rsplit('.').next()?;
        match ext {
            "ts" | "mts" | "cts" => Some(Self::Ts),
            "tsx" => Some(Self::Tsx),
            "js" | "mjs" | "cjs" => Some(Self::Js),
            "jsx" => Some(Self::Jsx),
            _ => None,
        }
    }

    /// Returns true for TypeScript inputs.
    #[inline]
    pub fn is_typescript(self) -> bool {
        matches!(self, Self::Ts | Self::Tsx)
    }

    /// Returns true for inputs that may contain JSX.
    #[inline]
    pub fn has_jsx(self) -> bool {
        matches!(self, Self::Tsx | Self::Jsx)
    }
}
