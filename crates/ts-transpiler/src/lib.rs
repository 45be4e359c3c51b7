//! Stateless single-file TS/TSX/JS to JS transform.
//!
//! The transpiler never resolves other files and never type-checks. It parses
//! one source string, erases type-only syntax by position-preserving blanking,
//! then applies the few transforms that change code shape (enum desugaring,
//! constructor parameter properties, optional JSX and CommonJS lowering) as
//! spliced text edits with a mapping table. Diagnostics are limited to parse
//! errors and constructs that cannot be transpiled without whole-program
//! knowledge.

mod cjs;
mod edit;
mod enums;
mod jsx;
mod options;
mod parse;
mod patch;
mod strip;
mod transpile;

pub use options::{FileKind, JsxMode, ModuleKind, TranspileOptions};
pub use transpile::{output_file_name, transpile, TranspileResult};
