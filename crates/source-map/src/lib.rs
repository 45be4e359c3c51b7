//! Source position tracking and mapping for ts-transform-rs.
//!
//! This crate provides the position machinery the compiler pipeline is built
//! on: byte-offset spans, a line index for offset ↔ line/column conversion, a
//! mapping builder used while generating output text, and the JSON source-map
//! (version 3) model with VLQ-encoded `mappings`.

mod builder;
mod json;
mod line_index;
mod span;

pub use builder::{Mapping, MappingTable, MappingTableBuilder};
pub use json::{SourceMapError, SourceMapJson};
pub use line_index::{LineCol, LineIndex};
pub use span::{ByteOffset, Span};
