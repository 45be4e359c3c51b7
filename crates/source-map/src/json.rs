//! JSON source map (version 3) model.
//!
//! Covers the three operations the pipeline needs: lowering a
//! [`MappingTable`] into the VLQ `mappings` string, parsing a map emitted by
//! the external compiler, and normalizing `file`/`sources`/`sourcesContent`
//! so they reference the original input instead of staged intermediates.

use crate::{LineIndex, MappingTable};
use serde::{Deserialize, Serialize};
use text_size::TextSize;
use thiserror::Error;

const BASE64_CHARS: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Error produced when a source map cannot be parsed or serialized.
#[derive(Debug, Error)]
pub enum SourceMapError {
    /// The map is not valid JSON or misses required fields.
    #[error("invalid source map: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The `mappings` string contains a malformed VLQ sequence.
    #[error("invalid VLQ in mappings at byte {0}")]
    InvalidVlq(usize),
}

/// A version 3 JSON source map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMapJson {
    /// Always 3.
    pub version: u32,
    /// The generated output file name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Prefix prepended to every entry in `sources`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,
    /// The original source paths.
    pub sources: Vec<String>,
    /// The original source texts, parallel to `sources`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<String>>,
    /// Symbol names referenced by mappings (unused by this pipeline).
    #[serde(default)]
    pub names: Vec<String>,
    /// VLQ-encoded mapping segments.
    pub mappings: String,
}

impl SourceMapJson {
    /// Parses a JSON source map.
    pub fn parse(text: &str) -> Result<Self, SourceMapError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serializes the map to a JSON string.
    pub fn to_json_string(&self) -> Result<String, SourceMapError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Lowers a [`MappingTable`] into a complete map for a single source.
    ///
    /// `source` is the original text, `generated` the output text. One
    /// segment is emitted at every mapping start and at every generated line
    /// start inside a mapping, so stack traces resolve on any line.
    pub fn from_table(
        table: &MappingTable,
        source: &str,
        generated: &str,
        file: impl Into<String>,
        source_path: impl Into<String>,
    ) -> Self {
        let gen_index = LineIndex::new(generated);
        let src_index = LineIndex::new(source);

        // Absolute segments: (gen line, gen col, src line, src col).
        let mut segments: Vec<(u32, u32, u32, u32)> = Vec::new();
        let mut push = |gen_offset: u32, src_offset: u32| {
            let g = gen_index.line_col(TextSize::from(gen_offset));
            let s = src_index.line_col(TextSize::from(src_offset));
            segments.push((g.line, g.col, s.line, s.col));
        };

        for mapping in table.mappings() {
            let gen_start = u32::from(mapping.generated.start);
            let gen_end = u32::from(mapping.generated.end);
            let src_start = u32::from(mapping.original.start);

            push(gen_start, src_start);

            // Additional segment at each generated line start within the span.
            let first_line = gen_index.line_col(mapping.generated.start).line;
            let last_line = gen_index
                .line_col(TextSize::from(gen_end.saturating_sub(1)))
                .line;
            for line in first_line + 1..=last_line {
                let Some(line_start) = gen_index.line_start(line) else {
                    break;
                };
                let line_start = u32::from(line_start);
                let src_offset = if mapping.is_length_preserving() {
                    src_start + (line_start - gen_start)
                } else {
                    src_start
                };
                push(line_start, src_offset);
            }
        }

        segments.sort_unstable();
        segments.dedup();

        Self {
            version: 3,
            file: Some(file.into()),
            source_root: None,
            sources: vec![source_path.into()],
            sources_content: Some(vec![source.to_owned()]),
            names: Vec::new(),
            mappings: encode_segments(&segments),
        }
    }

    /// Rewrites the map so it references the original input: `file` becomes
    /// the logical output name, `sources` exactly `[source_path]` and
    /// `sourcesContent` exactly `[source_text]`, with any `sourceRoot`
    /// cleared. Mappings are left untouched.
    pub fn normalize(&mut self, file: &str, source_path: &str, source_text: &str) {
        self.file = Some(file.to_owned());
        self.source_root = None;
        self.sources = vec![source_path.to_owned()];
        self.sources_content = Some(vec![source_text.to_owned()]);
    }

    /// Decodes `mappings` into absolute `(gen line, gen col, src line,
    /// src col)` segments. Segments without a source reference are skipped.
    pub fn decode_segments(&self) -> Result<Vec<(u32, u32, u32, u32)>, SourceMapError> {
        let mut out = Vec::new();
        let mut src_line: i64 = 0;
        let mut src_col: i64 = 0;

        for (line_no, line) in self.mappings.split(';').enumerate() {
            let gen_line = line_no as u32;
            let mut gen_col: i64 = 0;
            for segment in line.split(',') {
                if segment.is_empty() {
                    continue;
                }
                let fields = decode_vlq(segment)?;
                gen_col += fields[0];
                if fields.len() >= 4 {
                    src_line += fields[2];
                    src_col += fields[3];
                    out.push((gen_line, gen_col as u32, src_line as u32, src_col as u32));
                }
            }
        }
        Ok(out)
    }
}

/// Encodes sorted absolute segments into the `mappings` string.
fn encode_segments(segments: &[(u32, u32, u32, u32)]) -> String {
    let mut out = String::new();
    let mut current_line: u32 = 0;
    let mut prev_gen_col: i64 = 0;
    let mut prev_src_line: i64 = 0;
    let mut prev_src_col: i64 = 0;
    let mut first_on_line = true;

    for &(gen_line, gen_col, src_line, src_col) in segments {
        while current_line < gen_line {
            out.push(';');
            current_line += 1;
            prev_gen_col = 0;
            first_on_line = true;
        }
        if !first_on_line {
            out.push(',');
        }
        encode_vlq(gen_col as i64 - prev_gen_col, &mut out);
        // Single-source maps: the source index delta is always zero.
        encode_vlq(0, &mut out);
        encode_vlq(src_line as i64 - prev_src_line, &mut out);
        encode_vlq(src_col as i64 - prev_src_col, &mut out);

        prev_gen_col = gen_col as i64;
        prev_src_line = src_line as i64;
        prev_src_col = src_col as i64;
        first_on_line = false;
    }
    out
}

/// Appends one base64 VLQ value to `out`.
fn encode_vlq(value: i64, out: &mut String) {
    let mut vlq: u64 = if value < 0 {
        (((-value) as u64) << 1) | 1
    } else {
        (value as u64) << 1
    };
    loop {
        let mut digit = (vlq & 0b11111) as usize;
        vlq >>= 5;
        if vlq != 0 {
            digit |= 0b100000;
        }
        out.push(BASE64_CHARS[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}

/// Decodes one VLQ segment into its fields.
fn decode_vlq(segment: &str) -> Result<Vec<i64>, SourceMapError> {
    let mut fields = Vec::new();
    let mut value: u64 = 0;
    let mut shift: u32 = 0;
    for (pos, byte) in segment.bytes().enumerate() {
        let digit = BASE64_CHARS
            .iter()
            .position(|&c| c == byte)
            .ok_or(SourceMapError::InvalidVlq(pos))? as u64;
        value |= (digit & 0b11111) << shift;
        if digit & 0b100000 != 0 {
            shift += 5;
            continue;
        }
        let signed = if value & 1 != 0 {
            -((value >> 1) as i64)
        } else {
            (value >> 1) as i64
        };
        fields.push(signed);
        value = 0;
        shift = 0;
    }
    if shift != 0 {
        return Err(SourceMapError::InvalidVlq(segment.len()));
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MappingTableBuilder;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_vlq_roundtrip() {
        for value in [-1024i64, -33, -1, 0, 1, 15, 16, 33, 1024, 123456] {
            let mut encoded = String::new();
            encode_vlq(value, &mut encoded);
            assert_eq!(decode_vlq(&encoded).unwrap(), vec![value]);
        }
    }

    #[test]
    fn test_identity_mapping_encoding() {
        let source = "const a = 1\nconst b = 2\n";
        let mut builder = MappingTableBuilder::new();
        builder.push_verbatim(TextSize::from(0), source);
        let table = builder.build();

        let map = SourceMapJson::from_table(&table, source, source, "test.js", "test.ts");
        assert_eq!(map.version, 3);
        assert_eq!(map.sources, vec!["test.ts".to_owned()]);
        assert_eq!(map.sources_content, Some(vec![source.to_owned()]));

        let segments = map.decode_segments().unwrap();
        // One segment per line, each an identity position.
        assert!(segments.contains(&(0, 0, 0, 0)));
        assert!(segments.contains(&(1, 0, 1, 0)));
    }

    #[test]
    fn test_replaced_region_maps_to_original_start() {
        let source = "x as const";
        let mut builder = MappingTableBuilder::new();
        builder.push_mapped(crate::Span::new(0u32, 10u32), 1);
        let table = builder.build();

        let map = SourceMapJson::from_table(&table, source, "x", "test.js", "test.ts");
        let segments = map.decode_segments().unwrap();
        assert_eq!(segments, vec![(0, 0, 0, 0)]);
    }

    #[test]
    fn test_serde_field_names() {
        let map = SourceMapJson {
            version: 3,
            file: Some("foo.js".into()),
            source_root: None,
            sources: vec!["foo.ts".into()],
            sources_content: Some(vec!["const x = 1".into()]),
            names: Vec::new(),
            mappings: "AAAA".into(),
        };
        let json = map.to_json_string().unwrap();
        assert!(json.contains("\"sourcesContent\""));
        assert!(!json.contains("\"sourceRoot\""));
        let back = SourceMapJson::parse(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_normalize_rewrites_sources() {
        let mut map = SourceMapJson::parse(
            r#"{"version":3,"file":"out/foo.js","sourceRoot":"","sources":["../foo.ts"],"names":[],"mappings":"AAAA"}"#,
        )
        .unwrap();
        map.normalize("foo.js", "/project/foo.ts", "const x = 1");
        assert_eq!(map.file.as_deref(), Some("foo.js"));
        assert_eq!(map.sources, vec!["/project/foo.ts".to_owned()]);
        assert_eq!(map.sources_content, Some(vec!["const x = 1".to_owned()]));
        assert_eq!(map.source_root, None);
    }
}
