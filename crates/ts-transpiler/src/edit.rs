//! Text edits applied to the source while building the mapping table.

use source_map::{ByteOffset, MappingTable, MappingTableBuilder, Span};

/// A single pending change to the source text.
#[derive(Debug, Clone)]
pub(crate) enum Edit {
    /// Replace the span with same-length whitespace, keeping newlines.
    Blank(Span),
    /// Replace the span with new text.
    Replace(Span, String),
    /// Insert text at an offset without consuming any source.
    Insert(ByteOffset, String),
}

impl Edit {
    fn start(&self) -> ByteOffset {
        match self {
            Edit::Blank(span) | Edit::Replace(span, _) => span.start,
            Edit::Insert(offset, _) => *offset,
        }
    }

    fn end(&self) -> ByteOffset {
        match self {
            Edit::Blank(span) | Edit::Replace(span, _) => span.end,
            Edit::Insert(offset, _) => *offset,
        }
    }
}

/// Replaces each span in `source` with whitespace of the same byte length,
/// keeping line breaks so every position outside the spans is unchanged.
pub(crate) fn blank_spans(source: &str, spans: &[Span]) -> String {
    let mut bytes = source.as_bytes().to_vec();
    for span in spans {
        for byte in &mut bytes[usize::from(span.start)..usize::from(span.end)] {
            if *byte != b'\n' && *byte != b'\r' {
                *byte = b' ';
            }
        }
    }
    // Blanking only writes ASCII spaces over full spans, so the result stays
    // valid UTF-8 as long as spans fall on character boundaries, which the
    // parser guarantees.
    String::from_utf8(bytes).unwrap_or_else(|e| {
        String::from_utf8_lossy(e.as_bytes()).into_owned()
    })
}

/// Applies edits to `source`, producing the output text and a mapping table
/// from generated spans back to source spans.
///
/// Edits must not overlap. Edits whose span starts before the previous edit's
/// end are dropped.
pub(crate) fn apply_edits(source: &str, mut edits: Vec<Edit>) -> (String, MappingTable) {
    edits.sort_by_key(|e| (e.start(), e.end()));

    let mut out = String::with_capacity(source.len());
    let mut builder = MappingTableBuilder::new();
    let mut cursor = ByteOffset::from(0u32);

    for edit in edits {
        if edit.start() < cursor {
            debug_assert!(false, "overlapping edit at {:?}", edit.start());
            continue;
        }
        let verbatim = &source[usize::from(cursor)..usize::from(edit.start())];
        if !verbatim.is_empty() {
            builder.push_verbatim(cursor, verbatim);
            out.push_str(verbatim);
        }
        match edit {
            Edit::Blank(span) => {
                let blanked = blank_spans(span.slice(source), &[Span::with_len(0u32, span.len())]);
                builder.push_mapped(span, blanked.len() as u32);
                out.push_str(&blanked);
                cursor = span.end;
            }
            Edit::Replace(span, text) => {
                builder.push_mapped(span, text.len() as u32);
                out.push_str(&text);
                cursor = span.end;
            }
            Edit::Insert(offset, text) => {
                builder.push_synthetic(&text);
                out.push_str(&text);
                cursor = offset;
            }
        }
    }

    let tail = &source[usize::from(cursor)..];
    if !tail.is_empty() {
        builder.push_verbatim(cursor, tail);
        out.push_str(tail);
    }

    (out, builder.build())
}
