//! Mapping table builder used while generating output text.
//!
//! The transpiler appends output in order and records, for each appended
//! piece, which original span it came from. The finished table is later
//! lowered into the VLQ `mappings` string of a JSON source map.

use crate::{ByteOffset, Span};
use text_size::TextSize;

/// A single mapping from a generated span back to an original span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    /// The span in the generated output.
    pub generated: Span,
    /// The span in the original source.
    pub original: Span,
}

impl Mapping {
    /// Returns true if generated and original spans have equal length, i.e.
    /// positions inside the span can be translated by offset arithmetic.
    #[inline]
    pub fn is_length_preserving(&self) -> bool {
        self.generated.len() == self.original.len()
    }
}

/// An ordered table of generated → original mappings.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    /// Mappings sorted by generated start offset.
    mappings: Vec<Mapping>,
}

impl MappingTable {
    /// Returns the number of mappings.
    #[inline]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Returns true if the table has no mappings.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Iterates over all mappings in generated order.
    pub fn mappings(&self) -> impl Iterator<Item = &Mapping> {
        self.mappings.iter()
    }

    /// Finds the original offset for a generated offset, if any mapping
    /// covers it.
    ///
    /// Length-preserving mappings translate by offset arithmetic; other
    /// mappings resolve to the start of their original span.
    pub fn original_position(&self, generated: ByteOffset) -> Option<ByteOffset> {
        let idx = match self
            .mappings
            .binary_search_by(|m| m.generated.start.cmp(&generated))
        {
            Ok(idx) => idx,
            Err(idx) => idx.checked_sub(1)?,
        };
        let mapping = self.mappings.get(idx)?;
        if !mapping.generated.contains(generated) {
            return None;
        }
        if mapping.is_length_preserving() {
            let delta = u32::from(generated) - u32::from(mapping.generated.start);
            Some(mapping.original.start + TextSize::from(delta))
        } else {
            Some(mapping.original.start)
        }
    }
}

/// Builds a [`MappingTable`] while output text is appended front to back.
#[derive(Debug, Default)]
pub struct MappingTableBuilder {
    mappings: Vec<Mapping>,
    /// Current length of the generated output.
    generated_offset: ByteOffset,
}

impl MappingTableBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current generated offset.
    #[inline]
    pub fn generated_offset(&self) -> ByteOffset {
        self.generated_offset
    }

    /// Records `text` copied verbatim from the original at `original_start`.
    pub fn push_verbatim(&mut self, original_start: ByteOffset, text: &str) {
        let original = Span::with_len(original_start, text.len() as u32);
        self.push_mapped(original, text.len() as u32);
    }

    /// Records generated text of `generated_len` bytes standing in for the
    /// `original` span (lengths may differ).
    pub fn push_mapped(&mut self, original: Span, generated_len: u32) {
        let generated = Span::with_len(self.generated_offset, generated_len);
        self.generated_offset = generated.end;
        if generated.is_empty() {
            return;
        }
        self.mappings.push(Mapping {
            generated,
            original,
        });
    }

    /// Records synthetic text with no original counterpart.
    pub fn push_synthetic(&mut self, text: &str) {
        self.generated_offset += TextSize::from(text.len() as u32);
    }

    /// Finishes the table, sorting mappings by generated position.
    pub fn build(mut self) -> MappingTable {
        self.mappings.sort_by_key(|m| m.generated.start);
        MappingTable {
            mappings: self.mappings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_table() {
        let table = MappingTable::default();
        assert!(table.is_empty());
        assert_eq!(table.original_position(TextSize::from(0)), None);
    }

    #[test]
    fn test_verbatim_and_synthetic() {
        let mut builder = MappingTableBuilder::new();
        builder.push_verbatim(TextSize::from(0), "hello");
        builder.push_synthetic(" ");
        builder.push_verbatim(TextSize::from(10), "world");
        let table = builder.build();

        assert_eq!(table.len(), 2);
        // "hello": generated 0..5 maps back to original 0..5
        assert_eq!(
            table.original_position(TextSize::from(4)),
            Some(TextSize::from(4))
        );
        // synthetic " " has no mapping
        assert_eq!(table.original_position(TextSize::from(5)), None);
        // "world": generated 6..11 maps back to original 10..15
        assert_eq!(
            table.original_position(TextSize::from(6)),
            Some(TextSize::from(10))
        );
    }

    #[test]
    fn test_non_length_preserving_maps_to_span_start() {
        let mut builder = MappingTableBuilder::new();
        builder.push_mapped(Span::new(20u32, 25u32), 10);
        let table = builder.build();

        assert_eq!(
            table.original_position(TextSize::from(0)),
            Some(TextSize::from(20))
        );
        assert_eq!(
            table.original_position(TextSize::from(9)),
            Some(TextSize::from(20))
        );
        assert_eq!(table.original_position(TextSize::from(10)), None);
    }
}
