//! Per-line scratch buffers, reused across lines rather than reallocated.

use crate::token::TokenAddress;
use crate::types::ColumnType;

/// The three parallel scratch arrays a single line's events accumulate
/// into.
///
/// Cleared (not reallocated) after every `on_line_end`/`on_error`, so a
/// long-running ingest loop does no per-line heap allocation once the
/// vectors have grown to their steady-state size.
#[derive(Debug, Default)]
pub struct RowScratch {
    /// `(name, type)` pairs accumulated while building a new table's first
    /// row. Only populated in `NewTable` mode.
    pub column_name_type: Vec<(Box<str>, ColumnType)>,
    /// `(column_index, type)` pairs for fields/tags already bound to an
    /// existing column. Only populated in `Append` mode.
    pub column_index_and_type: Vec<(u32, ColumnType)>,
    /// Value tokens, parallel to `column_name_type` (`NewTable`) or
    /// `column_index_and_type` (`Append`); a trailing extra entry holds an
    /// explicit timestamp token, if one was emitted this line.
    pub column_values: Vec<TokenAddress>,
}

impl RowScratch {
    /// Construct scratch buffers pre-sized per `capacity`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            column_name_type: Vec::with_capacity(capacity),
            column_index_and_type: Vec::with_capacity(capacity),
            column_values: Vec::with_capacity(capacity + 1),
        }
    }

    /// Clear all three buffers, retaining their allocated capacity.
    pub fn clear(&mut self) {
        self.column_name_type.clear();
        self.column_index_and_type.clear();
        self.column_values.clear();
    }

    /// Whether a trailing, unpaired timestamp token is present — i.e. there
    /// is one more value than there are bound columns.
    pub fn has_trailing_timestamp(&self, bound_columns: usize) -> bool {
        self.column_values.len() == bound_columns + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_retains_capacity() {
        let mut scratch = RowScratch::with_capacity(4);
        scratch.column_index_and_type.push((0, ColumnType::Long));
        scratch.clear();
        assert!(scratch.column_index_and_type.is_empty());
        assert!(scratch.column_index_and_type.capacity() >= 4);
    }

    #[test]
    fn detects_trailing_timestamp() {
        let mut scratch = RowScratch::default();
        scratch.column_index_and_type.push((0, ColumnType::Long));
        assert!(!scratch.has_trailing_timestamp(1));
        scratch
            .column_values
            .push(TokenAddress::new(1).unwrap());
        assert!(!scratch.has_trailing_timestamp(1));
        scratch
            .column_values
            .push(TokenAddress::new(2).unwrap());
        assert!(scratch.has_trailing_timestamp(1));
    }
}
