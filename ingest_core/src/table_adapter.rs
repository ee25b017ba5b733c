//! Synthesizes a [`TableStructure`] view over the current line's
//! accumulated column names/types, for `create_table` calls in `NewTable`
//! mode.

use crate::config::IngestConfig;
use crate::engine::{ColumnSpec, TableStructure};
use crate::types::ColumnType;

/// A lazily-built table structure over `(name, type)` pairs accumulated in
/// [`crate::scratch::RowScratch::column_name_type`], with a synthetic
/// trailing `timestamp` column appended.
///
/// Borrows its column data rather than copying it; valid only for the
/// duration of the `create_table` call at line-end. Carries the
/// symbol-cache flag/capacity a new table should be created with, per
/// [`IngestConfig`].
#[derive(Debug)]
pub struct NewTableStructure<'a> {
    name: &'a str,
    columns: &'a [(Box<str>, ColumnType)],
    symbol_cache: bool,
    symbol_capacity: usize,
}

impl<'a> NewTableStructure<'a> {
    /// Build a view over `name` and `columns`, carrying `config`'s
    /// symbol-cache defaults.
    pub fn new(name: &'a str, columns: &'a [(Box<str>, ColumnType)], config: &IngestConfig) -> Self {
        Self {
            name,
            columns,
            symbol_cache: config.symbol_cache,
            symbol_capacity: config.symbol_capacity,
        }
    }
}

impl<'a> TableStructure for NewTableStructure<'a> {
    fn table_name(&self) -> &str {
        self.name
    }

    fn column_count(&self) -> usize {
        self.columns.len() + 1
    }

    fn column(&self, index: usize) -> ColumnSpec<'_> {
        if index < self.columns.len() {
            let (name, ty) = &self.columns[index];
            ColumnSpec { name, ty: *ty }
        } else if index == self.columns.len() {
            ColumnSpec {
                name: "timestamp",
                ty: ColumnType::Timestamp,
            }
        } else {
            panic!(
                "column index {index} out of range for table '{}' with {} columns",
                self.name,
                self.column_count()
            );
        }
    }

    fn symbol_cache(&self) -> bool {
        self.symbol_cache
    }

    fn symbol_capacity(&self) -> usize {
        self.symbol_capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_synthetic_timestamp_column() {
        let columns = vec![
            (Box::from("host"), ColumnType::Symbol),
            (Box::from("value"), ColumnType::Double),
        ];
        let config = IngestConfig::default();
        let structure = NewTableStructure::new("cpu", &columns, &config);
        assert_eq!(structure.table_name(), "cpu");
        assert_eq!(structure.column_count(), 3);
        assert_eq!(structure.column(0).name, "host");
        assert_eq!(structure.column(1).ty, ColumnType::Double);
        assert_eq!(structure.column(2).name, "timestamp");
        assert_eq!(structure.column(2).ty, ColumnType::Timestamp);
    }

    #[test]
    fn carries_symbol_cache_settings_from_config() {
        let config = IngestConfig {
            symbol_cache: false,
            symbol_capacity: 64,
            ..IngestConfig::default()
        };
        let structure = NewTableStructure::new("cpu", &[], &config);
        assert!(!structure.symbol_cache());
        assert_eq!(structure.symbol_capacity(), 64);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_panics() {
        let config = IngestConfig::default();
        let structure = NewTableStructure::new("cpu", &[], &config);
        let _ = structure.column(1);
    }
}
