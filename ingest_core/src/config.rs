//! Tunables handed to [`crate::IngestCore`] at construction.

/// Knobs controlling table creation defaults and scratch pre-sizing.
///
/// Constructed by the host; this crate never reads the environment for
/// itself, mirroring the teacher's small `*Config` structs such as
/// `LifecycleConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestConfig {
    /// Whether newly created tables should enable a symbol (dictionary)
    /// cache for their `Symbol` columns.
    pub symbol_cache: bool,
    /// Initial capacity of a new table's symbol cache, if enabled.
    pub symbol_capacity: usize,
    /// Pre-allocated capacity for the per-line `column_name_type` scratch
    /// vector, sized for the common case of a handful of tags and fields.
    pub default_column_name_type_capacity: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            symbol_cache: true,
            symbol_capacity: 128,
            default_column_name_type_capacity: 8,
        }
    }
}
