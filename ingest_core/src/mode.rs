//! The four ingest modes and the event kinds that drive transitions
//! between them.

/// An event emitted by the upstream tokenizer for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// The measurement (table name), once per line, first.
    Measurement,
    /// A tag's name.
    TagName,
    /// A tag's value. Always inferred as [`ColumnType::Symbol`].
    TagValue,
    /// A field's name.
    FieldName,
    /// A field's value.
    FieldValue,
    /// An explicit line timestamp.
    Timestamp,
}

/// The active handling behavior for the line currently in progress.
///
/// Exactly one of these applies at a time; switching modes replaces the
/// whole enum value rather than swapping out individual handler function
/// pointers, so there is no way to observe a partially-applied mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Binding to an existing table with an acquired writer: values append
    /// directly into the active row.
    Append,
    /// Binding to a table confirmed absent: column names/types accumulate
    /// in scratch for a `create_table` call at line-end.
    NewTable,
    /// The line cannot be ingested (engine error, cast mismatch, unusable
    /// table); all events are ignored until the next line.
    SkipLine,
    /// No table bound yet (before the first `Measurement` event of a
    /// line, or initial state).
    Unbound,
}
