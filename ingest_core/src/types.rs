//! Per-field value-type inference and the typed column model.

/// The storage type of a column (and, by extension, of an inferred field
/// value before it is bound to one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// A signed 64-bit integer, written with an `i` suffix in line protocol
    /// (`3i`).
    Long,
    /// `true`/`false`/`t`/`T`/`f`/`F`.
    Boolean,
    /// A double-quoted field value.
    String,
    /// A dictionary-encoded string; always the type of a tag, never
    /// inferred for a field.
    Symbol,
    /// An IEEE-754 double; the default for a field with no other suffix.
    Double,
    /// The synthetic trailing column every table carries.
    Timestamp,
}

impl ColumnType {
    /// A short, stable name, used in log messages and table structures.
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Long => "LONG",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::String => "STRING",
            ColumnType::Symbol => "SYMBOL",
            ColumnType::Double => "DOUBLE",
            ColumnType::Timestamp => "TIMESTAMP",
        }
    }
}

/// Classify a raw line-protocol value token by its last character.
///
/// Returns `None` for a token that is shaped like none of the known value
/// types (e.g. an unterminated quoted string).
///
/// Rules, in order:
/// - trailing `i` -> [`ColumnType::Long`] (the numeric part excludes the
///   suffix);
/// - trailing `e`, `t`, `T`, `f`, or `F` -> [`ColumnType::Boolean`] (this
///   covers both `true`/`false`, which end in `e`, and the bare forms
///   `t`/`T`/`f`/`F`);
/// - trailing `"` -> [`ColumnType::String`], but only if the token is at
///   least two characters long and also starts with `"`;
/// - anything else -> [`ColumnType::Double`].
pub fn infer_value_type(token: &str) -> Option<ColumnType> {
    let last = *token.as_bytes().last()?;
    match last {
        b'i' => Some(ColumnType::Long),
        b'e' | b't' | b'T' | b'f' | b'F' => Some(ColumnType::Boolean),
        b'"' => {
            if token.len() >= 2 && token.as_bytes()[0] == b'"' {
                Some(ColumnType::String)
            } else {
                None
            }
        }
        _ => Some(ColumnType::Double),
    }
}

/// Whether a token inferred as [`ColumnType::Boolean`] is true.
///
/// Truthy iff the first character is `t` or `T`.
pub fn is_truthy_bool(token: &str) -> bool {
    matches!(token.as_bytes().first(), Some(b't') | Some(b'T'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_long() {
        assert_eq!(infer_value_type("3i"), Some(ColumnType::Long));
        assert_eq!(infer_value_type("-42i"), Some(ColumnType::Long));
    }

    #[test]
    fn infers_boolean_forms() {
        for tok in ["true", "false", "t", "T", "f", "F"] {
            assert_eq!(infer_value_type(tok), Some(ColumnType::Boolean), "{tok}");
        }
    }

    #[test]
    fn truthiness_checks_first_char_only() {
        assert!(is_truthy_bool("true"));
        assert!(is_truthy_bool("T"));
        assert!(!is_truthy_bool("false"));
        assert!(!is_truthy_bool("F"));
    }

    #[test]
    fn infers_quoted_string() {
        assert_eq!(infer_value_type("\"hello\""), Some(ColumnType::String));
        assert_eq!(infer_value_type("\""), None);
        assert_eq!(infer_value_type("hello\""), None);
    }

    #[test]
    fn infers_double_by_default() {
        assert_eq!(infer_value_type("0.5"), Some(ColumnType::Double));
        assert_eq!(infer_value_type("42"), Some(ColumnType::Double));
    }

    #[test]
    fn empty_token_is_invalid() {
        assert_eq!(infer_value_type(""), None);
    }
}
