//! Column writer dispatch: casts an inferred-type token into the matching
//! typed setter on a [`TableWriter`].

use crate::engine::{CastError, TableWriter};
use crate::types::{is_truthy_bool, ColumnType};

/// Strip one leading and one trailing character from `token`.
///
/// Used to remove the surrounding quotes from a `String` value token before
/// it is written. Assumes `token` is at least two bytes long, which
/// [`crate::types::infer_value_type`] already guarantees for any token
/// classified as `String`.
pub fn strip_quotes(token: &str) -> &str {
    &token[1..token.len() - 1]
}

/// Write `token`, already classified as `ty`, into column `idx` of the row
/// currently open on `writer`.
///
/// A cast failure here means the entire row must be canceled by the
/// caller; this function does not cancel the row itself, since callers
/// that write multiple columns need to choose when to give up.
pub fn write_value(
    writer: &mut dyn TableWriter,
    idx: u32,
    ty: ColumnType,
    token: &str,
) -> Result<(), CastError> {
    match ty {
        ColumnType::Long => {
            let digits = &token[..token.len() - 1];
            let value: i64 = digits.parse().map_err(|_| CastError {
                column: idx.to_string(),
                expected: "LONG",
                token: token.to_string(),
            })?;
            writer.put_long(idx, value)
        }
        ColumnType::Boolean => writer.put_bool(idx, is_truthy_bool(token)),
        ColumnType::String => writer.put_str(idx, strip_quotes(token)),
        ColumnType::Symbol => writer.put_sym(idx, token),
        ColumnType::Double => {
            let value: f64 = token.parse().map_err(|_| CastError {
                column: idx.to_string(),
                expected: "DOUBLE",
                token: token.to_string(),
            })?;
            writer.put_double(idx, value)
        }
        ColumnType::Timestamp => unreachable!("timestamps are never written through column dispatch"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_one_char_each_side() {
        assert_eq!(strip_quotes("\"hi\""), "hi");
        assert_eq!(strip_quotes("\"\""), "");
    }
}
