//! Helpers for working within SQLite's bound-parameter limit.

use std::str::FromStr;

use crate::errors::StorageError;

/// Maximum number of bound values used by one `IN (...)` list.
///
/// Kept well below `SQLITE_MAX_VARIABLE_NUMBER` so the rest of the query
/// still has room for its own parameters.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Maximum number of rows per multi-row `INSERT`.
///
/// The widest line table binds eleven values per row, which keeps a full
/// chunk under the 32766 parameter limit of the bundled SQLite.
pub const SQLITE_MAX_ROWS_PER_INSERT: usize = 500;

/// Splits a slice into chunks suitable for `IN (...)` lookups.
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}

/// Splits rows into chunks suitable for multi-row inserts.
pub fn chunk_rows<T>(rows: &[T]) -> impl Iterator<Item = &[T]> {
    rows.chunks(SQLITE_MAX_ROWS_PER_INSERT)
}

/// Parses a decimal TEXT column into its domain value.
pub fn parse_text_column<T>(column: &str, raw: &str) -> Result<T, StorageError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| {
        StorageError::SerializationError(format!("Invalid {} value '{}': {}", column, raw, e))
    })
}

/// Parses an optional decimal TEXT column.
pub fn parse_optional_text_column<T>(
    column: &str,
    raw: Option<&str>,
) -> Result<Option<T>, StorageError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|value| parse_text_column(column, value)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_for_sqlite_empty() {
        let items: Vec<i64> = vec![];
        assert_eq!(chunk_for_sqlite(&items).count(), 0);
    }

    #[test]
    fn test_chunk_for_sqlite_over_limit() {
        let items: Vec<i64> = (0..1200).collect();
        let chunks: Vec<_> = chunk_for_sqlite(&items).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), SQLITE_MAX_PARAMS_CHUNK);
        assert_eq!(chunks[2].len(), 200);
    }

    #[test]
    fn test_chunk_rows_exact_limit() {
        let rows: Vec<i64> = (0..SQLITE_MAX_ROWS_PER_INSERT as i64).collect();
        assert_eq!(chunk_rows(&rows).count(), 1);
    }

    #[test]
    fn test_parse_text_column_keeps_full_i128_range() {
        let parsed: i128 = parse_text_column("amount_minor", &i128::MAX.to_string()).unwrap();
        assert_eq!(parsed, i128::MAX);

        let parsed: i128 = parse_text_column("amount_minor", "-42").unwrap();
        assert_eq!(parsed, -42);
    }

    #[test]
    fn test_parse_text_column_rejects_garbage() {
        let err = parse_text_column::<i128>("qty_nano", "1.5").unwrap_err();
        assert!(err.to_string().contains("qty_nano"));
    }

    #[test]
    fn test_parse_optional_text_column() {
        assert_eq!(parse_optional_text_column::<i128>("price_nano", None).unwrap(), None);
        assert_eq!(
            parse_optional_text_column::<i128>("price_nano", Some("7")).unwrap(),
            Some(7)
        );
    }
}
