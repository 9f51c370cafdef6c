//! Deriving the sync cursor from the destination CSV.

use std::path::Path;

use audit_core::{Result, SyncCursor};
use tracing::debug;

use crate::tail::read_last_record;

/// A data row carries every source column plus the five audit columns, so a
/// record with this many fields or fewer cannot be one.
const MIN_FIELDS_EXCLUSIVE: usize = 5;

/// Interpret the last record of a CSV file as a cursor.
///
/// `audit_pk` is always the last column. A record with too few fields, or
/// whose last field is not an integer (e.g. the header row), means nothing
/// has been exported yet.
pub fn cursor_from_last_record(record: &str) -> SyncCursor {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(record.as_bytes());

    let Some(Ok(record)) = reader.records().next() else {
        return SyncCursor::Fresh;
    };
    if record.len() <= MIN_FIELDS_EXCLUSIVE {
        return SyncCursor::Fresh;
    }

    record
        .get(record.len() - 1)
        .and_then(|pk| pk.trim().parse::<i64>().ok())
        .map_or(SyncCursor::Fresh, SyncCursor::After)
}

/// The cursor for the CSV file at `path`; `Fresh` if it does not exist.
pub fn read_cursor(path: &Path) -> Result<SyncCursor> {
    let cursor = match read_last_record(path)? {
        Some(record) => cursor_from_last_record(&record),
        None => SyncCursor::Fresh,
    };
    debug!("Cursor for {}: {cursor}", path.display());
    Ok(cursor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_data_row_yields_last_field() {
        assert_eq!(
            cursor_from_last_record("7,alice,2024-01-01 00:00:00,,,2024-01-01 00:00:00,42"),
            SyncCursor::After(42)
        );
    }

    #[test]
    fn test_quoted_fields_are_parsed_as_csv() {
        assert_eq!(
            cursor_from_last_record(r#"7,"smith, ""al""",a,,,b,43"#),
            SyncCursor::After(43)
        );
        assert_eq!(
            cursor_from_last_record("3,\"note ends with newline\n\",t,,,t,3"),
            SyncCursor::After(3)
        );
    }

    #[test]
    fn test_five_or_fewer_fields_is_fresh() {
        assert_eq!(cursor_from_last_record("1,2,3,4,5"), SyncCursor::Fresh);
        assert_eq!(cursor_from_last_record("1"), SyncCursor::Fresh);
        assert_eq!(cursor_from_last_record(""), SyncCursor::Fresh);
    }

    #[test]
    fn test_non_numeric_last_field_is_fresh() {
        assert_eq!(
            cursor_from_last_record(
                "id,name,audit_insert_timestamp,audit_update_timestamp,audit_delete_timestamp,audit_change_timestamp,audit_pk"
            ),
            SyncCursor::Fresh
        );
        assert_eq!(cursor_from_last_record("1,2,3,4,5,6,x7"), SyncCursor::Fresh);
        assert_eq!(cursor_from_last_record("1,2,3,4,5,6,"), SyncCursor::Fresh);
    }

    #[test]
    fn test_read_cursor_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("users_audit.csv");
        assert_eq!(read_cursor(&path).unwrap(), SyncCursor::Fresh);

        std::fs::write(&path, "a,b,c,d,e,f,audit_pk\n1,x,t,,,t,1\n2,y,t,,,t,2\n").unwrap();
        assert_eq!(read_cursor(&path).unwrap(), SyncCursor::After(2));

        std::fs::write(&path, "a,b,c,d,e,f,audit_pk\n1,x,t,,,t,1\n2,\"y\n\",t,,,t,2\n").unwrap();
        assert_eq!(read_cursor(&path).unwrap(), SyncCursor::After(2));
    }
}
