//! Incremental export of audit tables to CSV.
//!
//! Each audit table is appended to `<audit_table>.csv`. The file itself is
//! the only record of progress: the last record's final field is the
//! `audit_pk` of the last exported row, so a run only queries rows above it.
//!
//! After a table is exported it can optionally be wiped: rows are deleted in
//! bounded `audit_pk` ranges until one row remains, which keeps the table
//! small without ever taking a long lock.
//!
//! A table must never be synced and wiped concurrently; [`run_sync`] always
//! finishes the export of a table before its wipe starts.

mod cursor;
mod export;
mod sync;
mod tail;
mod wipe;

#[cfg(test)]
mod memory;

pub use cursor::{cursor_from_last_record, read_cursor};
pub use export::{export_table, ExportReport};
pub use sync::{run_sync, SyncConfig, SyncReport};
pub use tail::{last_record, read_last_record, MAX_RECORD_BYTES};
pub use wipe::{wipe_table, WipeConfig, WipeReport};
