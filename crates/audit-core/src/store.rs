//! The database boundary.
//!
//! The generator only needs to read the catalog; the sync engine needs to
//! read and trim audit tables. Both are traits so the engines can be driven
//! by the MySQL implementation in production and by in-memory fakes in tests.

use std::fmt;

use async_trait::async_trait;

use crate::error::Result;
use crate::schema::{ColumnDef, ExistingTrigger};

/// Catalog introspection used by the generator.
#[async_trait]
pub trait Catalog: Send {
    /// All base tables in the selected schema.
    async fn list_tables(&mut self) -> Result<Vec<String>>;

    /// Columns of `table` in ordinal order.
    async fn describe_table(&mut self, table: &str) -> Result<Vec<ColumnDef>>;

    /// AFTER triggers defined on `table`, ordered by event then action order.
    async fn after_triggers(&mut self, table: &str) -> Result<Vec<ExistingTrigger>>;
}

/// Receives a streamed result set one row at a time.
pub trait RowSink {
    /// Called once with the result column names before any row.
    fn columns(&mut self, names: &[String]) -> Result<()>;

    /// Called for each row; `None` is SQL NULL.
    fn row(&mut self, values: &[Option<String>]) -> Result<()>;
}

/// Reading and trimming audit tables, used by the sync engine.
#[async_trait]
pub trait AuditStore: Send {
    /// All base tables in the selected schema.
    async fn list_tables(&mut self) -> Result<Vec<String>>;

    /// Stream every row of `audit_table` newer than `cursor` into `sink`.
    ///
    /// Returns the number of rows streamed.
    async fn stream_rows_after(
        &mut self,
        audit_table: &str,
        cursor: SyncCursor,
        sink: &mut (dyn RowSink + Send),
    ) -> Result<u64>;

    /// Fresh `count`/`min`/`max` statistics over `audit_pk`.
    async fn window(&mut self, audit_table: &str) -> Result<WipeWindow>;

    /// Delete rows with `from <= audit_pk < to`. Returns the affected row count.
    async fn delete_range(&mut self, audit_table: &str, from: i64, to: i64) -> Result<u64>;
}

/// Position of the last row already exported to a table's CSV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncCursor {
    /// Nothing exported yet; the next export starts from scratch.
    #[default]
    Fresh,
    /// Rows up to and including this `audit_pk` are already exported.
    After(i64),
}

impl SyncCursor {
    pub fn last_exported(&self) -> Option<i64> {
        match self {
            SyncCursor::Fresh => None,
            SyncCursor::After(pk) => Some(*pk),
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, SyncCursor::Fresh)
    }
}

impl fmt::Display for SyncCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncCursor::Fresh => f.write_str("fresh"),
            SyncCursor::After(pk) => write!(f, "audit_pk > {pk}"),
        }
    }
}

/// `audit_pk` statistics of an audit table at one point in time.
///
/// Never cached: concurrent trigger inserts can advance `max` at any moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WipeWindow {
    pub count: u64,
    pub min: Option<i64>,
    pub max: Option<i64>,
}
