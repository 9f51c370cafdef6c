//! Core types for cdc-audit.
//!
//! This crate provides the data model shared by the generator and the
//! sync engine:
//!
//! - [`ColumnDef`] / [`TableSchema`] - source table metadata read from the catalog
//! - [`ExistingTrigger`] / [`TriggerEvent`] - AFTER triggers already on a table
//! - [`AuditNaming`] - the prefix-aware mapping from source table to audit table
//! - [`Catalog`] / [`AuditStore`] - the database boundary
//! - [`AuditError`] - the error taxonomy
//!
//! # Architecture
//!
//! ```text
//! audit-core (this crate)
//!    │
//!    ├─── audit-gen    (audit table + trigger DDL generation)
//!    ├─── audit-sync   (CSV export + wipe)
//!    └─── mysql-audit  (implements Catalog/AuditStore over mysql_async)
//! ```

pub mod error;
pub mod naming;
pub mod schema;
pub mod store;

pub use error::{AuditError, Result};
pub use naming::{looks_like_audit_table, AuditNaming, AUDIT_SUFFIX};
pub use schema::{
    AuditColumn, ColumnDef, ExistingTrigger, TableSchema, TriggerEvent, AUDIT_COLUMNS,
    AUDIT_PK_COLUMN,
};
pub use store::{AuditStore, Catalog, RowSink, SyncCursor, WipeWindow};
