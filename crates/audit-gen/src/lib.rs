//! Audit table and trigger generation.
//!
//! For every selected source table this crate writes one
//! `<prefix><table>.audit.sql` file holding:
//!
//! 1. a `create table if not exists` statement for the audit table,
//! 2. `DROP TRIGGER IF EXISTS` for every AFTER trigger currently on the table,
//! 3. `CREATE TRIGGER` statements for the canonical INSERT/UPDATE/DELETE
//!    triggers, each followed by whatever hand-written logic the previous
//!    triggers carried.
//!
//! Generation is a pure function of the catalog: the output is rendered from
//! small descriptor types ([`AuditTable`], [`TriggerDefinition`],
//! [`AuditScript`]) so regenerating without schema changes is byte-identical.

mod ddl;
mod generate;
mod merge;
mod script;
mod trigger;

pub use ddl::{AuditIndex, AuditTable, AuditTableColumn};
pub use generate::{run_generate, GenerateConfig, GenerateReport};
pub use merge::{is_injected_line, residual_body, strip_block_wrapper};
pub use script::{prune_stale_scripts, AuditScript};
pub use trigger::{TriggerDefinition, TriggerSet};
