//! The per-table `.audit.sql` file.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use audit_core::{AuditError, AuditNaming, ExistingTrigger, Result, TableSchema};
use tracing::{debug, info};

use crate::ddl::AuditTable;
use crate::trigger::TriggerSet;

/// Audit table DDL plus trigger DDL for one source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditScript {
    pub table: AuditTable,
    pub triggers: TriggerSet,
}

impl AuditScript {
    pub fn build(schema: &TableSchema, existing: &[ExistingTrigger], naming: &AuditNaming) -> Self {
        Self {
            table: AuditTable::from_schema(schema, naming),
            triggers: TriggerSet::build(schema, existing, naming),
        }
    }

    /// Overwrite `<dir>/<prefix><table>.audit.sql` with this script.
    pub fn write_to(&self, dir: &Path, naming: &AuditNaming) -> Result<PathBuf> {
        let path = dir.join(naming.sql_file(&self.table.source_table));
        info!("Writing {}", path.display());
        std::fs::write(&path, self.to_string()).map_err(|e| AuditError::io(&path, e))?;
        Ok(path)
    }
}

impl fmt::Display for AuditScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = &self.table.source_table;
        write!(
            f,
            "
/**
 * Audit table for table ({source}).
 *
 * !!! DO NOT MODIFY THIS FILE MANUALLY !!!
 *
 * This file is auto-generated and is NOT intended
 * for manual modifications/extensions.
 *
 */
"
        )?;
        write!(f, "{}", self.table)?;
        write!(
            f,
            "

/**
 * Audit triggers for table ({source}).
 *
 */

"
        )?;
        write!(f, "{}", self.triggers)
    }
}

/// Delete generated scripts that the current run will not rewrite.
///
/// Without a table filter every script carrying this prefix is removed;
/// with one, only scripts for tables outside the filter. Scripts of other
/// prefixes are left alone.
pub fn prune_stale_scripts(
    dir: &Path,
    naming: &AuditNaming,
    tables: Option<&BTreeSet<String>>,
) -> Result<Vec<PathBuf>> {
    debug!("Deleting audit table definition files in {}", dir.display());

    let entries = std::fs::read_dir(dir).map_err(|e| AuditError::io(dir, e))?;
    let mut removed = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AuditError::io(dir, e))?;
        let file_name = entry.file_name();
        let Some(table) = file_name.to_str().and_then(|n| naming.table_for_sql_file(n)) else {
            continue;
        };
        if tables.is_some_and(|selected| selected.contains(table)) {
            continue;
        }

        let path = entry.path();
        std::fs::remove_file(&path).map_err(|e| AuditError::io(&path, e))?;
        debug!("Deleted {}", path.display());
        removed.push(path);
    }

    info!("Deleted {} audit table definition files in {}", removed.len(), dir.display());
    Ok(removed)
}
