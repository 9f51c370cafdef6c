//! Generation driver: catalog in, one `.audit.sql` file per table out.

use std::collections::BTreeSet;
use std::path::PathBuf;

use audit_core::{looks_like_audit_table, AuditError, AuditNaming, Catalog, Result, TableSchema};
use tracing::{debug, info, info_span, Instrument};

use crate::script::{prune_stale_scripts, AuditScript};

/// Options for a generation run.
#[derive(Clone, Debug)]
pub struct GenerateConfig {
    /// Directory the `.audit.sql` files are written to; created if missing
    pub output_dir: PathBuf,
    /// Only generate for these source tables; `None` means every table
    pub tables: Option<BTreeSet<String>>,
    pub naming: AuditNaming,
}

/// Outcome of a generation run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerateReport {
    pub written: Vec<PathBuf>,
    pub pruned: Vec<PathBuf>,
    pub skipped: Vec<String>,
}

/// Generate audit table and trigger definitions for every selected table.
///
/// Stops at the first error; files already written for earlier tables stay
/// on disk.
pub async fn run_generate<C: Catalog>(catalog: &mut C, config: &GenerateConfig) -> Result<GenerateReport> {
    let dir = &config.output_dir;
    debug!("Checking if path exists: {}", dir.display());
    if !dir.is_dir() {
        std::fs::create_dir_all(dir).map_err(|e| AuditError::io(dir, e))?;
        info!("Path created: {}", dir.display());
    }

    let mut report = GenerateReport {
        pruned: prune_stale_scripts(dir, &config.naming, config.tables.as_ref())?,
        ..Default::default()
    };

    info!("Getting tables");
    for table in catalog.list_tables().await? {
        if let Some(selected) = &config.tables {
            if !selected.contains(&table) {
                info!("Found table {table}. Not in output list. skipping");
                report.skipped.push(table);
                continue;
            }
        }
        if looks_like_audit_table(&table) {
            info!("Found table {table}. Appears to be an audit table. skipping");
            report.skipped.push(table);
            continue;
        }

        let span = info_span!("table", name = %table);
        let path = generate_table(catalog, &table, config).instrument(span).await?;
        report.written.push(path);
    }

    info!(
        "Successfully generated audit tables + triggers for {} tables in {}",
        report.written.len(),
        dir.display()
    );
    Ok(report)
}

async fn generate_table<C: Catalog>(catalog: &mut C, table: &str, config: &GenerateConfig) -> Result<PathBuf> {
    info!("Processing table {table}");

    let schema = TableSchema::new(table, catalog.describe_table(table).await?);
    let existing = catalog.after_triggers(table).await?;
    debug!(
        "{} columns, {} existing AFTER triggers",
        schema.columns.len(),
        existing.len()
    );

    AuditScript::build(&schema, &existing, &config.naming).write_to(&config.output_dir, &config.naming)
}
