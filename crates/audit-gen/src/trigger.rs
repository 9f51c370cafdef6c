//! AFTER trigger DDL.

use std::fmt;

use audit_core::{AuditColumn, AuditNaming, ExistingTrigger, TableSchema, TriggerEvent, AUDIT_COLUMNS};

use crate::ddl::quote_ident;
use crate::merge::merged_residual;

const NOW: &str = "CURRENT_TIMESTAMP";
const NULL: &str = "null";

/// One canonical `<table>_after_<event>` trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerDefinition {
    pub name: String,
    pub table: String,
    pub event: TriggerEvent,
    pub audit_table: String,
    /// Target columns of the injected insert
    pub columns: Vec<String>,
    /// SQL expressions matching `columns`
    pub values: Vec<String>,
    /// Preserved user logic, emitted after the injected insert
    pub residual: String,
}

impl TriggerDefinition {
    pub fn new(schema: &TableSchema, event: TriggerEvent, audit_table: &str, residual: String) -> Self {
        let row = match event {
            TriggerEvent::Insert | TriggerEvent::Update => "NEW",
            TriggerEvent::Delete => "OLD",
        };

        let mut columns: Vec<String> = schema.column_names().map(str::to_string).collect();
        let mut values: Vec<String> = columns
            .iter()
            .map(|c| format!("{row}.{}", quote_ident(c)))
            .collect();

        let event_column = AuditColumn::event_timestamp(event);
        for audit_column in AUDIT_COLUMNS.iter().filter(|c| !c.is_surrogate_key()) {
            columns.push(audit_column.name.to_string());
            let is_now = audit_column == event_column || audit_column == AuditColumn::change_timestamp();
            values.push(if is_now { NOW } else { NULL }.to_string());
        }

        Self {
            name: canonical_trigger_name(&schema.table_name, event),
            table: schema.table_name.clone(),
            event,
            audit_table: audit_table.to_string(),
            columns,
            values,
            residual,
        }
    }

    /// The injected `insert into <audit_table>(...) values(...);` statement.
    pub fn audit_insert(&self) -> String {
        let cols: Vec<String> = self.columns.iter().map(|c| quote_ident(c)).collect();
        format!(
            "insert into {}({}) values({});",
            quote_ident(&self.audit_table),
            cols.join(", "),
            self.values.join(", ")
        )
    }
}

/// `<table>_after_<event>`
pub fn canonical_trigger_name(table: &str, event: TriggerEvent) -> String {
    format!("{table}_after_{}", event.suffix())
}

impl fmt::Display for TriggerDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-- {} after {} trigger.", self.table, self.event)?;
        writeln!(f, "DELIMITER @@")?;
        writeln!(
            f,
            "CREATE TRIGGER {} AFTER {} ON {}",
            quote_ident(&self.name),
            self.event,
            quote_ident(&self.table)
        )?;
        writeln!(f, " FOR EACH ROW BEGIN")?;
        writeln!(f, "  {}", self.audit_insert())?;
        writeln!(f)?;
        writeln!(f, "{}", self.residual)?;
        writeln!(f, " END;")?;
        writeln!(f, "@@")?;
        writeln!(f, "DELIMITER ;")
    }
}

/// Every trigger statement generated for one source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerSet {
    pub table: String,
    /// Trigger names to drop, existing ones first
    pub drops: Vec<String>,
    pub triggers: Vec<TriggerDefinition>,
}

impl TriggerSet {
    /// Replace every existing AFTER trigger on the table with the three
    /// canonical triggers, carrying over their residual logic.
    ///
    /// The canonical names are always dropped too, so the script can be
    /// applied more than once.
    pub fn build(schema: &TableSchema, existing: &[ExistingTrigger], naming: &AuditNaming) -> Self {
        let audit_table = naming.audit_table(&schema.table_name);

        let mut drops: Vec<String> = Vec::new();
        let canonical = TriggerEvent::ALL
            .iter()
            .map(|e| canonical_trigger_name(&schema.table_name, *e));
        for name in existing.iter().map(|t| t.name.clone()).chain(canonical) {
            if !drops.contains(&name) {
                drops.push(name);
            }
        }

        let triggers = TriggerEvent::ALL
            .iter()
            .map(|event| {
                let residual = merged_residual(existing, *event, &audit_table);
                TriggerDefinition::new(schema, *event, &audit_table, residual)
            })
            .collect();

        Self {
            table: schema.table_name.clone(),
            drops,
            triggers,
        }
    }
}

impl fmt::Display for TriggerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for name in &self.drops {
            writeln!(f, "DROP TRIGGER IF EXISTS {};", quote_ident(name))?;
        }
        for trigger in &self.triggers {
            writeln!(f)?;
            write!(f, "{trigger}")?;
        }
        Ok(())
    }
}
