//! Audit table DDL.
//!
//! The audit table is a structural snapshot of the source table: every source
//! column keeps its name, raw type, nullability and default, followed by the
//! fixed audit columns.

use std::fmt;

use audit_core::{AuditNaming, TableSchema, AUDIT_COLUMNS};
use tracing::warn;

/// Column attributes from the catalog `EXTRA` field that must not be copied
/// to the audit table. The audit table owns its own auto column, and a
/// snapshot row must never change after it is written.
const NON_SNAPSHOT_EXTRAS: [&str; 5] = [
    "auto_increment",
    "default_generated",
    "on update",
    "virtual generated",
    "stored generated",
];

/// A column of the audit table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditTableColumn {
    pub name: String,
    pub declared_type: String,
    pub nullable: bool,
    pub default_value: Option<String>,
    /// The default is an expression (`DEFAULT_GENERATED` in the catalog)
    pub expression_default: bool,
    pub extra: String,
    pub comment: String,
    /// Set only for `audit_pk`
    pub surrogate_key: bool,
}

/// A secondary index of the audit table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditIndex {
    pub columns: Vec<String>,
}

/// Descriptor for `create table if not exists <audit_table>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditTable {
    pub source_table: String,
    pub name: String,
    pub columns: Vec<AuditTableColumn>,
    pub indexes: Vec<AuditIndex>,
}

impl AuditTable {
    /// Build the audit table descriptor for a source table.
    pub fn from_schema(schema: &TableSchema, naming: &AuditNaming) -> Self {
        let source = &schema.table_name;

        let mut columns: Vec<AuditTableColumn> = schema
            .columns
            .iter()
            .map(|c| AuditTableColumn {
                name: c.name.clone(),
                declared_type: c.declared_type.clone(),
                nullable: c.nullable,
                default_value: c.default_value.clone(),
                expression_default: c.extra.to_ascii_lowercase().contains("default_generated"),
                extra: snapshot_extra(&c.extra),
                comment: if c.is_primary_key {
                    format!("Primary key in source table {source}")
                } else {
                    c.comment.clone()
                },
                surrogate_key: false,
            })
            .collect();

        columns.extend(AUDIT_COLUMNS.iter().map(|c| AuditTableColumn {
            name: c.name.to_string(),
            declared_type: c.declared_type.to_string(),
            nullable: c.nullable,
            default_value: None,
            expression_default: false,
            extra: String::new(),
            comment: c.comment.to_string(),
            surrogate_key: c.is_surrogate_key(),
        }));

        let pk_columns: Vec<String> = schema
            .primary_key_columns()
            .map(|c| c.name.clone())
            .collect();
        if pk_columns.is_empty() {
            warn!("Table {source} has no primary key; audit table gets no source key index");
        }

        Self {
            source_table: source.clone(),
            name: naming.audit_table(source),
            columns,
            indexes: vec![
                AuditIndex {
                    columns: pk_columns,
                },
                AuditIndex {
                    columns: vec![AUDIT_COLUMNS[3].name.to_string()],
                },
            ],
        }
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// Drop the attributes in [`NON_SNAPSHOT_EXTRAS`] from a catalog `EXTRA` value.
fn snapshot_extra(extra: &str) -> String {
    let lowered = extra.to_ascii_lowercase();
    if NON_SNAPSHOT_EXTRAS.iter().any(|e| lowered.contains(e)) {
        // on update clauses carry an expression; drop everything from the
        // first rejected attribute onwards and keep what precedes it
        let cut = NON_SNAPSHOT_EXTRAS
            .iter()
            .filter_map(|e| lowered.find(e))
            .min()
            .unwrap_or(0);
        extra[..cut].trim().to_string()
    } else {
        extra.trim().to_string()
    }
}

/// Render a catalog default as a SQL literal.
///
/// `INFORMATION_SCHEMA.COLUMNS.COLUMN_DEFAULT` holds string defaults
/// unquoted, so only numbers, `NULL`, `CURRENT_TIMESTAMP`-style functions,
/// bit literals and parenthesized expressions pass through raw. Expression
/// defaults are reported without their parentheses (`curdate()`), so when
/// `expression` is set they are wrapped again.
fn default_literal(value: &str, expression: bool) -> String {
    let trimmed = value.trim();
    let lowered = trimmed.to_ascii_lowercase();
    let temporal = lowered.starts_with("current_timestamp")
        || lowered.starts_with("now(")
        || lowered.starts_with("localtime");
    if expression && !temporal && !trimmed.starts_with('(') {
        return format!("({trimmed})");
    }

    let raw = lowered == "null"
        || trimmed.parse::<f64>().is_ok()
        || temporal
        || lowered.starts_with("b'")
        || trimmed.starts_with('(');
    if raw {
        trimmed.to_string()
    } else {
        quote_string(value)
    }
}

pub(crate) fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub(crate) fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

impl fmt::Display for AuditTableColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {} {}", quote_ident(&self.name), self.declared_type)?;
        f.write_str(if self.nullable { " null" } else { " not null" })?;
        if let Some(default) = &self.default_value {
            write!(
                f,
                " default {}",
                default_literal(default, self.expression_default)
            )?;
        }
        if !self.extra.is_empty() {
            write!(f, " {}", self.extra)?;
        }
        if self.surrogate_key {
            f.write_str(" primary key auto_increment")?;
        }
        write!(f, " comment {}", quote_string(&self.comment))
    }
}

impl fmt::Display for AuditTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines: Vec<String> = self.columns.iter().map(|c| c.to_string()).collect();
        lines.extend(
            self.indexes
                .iter()
                .filter(|i| !i.columns.is_empty())
                .map(|i| {
                    let cols: Vec<String> = i.columns.iter().map(|c| quote_ident(c)).collect();
                    format!("  index ({})", cols.join(", "))
                }),
        );

        writeln!(f, "create table if not exists {} (", quote_ident(&self.name))?;
        writeln!(f, "{}", lines.join(",\n"))?;
        writeln!(f, ");")
    }
}
