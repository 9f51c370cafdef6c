//! Source table metadata and the fixed audit column set.
//!
//! Everything here is read once from the catalog at the start of a run and
//! never mutated afterwards.

use std::fmt;
use std::str::FromStr;

use crate::error::AuditError;

/// A single column of a source table, as described by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    /// Raw SQL type, e.g. `varchar(50)` or `int(10) unsigned`
    pub declared_type: String,
    pub nullable: bool,
    pub is_primary_key: bool,
    pub default_value: Option<String>,
    /// Catalog `EXTRA` attributes, e.g. `auto_increment`
    pub extra: String,
    pub comment: String,
}

impl ColumnDef {
    /// Create a nullable, non-key column with no default, extra or comment.
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            nullable: true,
            is_primary_key: false,
            default_value: None,
            extra: String::new(),
            comment: String::new(),
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = extra.into();
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

/// A source table and its columns in catalog (ordinal) order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    pub fn new(table_name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        Self {
            table_name: table_name.into(),
            columns,
        }
    }

    /// Primary key columns in their original order.
    ///
    /// Empty when the table has no primary key.
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| c.is_primary_key)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// Row-level event a trigger fires on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TriggerEvent {
    Insert,
    Update,
    Delete,
}

impl TriggerEvent {
    /// All events in the order triggers are generated.
    pub const ALL: [TriggerEvent; 3] = [
        TriggerEvent::Insert,
        TriggerEvent::Update,
        TriggerEvent::Delete,
    ];

    /// Uppercase SQL keyword, e.g. `INSERT`.
    pub fn keyword(&self) -> &'static str {
        match self {
            TriggerEvent::Insert => "INSERT",
            TriggerEvent::Update => "UPDATE",
            TriggerEvent::Delete => "DELETE",
        }
    }

    /// Lowercase suffix used in generated trigger names, e.g. `insert`.
    pub fn suffix(&self) -> &'static str {
        match self {
            TriggerEvent::Insert => "insert",
            TriggerEvent::Update => "update",
            TriggerEvent::Delete => "delete",
        }
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for TriggerEvent {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "insert" => Ok(TriggerEvent::Insert),
            "update" => Ok(TriggerEvent::Update),
            "delete" => Ok(TriggerEvent::Delete),
            other => Err(AuditError::Catalog(format!(
                "unknown trigger event: {other}"
            ))),
        }
    }
}

/// An AFTER trigger currently defined on a source table.
///
/// May be hand-written, or generated by a previous run of this tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingTrigger {
    pub name: String,
    pub event: TriggerEvent,
    pub action_body: String,
}

impl ExistingTrigger {
    pub fn new(name: impl Into<String>, event: TriggerEvent, action_body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            event,
            action_body: action_body.into(),
        }
    }
}

/// One of the synthetic columns appended to every audit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditColumn {
    pub name: &'static str,
    pub declared_type: &'static str,
    pub nullable: bool,
    pub comment: &'static str,
}

/// Name of the audit table's surrogate key. Always the last audit column.
pub const AUDIT_PK_COLUMN: &str = "audit_pk";

/// The fixed audit columns, in the order they are appended.
pub const AUDIT_COLUMNS: [AuditColumn; 5] = [
    AuditColumn {
        name: "audit_insert_timestamp",
        declared_type: "timestamp",
        nullable: true,
        comment: "Will be non-null when the record is inserted into source table",
    },
    AuditColumn {
        name: "audit_update_timestamp",
        declared_type: "timestamp",
        nullable: true,
        comment: "Will be non-null when the record is updated in source table",
    },
    AuditColumn {
        name: "audit_delete_timestamp",
        declared_type: "timestamp",
        nullable: true,
        comment: "Will be non-null when the record is deleted in source table",
    },
    AuditColumn {
        name: "audit_change_timestamp",
        declared_type: "timestamp",
        nullable: false,
        comment: "Always non-null. Updated when record is inserted, updated or deleted in source table",
    },
    AuditColumn {
        name: AUDIT_PK_COLUMN,
        declared_type: "bigint",
        nullable: false,
        comment: "Audit table primary key, useful for sorting since mysql time data types are only granular to second level.",
    },
];

impl AuditColumn {
    /// The audit timestamp column that is set to the current time for `event`.
    pub fn event_timestamp(event: TriggerEvent) -> &'static AuditColumn {
        match event {
            TriggerEvent::Insert => &AUDIT_COLUMNS[0],
            TriggerEvent::Update => &AUDIT_COLUMNS[1],
            TriggerEvent::Delete => &AUDIT_COLUMNS[2],
        }
    }

    pub fn change_timestamp() -> &'static AuditColumn {
        &AUDIT_COLUMNS[3]
    }

    pub fn is_surrogate_key(&self) -> bool {
        self.name == AUDIT_PK_COLUMN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_event_parse_is_case_insensitive() {
        assert_eq!("INSERT".parse::<TriggerEvent>().unwrap(), TriggerEvent::Insert);
        assert_eq!("update".parse::<TriggerEvent>().unwrap(), TriggerEvent::Update);
        assert_eq!(" Delete ".parse::<TriggerEvent>().unwrap(), TriggerEvent::Delete);
        assert!("truncate".parse::<TriggerEvent>().is_err());
    }

    #[test]
    fn test_audit_columns_order() {
        let names: Vec<&str> = AUDIT_COLUMNS.iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            vec![
                "audit_insert_timestamp",
                "audit_update_timestamp",
                "audit_delete_timestamp",
                "audit_change_timestamp",
                "audit_pk",
            ]
        );
        assert!(AUDIT_COLUMNS[4].is_surrogate_key());
        assert!(!AuditColumn::change_timestamp().nullable);
    }

    #[test]
    fn test_primary_key_columns_keep_order() {
        let schema = TableSchema::new(
            "order_items",
            vec![
                ColumnDef::new("order_id", "int").primary_key(),
                ColumnDef::new("qty", "int"),
                ColumnDef::new("item_id", "int").primary_key(),
            ],
        );
        let pks: Vec<&str> = schema.primary_key_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(pks, vec!["order_id", "item_id"]);
    }
}
