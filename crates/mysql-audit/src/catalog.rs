//! `INFORMATION_SCHEMA` reader for the generator.

use async_trait::async_trait;
use audit_core::{AuditError, Catalog, ColumnDef, ExistingTrigger, Result, TriggerEvent};
use mysql_async::prelude::*;
use tracing::debug;

use crate::client::MySqlSession;

type ColumnRow = (String, String, String, String, Option<String>, String, String);

/// Reads table, column and trigger definitions of the selected schema.
pub struct MySqlCatalog {
    session: MySqlSession,
}

impl MySqlCatalog {
    pub fn new(session: MySqlSession) -> Self {
        Self { session }
    }

    pub fn into_session(self) -> MySqlSession {
        self.session
    }
}

#[async_trait]
impl Catalog for MySqlCatalog {
    async fn list_tables(&mut self) -> Result<Vec<String>> {
        self.session.list_tables().await
    }

    async fn describe_table(&mut self, table: &str) -> Result<Vec<ColumnDef>> {
        let sql = "SELECT COLUMN_NAME, COLUMN_TYPE, IS_NULLABLE, COLUMN_KEY,
                          COLUMN_DEFAULT, EXTRA, COLUMN_COMMENT
                   FROM INFORMATION_SCHEMA.COLUMNS
                   WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
                   ORDER BY ORDINAL_POSITION";
        let database = self.session.database().to_string();
        let rows: Vec<ColumnRow> = self
            .session
            .conn()
            .exec(sql, (database.as_str(), table))
            .await
            .map_err(|e| AuditError::query(sql, e))?;

        if rows.is_empty() {
            return Err(AuditError::Catalog(format!(
                "table {table} has no columns in {database}"
            )));
        }
        debug!("Read {} columns of {table}", rows.len());

        Ok(rows
            .into_iter()
            .map(
                |(name, declared_type, nullable, key, default_value, extra, comment)| ColumnDef {
                    name,
                    declared_type,
                    nullable: nullable.eq_ignore_ascii_case("YES"),
                    is_primary_key: key == "PRI",
                    default_value,
                    extra,
                    comment,
                },
            )
            .collect())
    }

    async fn after_triggers(&mut self, table: &str) -> Result<Vec<ExistingTrigger>> {
        let sql = "SELECT TRIGGER_NAME, EVENT_MANIPULATION, ACTION_STATEMENT
                   FROM INFORMATION_SCHEMA.TRIGGERS
                   WHERE EVENT_OBJECT_SCHEMA = ? AND EVENT_OBJECT_TABLE = ?
                   AND ACTION_TIMING = 'AFTER'
                   ORDER BY FIELD(EVENT_MANIPULATION, 'INSERT', 'UPDATE', 'DELETE'), ACTION_ORDER";
        let database = self.session.database().to_string();
        let rows: Vec<(String, String, String)> = self
            .session
            .conn()
            .exec(sql, (database.as_str(), table))
            .await
            .map_err(|e| AuditError::query(sql, e))?;

        rows.into_iter()
            .map(|(name, event, body)| {
                let event: TriggerEvent = event.parse()?;
                debug!("Found existing trigger {name} AFTER {event} on {table}");
                Ok(ExistingTrigger::new(name, event, body))
            })
            .collect()
    }
}
