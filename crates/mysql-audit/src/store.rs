//! Audit table reads and deletes for the sync engine.

use async_trait::async_trait;
use audit_core::{
    AuditError, AuditStore, Result, RowSink, SyncCursor, WipeWindow, AUDIT_PK_COLUMN,
};
use mysql_async::{prelude::*, Value};
use tracing::debug;

use crate::client::MySqlSession;

/// [`AuditStore`] over a live MySQL session.
pub struct MySqlAuditStore {
    session: MySqlSession,
}

impl MySqlAuditStore {
    pub fn new(session: MySqlSession) -> Self {
        Self { session }
    }

    pub fn into_session(self) -> MySqlSession {
        self.session
    }

    async fn column_names(&mut self, table: &str) -> Result<Vec<String>> {
        let sql = "SELECT COLUMN_NAME FROM INFORMATION_SCHEMA.COLUMNS
                   WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
                   ORDER BY ORDINAL_POSITION";
        let database = self.session.database().to_string();
        let names: Vec<String> = self
            .session
            .conn()
            .exec(sql, (database.as_str(), table))
            .await
            .map_err(|e| AuditError::query(sql, e))?;

        if names.is_empty() {
            return Err(AuditError::Catalog(format!(
                "table {table} has no columns in {database}"
            )));
        }
        Ok(names)
    }
}

#[async_trait]
impl AuditStore for MySqlAuditStore {
    async fn list_tables(&mut self) -> Result<Vec<String>> {
        self.session.list_tables().await
    }

    async fn stream_rows_after(
        &mut self,
        audit_table: &str,
        cursor: SyncCursor,
        sink: &mut (dyn RowSink + Send),
    ) -> Result<u64> {
        let columns = self.column_names(audit_table).await?;
        sink.columns(&columns)?;

        let select_list = columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!("select {select_list} from {}", quote_ident(audit_table));
        if let Some(last) = cursor.last_exported() {
            sql.push_str(&format!(" where {AUDIT_PK_COLUMN} > {last}"));
        }
        sql.push_str(&format!(" order by {AUDIT_PK_COLUMN}"));
        debug!("{sql}");

        let mut result = self
            .session
            .conn()
            .query_iter(sql.as_str())
            .await
            .map_err(|e| AuditError::query(&sql, e))?;

        let mut count = 0u64;
        let mut values = Vec::with_capacity(columns.len());
        while let Some(row) = result.next().await.map_err(|e| AuditError::query(&sql, e))? {
            values.clear();
            values.extend((0..row.len()).map(|i| row.as_ref(i).and_then(value_to_string)));
            sink.row(&values)?;
            count += 1;
        }
        Ok(count)
    }

    async fn window(&mut self, audit_table: &str) -> Result<WipeWindow> {
        let sql = format!(
            "select count(*), min({AUDIT_PK_COLUMN}), max({AUDIT_PK_COLUMN}) from {}",
            quote_ident(audit_table)
        );
        let stats: Option<(u64, Option<i64>, Option<i64>)> = self
            .session
            .conn()
            .query_first(sql.as_str())
            .await
            .map_err(|e| AuditError::query(&sql, e))?;

        Ok(match stats {
            Some((count, min, max)) => WipeWindow { count, min, max },
            None => WipeWindow::default(),
        })
    }

    async fn delete_range(&mut self, audit_table: &str, from: i64, to: i64) -> Result<u64> {
        let sql = format!(
            "delete from {} where {AUDIT_PK_COLUMN} >= ? and {AUDIT_PK_COLUMN} < ?",
            quote_ident(audit_table)
        );
        let conn = self.session.conn();
        conn.exec_drop(sql.as_str(), (from, to))
            .await
            .map_err(|e| AuditError::query(&sql, e))?;
        Ok(conn.affected_rows())
    }
}

fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Text form of a column value; `None` for SQL NULL.
fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::NULL => None,
        Value::Bytes(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        Value::Int(v) => Some(v.to_string()),
        Value::UInt(v) => Some(v.to_string()),
        Value::Float(v) => Some(v.to_string()),
        Value::Double(v) => Some(v.to_string()),
        Value::Date(year, month, day, hour, minute, second, micros) => {
            let mut s =
                format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}");
            if *micros > 0 {
                s.push_str(&format!(".{micros:06}"));
            }
            Some(s)
        }
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if *negative { "-" } else { "" };
            let hours = u64::from(*days) * 24 + u64::from(*hours);
            let mut s = format!("{sign}{hours:02}:{minutes:02}:{seconds:02}");
            if *micros > 0 {
                s.push_str(&format!(".{micros:06}"));
            }
            Some(s)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&Value::NULL), None);
        assert_eq!(
            value_to_string(&Value::Bytes(b"O'Brien".to_vec())),
            Some("O'Brien".to_string())
        );
        assert_eq!(value_to_string(&Value::Int(-5)), Some("-5".to_string()));
        assert_eq!(value_to_string(&Value::UInt(7)), Some("7".to_string()));
        assert_eq!(
            value_to_string(&Value::Date(2024, 1, 2, 3, 4, 5, 0)),
            Some("2024-01-02 03:04:05".to_string())
        );
        assert_eq!(
            value_to_string(&Value::Date(2024, 1, 2, 3, 4, 5, 120)),
            Some("2024-01-02 03:04:05.000120".to_string())
        );
        assert_eq!(
            value_to_string(&Value::Time(true, 1, 2, 0, 30, 0)),
            Some("-26:00:30".to_string())
        );
    }

    #[test]
    fn test_quote_ident_escapes_backticks() {
        assert_eq!(quote_ident("users_audit"), "`users_audit`");
        assert_eq!(quote_ident("we`ird"), "`we``ird`");
    }
}
