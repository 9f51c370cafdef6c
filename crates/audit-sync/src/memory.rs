//! In-memory [`AuditStore`] for unit tests.

use std::collections::{BTreeMap, VecDeque};

use async_trait::async_trait;
use audit_core::{AuditError, AuditStore, Result, RowSink, SyncCursor, WipeWindow};

#[derive(Default)]
pub(crate) struct MemoryTable {
    pub columns: Vec<String>,
    /// Rows keyed by `audit_pk`, which is also their last value
    pub rows: BTreeMap<i64, Vec<Option<String>>>,
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    pub tables: BTreeMap<String, MemoryTable>,
    /// `audit_pk`s inserted into `users_audit` one per `window` call,
    /// simulating triggers firing while a wipe runs
    pub concurrent_inserts: VecDeque<i64>,
    pub fail_delete: bool,
    pub window_calls: usize,
    pub deletes: Vec<(i64, i64)>,
}

impl MemoryStore {
    pub const USERS_AUDIT_HEADER: &'static str = "id,name,audit_insert_timestamp,audit_update_timestamp,audit_delete_timestamp,audit_change_timestamp,audit_pk";

    pub fn with_users_audit(pks: &[i64]) -> Self {
        let mut store = Self::default();
        store.tables.insert(
            "users_audit".to_string(),
            MemoryTable {
                columns: Self::USERS_AUDIT_HEADER.split(',').map(str::to_string).collect(),
                rows: BTreeMap::new(),
            },
        );
        for pk in pks {
            store.insert_user_audit(*pk);
        }
        store
    }

    pub fn insert_user_audit(&mut self, pk: i64) {
        let ts = Some("2024-01-01 00:00:00".to_string());
        self.insert_row(
            "users_audit",
            vec![
                Some((pk % 3).to_string()),
                Some(format!("user{pk}")),
                ts.clone(),
                None,
                None,
                ts,
                Some(pk.to_string()),
            ],
        );
    }

    pub fn insert_row(&mut self, table: &str, values: Vec<Option<String>>) {
        let pk = values
            .last()
            .and_then(|v| v.as_deref())
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or_default();
        self.tables
            .entry(table.to_string())
            .or_default()
            .rows
            .insert(pk, values);
    }

    pub fn pks(&self, table: &str) -> Vec<i64> {
        self.tables
            .get(table)
            .map(|t| t.rows.keys().copied().collect())
            .unwrap_or_default()
    }

    fn table(&self, table: &str) -> Result<&MemoryTable> {
        self.tables
            .get(table)
            .ok_or_else(|| AuditError::query(format!("select from {table}"), "no such table"))
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn list_tables(&mut self) -> Result<Vec<String>> {
        Ok(self.tables.keys().cloned().collect())
    }

    async fn stream_rows_after(
        &mut self,
        audit_table: &str,
        cursor: SyncCursor,
        sink: &mut (dyn RowSink + Send),
    ) -> Result<u64> {
        let table = self.table(audit_table)?;
        sink.columns(&table.columns)?;

        let mut count = 0;
        for (_, row) in table
            .rows
            .iter()
            .filter(|(pk, _)| cursor.last_exported().map_or(true, |last| **pk > last))
        {
            sink.row(row)?;
            count += 1;
        }
        Ok(count)
    }

    async fn window(&mut self, audit_table: &str) -> Result<WipeWindow> {
        self.window_calls += 1;
        if let Some(pk) = self.concurrent_inserts.pop_front() {
            self.insert_user_audit(pk);
        }

        let table = self.table(audit_table)?;
        Ok(WipeWindow {
            count: table.rows.len() as u64,
            min: table.rows.keys().next().copied(),
            max: table.rows.keys().next_back().copied(),
        })
    }

    async fn delete_range(&mut self, audit_table: &str, from: i64, to: i64) -> Result<u64> {
        if self.fail_delete {
            return Err(AuditError::query(
                format!("delete from {audit_table}"),
                "lock wait timeout exceeded",
            ));
        }
        self.deletes.push((from, to));
        if from >= to {
            return Ok(0);
        }

        let table = self
            .tables
            .get_mut(audit_table)
            .ok_or_else(|| AuditError::query(format!("delete from {audit_table}"), "no such table"))?;
        let doomed: Vec<i64> = table.rows.range(from..to).map(|(pk, _)| *pk).collect();
        for pk in &doomed {
            table.rows.remove(pk);
        }
        Ok(doomed.len() as u64)
    }
}
