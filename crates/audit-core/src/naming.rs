//! Naming conventions shared by the generator and the sync engine.
//!
//! The generator recognizes its own previously injected statements by the
//! audit table name, so both sides must derive it from this one place.

/// Suffix every audit table name carries.
pub const AUDIT_SUFFIX: &str = "_audit";

const SQL_FILE_SUFFIX: &str = ".audit.sql";
const CSV_FILE_SUFFIX: &str = ".csv";

/// Prefix-aware mapping from source table names to generated artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditNaming {
    prefix: String,
}

impl AuditNaming {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `<prefix><table>_audit`
    pub fn audit_table(&self, table: &str) -> String {
        format!("{}{table}{AUDIT_SUFFIX}", self.prefix)
    }

    /// `<prefix><table>.audit.sql`
    pub fn sql_file(&self, table: &str) -> String {
        format!("{}{table}{SQL_FILE_SUFFIX}", self.prefix)
    }

    /// Source table a generated SQL file belongs to, if the file name is one
    /// of ours (carries this prefix and the `.audit.sql` suffix).
    pub fn table_for_sql_file<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        file_name
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(SQL_FILE_SUFFIX)
            .filter(|t| !t.is_empty())
    }

    /// `<audit_table>.csv`
    pub fn csv_file(&self, audit_table: &str) -> String {
        format!("{audit_table}{CSV_FILE_SUFFIX}")
    }

    /// Whether a table name follows the audit naming convention for this prefix.
    pub fn is_audit_table(&self, table: &str) -> bool {
        table.starts_with(self.prefix.as_str()) && table.ends_with(AUDIT_SUFFIX)
    }
}

/// Whether a table looks like an audit table under any prefix.
///
/// Used by the generator to avoid auditing audit tables.
pub fn looks_like_audit_table(table: &str) -> bool {
    table.contains(AUDIT_SUFFIX)
}
