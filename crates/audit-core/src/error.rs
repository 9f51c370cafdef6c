//! Error types shared by every cdc-audit crate.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the cdc-audit crates.
pub type Result<T, E = AuditError> = std::result::Result<T, E>;

/// Errors that can stop a generation or sync run.
///
/// None of these are retried: the first error aborts processing of the
/// remaining tables.
#[derive(Error, Debug)]
pub enum AuditError {
    /// Cannot reach or authenticate to the database server.
    #[error("Unable to connect to database: {0}")]
    Connection(String),

    /// The named schema cannot be selected.
    #[error("Unable to select database '{database}': {reason}")]
    Schema { database: String, reason: String },

    /// A file or directory could not be created, read or written.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV record could not be written or parsed.
    #[error("CSV error on {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A CSV file holds exported rows but its cursor cannot be read back.
    #[error("Cannot resume export to {}: {reason}", path.display())]
    Resume { path: PathBuf, reason: String },

    /// A DDL, DML or SELECT statement failed.
    #[error("Query failed: {statement}: {reason}")]
    Query { statement: String, reason: String },

    /// The catalog returned data we cannot interpret.
    #[error("Unexpected catalog data: {0}")]
    Catalog(String),
}

impl AuditError {
    /// Build an [`AuditError::Io`] for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build an [`AuditError::Csv`] for the given path.
    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    /// Build an [`AuditError::Query`] from any displayable driver error.
    pub fn query(statement: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Query {
            statement: statement.into(),
            reason: reason.to_string(),
        }
    }
}
