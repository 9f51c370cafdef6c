//! cdc-audit
//!
//! Change data capture for MySQL through audit tables.
//!
//! - `cdc-audit gen` reads the catalog and writes one `.audit.sql` script per
//!   table. Each script creates `<table>_audit` and AFTER INSERT/UPDATE/DELETE
//!   triggers that copy every change into it, keeping any hand-written trigger
//!   logic already on the table.
//! - `cdc-audit sync` appends new audit rows to one CSV file per audit table,
//!   resuming from the last `audit_pk` in the file, and can then wipe the
//!   exported rows in small batches.
//!
//! # CLI Usage
//!
//! ```bash
//! # Generate scripts for two tables and apply them
//! cdc-audit gen --database shop --tables users,orders
//! cat cdc_audit_gen/*.audit.sql | mysql shop
//!
//! # Export audit rows, then trim the audit tables
//! cdc-audit sync --database shop --wipe --wipe-pause 500ms
//! ```

use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::Parser;
use mysql_audit::ConnectOpts;

pub mod config;
pub mod logging;

#[derive(Parser, Clone, Debug)]
pub struct MySqlOpts {
    /// MySQL server host
    #[arg(long, default_value = "localhost", env = "MYSQL_HOST")]
    pub host: String,

    /// MySQL server port
    #[arg(long, default_value_t = 3306, env = "MYSQL_PORT")]
    pub port: u16,

    /// MySQL username
    #[arg(long, default_value = "root", env = "MYSQL_USER")]
    pub user: String,

    /// MySQL password
    #[arg(long, default_value = "", env = "MYSQL_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Database holding the source and audit tables
    #[arg(long, env = "MYSQL_DATABASE")]
    pub database: String,
}

impl From<&MySqlOpts> for ConnectOpts {
    fn from(opts: &MySqlOpts) -> Self {
        Self {
            host: opts.host.clone(),
            port: opts.port,
            user: opts.user.clone(),
            password: opts.password.clone(),
            database: opts.database.clone(),
        }
    }
}

#[derive(Parser, Clone, Debug)]
pub struct LogOpts {
    /// Verbosity level: 0 = errors only, 1 = warnings, 2 = informational,
    /// 3 = debug with source line numbers
    #[arg(long, short = 'v', default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=3))]
    pub verbosity: u8,

    /// Send all log output to this file instead of stdout
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Turn a `--tables` list into a filter; empty means no filter.
pub fn table_filter(tables: &[String]) -> Option<BTreeSet<String>> {
    let set: BTreeSet<String> = tables
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    if set.is_empty() {
        None
    } else {
        Some(set)
    }
}
