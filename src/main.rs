//! Command-line interface for cdc-audit
//!
//! # Usage Examples
//!
//! ## Generate
//! ```bash
//! # Audit scripts for every table of `shop`
//! cdc-audit gen --database shop --user app --password secret
//!
//! # Only two tables, with a namespace prefix on the generated files
//! cdc-audit gen --database shop --tables users,orders --namespace-prefix shop_
//! ```
//!
//! ## Sync
//! ```bash
//! # Append new audit rows to ./cdc_audit_sync/<table>_audit.csv
//! cdc-audit sync --database shop
//!
//! # Sync, then delete exported rows 500 at a time
//! cdc-audit sync --database shop --wipe --wipe-batch-size 500 --wipe-pause 250ms
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use audit_core::AuditNaming;
use audit_gen::{run_generate, GenerateConfig};
use audit_sync::{run_sync, SyncConfig, WipeConfig};
use cdc_audit::config::parse_duration;
use cdc_audit::{logging, table_filter, LogOpts, MySqlOpts};
use clap::{Parser, Subcommand};
use mysql_audit::{connect, ConnectOpts, MySqlAuditStore, MySqlCatalog};
use tracing::debug;

#[derive(Parser)]
#[command(name = "cdc-audit")]
#[command(about = "Audit table generation and CSV sync for MySQL change data capture")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate audit table and trigger scripts, one file per table
    Gen {
        #[command(flatten)]
        mysql: MySqlOpts,

        /// Comma separated source tables (default: all tables)
        #[arg(long, short = 't', value_delimiter = ',')]
        tables: Vec<String>,

        /// Prefix prepended to audit table and file names
        #[arg(long, short = 'n', default_value = "")]
        namespace_prefix: String,

        /// Directory to write the `.audit.sql` files to
        #[arg(long, short = 'm', default_value = "./cdc_audit_gen")]
        output_dir: PathBuf,

        #[command(flatten)]
        log: LogOpts,
    },

    /// Export new audit rows to CSV, optionally wiping them afterwards
    Sync {
        #[command(flatten)]
        mysql: MySqlOpts,

        /// Comma separated audit tables (default: all `<prefix>*_audit` tables)
        #[arg(long, short = 't', value_delimiter = ',')]
        tables: Vec<String>,

        /// Prefix the audit tables were generated with
        #[arg(long, short = 'n', default_value = "")]
        namespace_prefix: String,

        /// Directory holding the `.csv` files
        #[arg(long, short = 'm', default_value = "./cdc_audit_sync")]
        output_dir: PathBuf,

        /// Delete exported rows from each audit table, keeping the newest
        #[arg(long, short = 'w')]
        wipe: bool,

        /// Width of each deleted `audit_pk` range
        #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u32).range(1..))]
        wipe_batch_size: u32,

        /// Pause between delete batches, e.g. "500ms", "1s", "2m"
        #[arg(long, default_value = "1s", value_parser = parse_duration)]
        wipe_pause: Duration,

        #[command(flatten)]
        log: LogOpts,
    },
}

impl Commands {
    fn log_opts(&self) -> &LogOpts {
        match self {
            Commands::Gen { log, .. } | Commands::Sync { log, .. } => log,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let logs_to_file = cli.command.log_opts().output.is_some();

    if let Err(e) = run(cli).await {
        // stdout logging would only repeat what stderr gets
        if logs_to_file {
            tracing::error!("{e:#}");
        }
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Gen {
            mysql,
            tables,
            namespace_prefix,
            output_dir,
            log,
        } => {
            logging::init(&log)?;
            let config = GenerateConfig {
                output_dir,
                tables: table_filter(&tables),
                naming: AuditNaming::new(namespace_prefix),
            };
            run_gen_command(ConnectOpts::from(&mysql), config).await
        }
        Commands::Sync {
            mysql,
            tables,
            namespace_prefix,
            output_dir,
            wipe,
            wipe_batch_size,
            wipe_pause,
            log,
        } => {
            logging::init(&log)?;
            let config = SyncConfig {
                output_dir,
                tables: table_filter(&tables),
                naming: AuditNaming::new(namespace_prefix),
                wipe: wipe.then_some(WipeConfig {
                    batch_size: wipe_batch_size,
                    pause: wipe_pause,
                }),
            };
            run_sync_command(ConnectOpts::from(&mysql), config).await
        }
    }
}

async fn run_gen_command(opts: ConnectOpts, config: GenerateConfig) -> anyhow::Result<()> {
    let session = connect(&opts)
        .await
        .with_context(|| format!("Failed to open database {}", opts.database))?;
    let mut catalog = MySqlCatalog::new(session);

    let report = run_generate(&mut catalog, &config)
        .await
        .context("Audit generation failed")?;
    catalog.into_session().disconnect().await?;

    debug!(
        "{} stale scripts pruned, {} tables skipped",
        report.pruned.len(),
        report.skipped.len()
    );
    Ok(())
}

async fn run_sync_command(opts: ConnectOpts, config: SyncConfig) -> anyhow::Result<()> {
    let session = connect(&opts)
        .await
        .with_context(|| format!("Failed to open database {}", opts.database))?;
    let mut store = MySqlAuditStore::new(session);

    run_sync(&mut store, &config)
        .await
        .context("Audit sync failed")?;
    store.into_session().disconnect().await?;
    Ok(())
}
