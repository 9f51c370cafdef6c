//! Log subscriber setup.

use std::fs::File;
use std::sync::Mutex;

use anyhow::Context;
use tracing::Subscriber;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use crate::LogOpts;

/// Default filter directive for a `--verbosity` level.
pub fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "error",
        1 => "warn",
        2 => "info",
        _ => "debug",
    }
}

/// Build the fmt subscriber for the given options.
///
/// `RUST_LOG`, when set, takes precedence over `--verbosity`. At verbosity 3
/// every record carries its source file and line. With `--output` the file
/// is truncated and written without ANSI colors.
pub fn subscriber(opts: &LogOpts) -> anyhow::Result<impl Subscriber + Send + Sync> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for_verbosity(opts.verbosity)));
    let with_location = opts.verbosity >= 3;

    let (writer, ansi) = match &opts.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Could not open {} for writing", path.display()))?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stdout), true),
    };

    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(with_location)
        .with_line_number(with_location)
        .with_ansi(ansi)
        .with_writer(writer)
        .finish())
}

/// Install the subscriber globally.
pub fn init(opts: &LogOpts) -> anyhow::Result<()> {
    tracing::subscriber::set_global_default(subscriber(opts)?)
        .context("Failed to install log subscriber")
}
