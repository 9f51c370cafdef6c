//! Appending new audit rows to a table's CSV file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use audit_core::{AuditError, AuditStore, Result, RowSink, SyncCursor};
use tracing::{debug, info};

use crate::cursor::read_cursor;

const BUFFER_SIZE: usize = 64 * 1024;

/// Outcome of exporting one audit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportReport {
    pub cursor: SyncCursor,
    pub rows: u64,
}

/// Export every row of `audit_table` newer than the CSV's cursor.
///
/// On a fresh export the file is created (or a header-only file rewritten)
/// and starts with a header row; otherwise rows are appended. A file that
/// already holds exported rows is never truncated: if its cursor cannot be
/// read back the export fails with [`AuditError::Resume`].
pub async fn export_table<S: AuditStore + ?Sized>(
    store: &mut S,
    audit_table: &str,
    path: &Path,
) -> Result<ExportReport> {
    let cursor = read_cursor(path)?;
    info!("Exporting {audit_table} to {} ({cursor})", path.display());

    let file = open_destination(path, cursor)?;
    let mut sink = CsvSink::new(file, path, cursor.is_fresh());
    let rows = store.stream_rows_after(audit_table, cursor, &mut sink).await?;
    sink.finish()?;

    info!("Exported {rows} rows from {audit_table}");
    Ok(ExportReport { cursor, rows })
}

fn open_destination(path: &Path, cursor: SyncCursor) -> Result<File> {
    if cursor.is_fresh() {
        if has_exported_rows(path)? {
            return Err(AuditError::Resume {
                path: path.to_path_buf(),
                reason: "file holds exported rows but its last record has no audit_pk".to_string(),
            });
        }
        return File::create(path).map_err(|e| AuditError::io(path, e));
    }

    open_for_append(path).map_err(|e| AuditError::io(path, e))
}

/// Whether the CSV at `path` has any record after its header.
fn has_exported_rows(path: &Path) -> Result<bool> {
    let mut reader = match csv::ReaderBuilder::new().flexible(true).from_path(path) {
        Ok(reader) => reader,
        Err(e) => match e.kind() {
            csv::ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                return Ok(false)
            }
            _ => return Err(AuditError::csv(path, e)),
        },
    };
    match reader.records().next() {
        None => Ok(false),
        Some(Ok(_)) => Ok(true),
        Some(Err(e)) => Err(AuditError::csv(path, e)),
    }
}

fn open_for_append(path: &Path) -> std::io::Result<File> {
    let mut file = OpenOptions::new().read(true).append(true).open(path)?;
    // a file edited by hand may have lost its final newline
    let len = file.seek(SeekFrom::End(0))?;
    if len > 0 {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1))?;
        file.read_exact(&mut last)?;
        if last[0] != b'\n' {
            file.write_all(b"\n")?;
        }
    }
    Ok(file)
}

/// Writes streamed rows as CSV records.
struct CsvSink {
    writer: csv::Writer<BufWriter<File>>,
    path: PathBuf,
    write_header: bool,
}

impl CsvSink {
    fn new(file: File, path: &Path, write_header: bool) -> Self {
        let writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(BufWriter::with_capacity(BUFFER_SIZE, file));
        Self {
            writer,
            path: path.to_path_buf(),
            write_header,
        }
    }

    fn finish(mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| AuditError::io(&self.path, e))
    }
}

impl RowSink for CsvSink {
    fn columns(&mut self, names: &[String]) -> Result<()> {
        if self.write_header {
            debug!("Writing header to {}", self.path.display());
            self.writer
                .write_record(names)
                .map_err(|e| AuditError::csv(&self.path, e))?;
        }
        Ok(())
    }

    fn row(&mut self, values: &[Option<String>]) -> Result<()> {
        self.writer
            .write_record(values.iter().map(|v| v.as_deref().unwrap_or("")))
            .map_err(|e| AuditError::csv(&self.path, e))
    }
}
