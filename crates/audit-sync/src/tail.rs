//! Reading the last CSV record of a file without reading the whole file.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use audit_core::{AuditError, Result};

const CHUNK_SIZE: u64 = 4096;

/// Upper bound on the length of the record [`last_record`] will return.
pub const MAX_RECORD_BYTES: usize = 1 << 20;

/// The raw text of the last CSV record of `reader`.
///
/// A record ends at a newline outside double quotes, so a quoted field with
/// embedded line breaks stays part of its record. Trailing line terminators
/// (`\n` or `\r\n`) are ignored, so `"a\nb"` and `"a\nb\n"` both yield `"b"`.
/// An empty input yields an empty string.
///
/// Reads backwards from the end in fixed-size chunks and fails with
/// `InvalidData` if the record exceeds [`MAX_RECORD_BYTES`].
pub fn last_record<R: Read + Seek>(reader: &mut R) -> io::Result<String> {
    let mut pos = reader.seek(SeekFrom::End(0))?;
    let mut tail: Vec<u8> = Vec::new();

    while pos > 0 {
        let start = pos.saturating_sub(CHUNK_SIZE);
        let mut chunk = vec![0u8; (pos - start) as usize];
        reader.seek(SeekFrom::Start(start))?;
        reader.read_exact(&mut chunk)?;
        chunk.extend_from_slice(&tail);
        tail = chunk;
        pos = start;

        let Some(end) = content_end(&tail) else {
            // nothing but line terminators so far
            continue;
        };
        if let Some(record) = record_start(&tail[..end]) {
            return Ok(String::from_utf8_lossy(&tail[record..end]).into_owned());
        }
        if end > MAX_RECORD_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("last record exceeds {MAX_RECORD_BYTES} bytes"),
            ));
        }
    }

    let end = content_end(&tail).unwrap_or(0);
    Ok(String::from_utf8_lossy(&tail[..end]).into_owned())
}

/// Index just past the last byte that is not a line terminator.
fn content_end(bytes: &[u8]) -> Option<usize> {
    bytes
        .iter()
        .rposition(|b| *b != b'\n' && *b != b'\r')
        .map(|i| i + 1)
}

/// Start of the last record in `bytes`, which must end outside quotes.
///
/// Escaped quotes are doubled, so a newline is a record boundary exactly
/// when an even number of quotes follows it.
fn record_start(bytes: &[u8]) -> Option<usize> {
    let mut quotes = 0usize;
    for (i, b) in bytes.iter().enumerate().rev() {
        match b {
            b'"' => quotes += 1,
            b'\n' if quotes % 2 == 0 => return Some(i + 1),
            _ => {}
        }
    }
    None
}

/// The last record of the file at `path`, or `None` if the file does not exist.
pub fn read_last_record(path: &Path) -> Result<Option<String>> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(AuditError::io(path, e)),
    };
    last_record(&mut file)
        .map(Some)
        .map_err(|e| AuditError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn last(s: &str) -> String {
        last_record(&mut Cursor::new(s.as_bytes().to_vec())).unwrap()
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(last(""), "");
        assert_eq!(last("\n"), "");
        assert_eq!(last("\r\n\r\n"), "");
    }

    #[test]
    fn test_single_line_without_trailing_newline() {
        assert_eq!(last("a,b,c"), "a,b,c");
    }

    #[test]
    fn test_single_line_with_trailing_newline() {
        assert_eq!(last("a,b,c\n"), "a,b,c");
        assert_eq!(last("a,b,c\r\n"), "a,b,c");
    }

    #[test]
    fn test_many_lines() {
        assert_eq!(last("h1,h2\n1,2\n3,4\n"), "3,4");
        assert_eq!(last("h1,h2\n1,2\n3,4"), "3,4");
        assert_eq!(last("h1,h2\r\n1,2\r\n3,4\r\n"), "3,4");
        assert_eq!(last("h1\n\n\n"), "h1");
    }

    #[test]
    fn test_line_spanning_chunks() {
        let long = "x".repeat(CHUNK_SIZE as usize * 3 + 17);
        let content = format!("first\n{long}\n");
        assert_eq!(last(&content), long);

        let only = "y".repeat(CHUNK_SIZE as usize + 1);
        assert_eq!(last(&only), only);
    }

    #[test]
    fn test_newline_exactly_at_chunk_boundary() {
        let head = "z".repeat(CHUNK_SIZE as usize - 1);
        let content = format!("{head}\nlast-line");
        assert_eq!(last(&content), "last-line");
    }

    #[test]
    fn test_quoted_newlines_stay_in_the_record() {
        assert_eq!(
            last("h1,h2\n1,\"two\nlines\"\n2,\"ends with newline\n\",3\n"),
            "2,\"ends with newline\n\",3"
        );
        assert_eq!(last("h\n\"a\nb\nc\",1"), "\"a\nb\nc\",1");
        assert_eq!(last("h\n1,\"say \"\"hi\"\"\n\",2\n"), "1,\"say \"\"hi\"\"\n\",2");
    }

    #[test]
    fn test_quoted_record_spanning_chunks() {
        let long = "q\n".repeat(CHUNK_SIZE as usize);
        let record = format!("9,\"{long}\",9");
        assert_eq!(last(&format!("h\n1,x,1\n{record}\n")), record);
    }

    #[test]
    fn test_overlong_line_is_rejected() {
        let content = "x".repeat(MAX_RECORD_BYTES + CHUNK_SIZE as usize * 2);
        let err = last_record(&mut Cursor::new(content.into_bytes())).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_read_last_record_missing_file() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(read_last_record(&tmp.path().join("missing.csv")).unwrap(), None);

        let path = tmp.path().join("present.csv");
        std::fs::write(&path, "a\nb\n").unwrap();
        assert_eq!(read_last_record(&path).unwrap(), Some("b".to_string()));
    }
}
