// TailPane - app/reader.rs
//
// Incremental source reading: each poll tick asks a reader for the lines
// appended to its source since the last tick.
//
// Encoding: new bytes are decoded as lossy UTF-8.  UTF-16 encoded files
// (Windows system logs) are generally not appended line-by-line by the OS,
// so this limitation is acceptable and documented.
//
// Robustness:
//   - Truncated/rotated files (size < last offset) are handled by resetting
//     the offset to 0 so the rewritten content is picked up cleanly.
//   - MAX_READ_BYTES_PER_TICK caps the bytes consumed per tick to prevent a
//     burst of large writes from stalling the poll thread.
//   - A partial trailing line (no newline yet) is carried to the next tick;
//     the carry buffer is bounded by MAX_PARTIAL_LINE_BYTES.

use crate::util::constants::{MAX_PARTIAL_LINE_BYTES, MAX_READ_BYTES_PER_TICK};
use crate::util::error::ReaderError;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

// =============================================================================
// Source reader capability
// =============================================================================

/// Read access to one growing log source.
///
/// Exclusively owned by the view that opened the source; poll ticks are the
/// only reader.  `close` is idempotent; reads after `close` fail with
/// `ReaderError::Closed` so a tick in flight during teardown is skipped
/// rather than resurrecting the resource.
pub trait SourceReader: Send {
    /// Return the complete lines appended since the previous call
    /// (possibly empty).
    fn read_appended(&mut self) -> Result<Vec<String>, ReaderError>;

    /// Release the underlying resource.  Idempotent; may fail.
    fn close(&mut self) -> Result<(), ReaderError>;

    /// Path of the source, for logging and event routing.
    fn path(&self) -> &Path;
}

// =============================================================================
// File-backed reader
// =============================================================================

/// `SourceReader` over a file on disk.
///
/// The file is opened per tick rather than held open, so log rotation that
/// replaces the path with a new inode is picked up transparently on the
/// next read.
pub struct FileSourceReader {
    path: PathBuf,

    /// Byte position of the last byte examined in the file.
    /// Always advances by exactly the number of bytes read each tick,
    /// whether those bytes produced complete lines or not.
    offset: u64,

    /// Bytes from the most recent read that followed the final newline —
    /// an in-progress (incomplete) log line, prepended to the next tick's
    /// decoded bytes before searching for newlines.
    partial: String,

    closed: bool,
}

impl FileSourceReader {
    /// Open `path` positioned at its *current end*, so only content written
    /// after this moment is surfaced.
    ///
    /// A missing or unreadable file is not an error at open time: the
    /// offset seeds to 0 and per-tick reads report I/O problems as they
    /// occur.
    pub fn open_at_end(path: PathBuf) -> Self {
        let offset = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        tracing::debug!(file = %path.display(), offset, "Reader: seeding initial offset");
        Self {
            path,
            offset,
            partial: String::new(),
            closed: false,
        }
    }

    fn decode_new_bytes(&mut self, new_bytes: &[u8]) -> Vec<String> {
        let decoded = String::from_utf8_lossy(new_bytes);
        self.partial.push_str(&decoded);

        // Everything up to and including the final '\n' is complete.
        // Bytes after it are an in-progress line — carry forward.
        let complete_text = match self.partial.rfind('\n') {
            Some(nl_pos) => {
                let complete = self.partial[..=nl_pos].to_string();
                self.partial = self.partial[nl_pos + 1..].to_string();
                complete
            }
            None => {
                if self.partial.len() > MAX_PARTIAL_LINE_BYTES {
                    tracing::warn!(
                        file = %self.path.display(),
                        buffered = self.partial.len(),
                        "Reader: discarding oversized partial line"
                    );
                    self.partial.clear();
                }
                return Vec::new();
            }
        };

        complete_text
            .split_inclusive('\n')
            .map(|line| line.trim_end_matches(['\n', '\r']).to_string())
            .collect()
    }
}

impl SourceReader for FileSourceReader {
    fn read_appended(&mut self) -> Result<Vec<String>, ReaderError> {
        if self.closed {
            return Err(ReaderError::Closed {
                path: self.path.clone(),
            });
        }

        let current_size = std::fs::metadata(&self.path)
            .map(|m| m.len())
            .map_err(|source| ReaderError::Io {
                path: self.path.clone(),
                source,
            })?;

        // Rotation / truncation: the file shrank below our read position.
        if current_size < self.offset {
            tracing::info!(
                file = %self.path.display(),
                old_offset = self.offset,
                new_size = current_size,
                "Reader: file truncated or rotated — resetting offset to 0"
            );
            self.offset = 0;
            self.partial.clear();
        }

        if current_size == self.offset {
            return Ok(Vec::new());
        }

        let bytes_available = (current_size - self.offset) as usize;
        let read_limit = bytes_available.min(MAX_READ_BYTES_PER_TICK);

        let new_bytes =
            read_bytes_at(&self.path, self.offset, read_limit).map_err(|source| {
                ReaderError::Io {
                    path: self.path.clone(),
                    source,
                }
            })?;

        if new_bytes.is_empty() {
            return Ok(Vec::new());
        }

        // Advance unconditionally — these bytes are consumed whether they
        // produced complete lines or not.
        self.offset += new_bytes.len() as u64;

        Ok(self.decode_new_bytes(&new_bytes))
    }

    fn close(&mut self) -> Result<(), ReaderError> {
        if !self.closed {
            tracing::debug!(file = %self.path.display(), "Reader closed");
            self.closed = true;
            self.partial.clear();
        }
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Read up to `limit` bytes from `path` starting at byte position `offset`.
///
/// Returns fewer bytes than `limit` if the file ends before `limit` is reached.
fn read_bytes_at(path: &Path, offset: u64, limit: usize) -> std::io::Result<Vec<u8>> {
    let mut file = std::fs::File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = vec![0u8; limit];
    let n = file.read(&mut buf)?;
    buf.truncate(n);
    Ok(buf)
}

// =============================================================================
// Unit tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    fn file_with(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn append(path: &Path, content: &str) {
        let mut file = fs::OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    /// Content present at open time is skipped; only appends are surfaced.
    #[test]
    fn test_open_at_end_skips_existing_content() {
        let dir = TempDir::new().unwrap();
        let path = file_with(&dir, "app.log", "old line\n");

        let mut reader = FileSourceReader::open_at_end(path.clone());
        assert_eq!(reader.read_appended().unwrap(), Vec::<String>::new());

        append(&path, "new line\n");
        assert_eq!(reader.read_appended().unwrap(), vec!["new line"]);
    }

    #[test]
    fn test_multiple_appended_lines_arrive_in_order() {
        let dir = TempDir::new().unwrap();
        let path = file_with(&dir, "app.log", "");

        let mut reader = FileSourceReader::open_at_end(path.clone());
        append(&path, "one\ntwo\r\nthree\n");
        assert_eq!(reader.read_appended().unwrap(), vec!["one", "two", "three"]);
    }

    /// A write without a trailing newline is an in-progress line: held back
    /// until the newline arrives, then delivered whole.
    #[test]
    fn test_partial_line_carried_to_next_read() {
        let dir = TempDir::new().unwrap();
        let path = file_with(&dir, "app.log", "");

        let mut reader = FileSourceReader::open_at_end(path.clone());
        append(&path, "incomp");
        assert_eq!(reader.read_appended().unwrap(), Vec::<String>::new());

        append(&path, "lete\nnext");
        assert_eq!(reader.read_appended().unwrap(), vec!["incomplete"]);

        append(&path, "\n");
        assert_eq!(reader.read_appended().unwrap(), vec!["next"]);
    }

    /// Truncation resets the offset so rewritten content is read from 0.
    #[test]
    fn test_truncation_resets_offset() {
        let dir = TempDir::new().unwrap();
        let path = file_with(&dir, "app.log", "a long original line\n");

        let mut reader = FileSourceReader::open_at_end(path.clone());
        fs::write(&path, "fresh\n").unwrap();
        assert_eq!(reader.read_appended().unwrap(), vec!["fresh"]);
    }

    /// Reads after close fail with Closed; close is idempotent.
    #[test]
    fn test_read_after_close_fails() {
        let dir = TempDir::new().unwrap();
        let path = file_with(&dir, "app.log", "");

        let mut reader = FileSourceReader::open_at_end(path);
        reader.close().unwrap();
        reader.close().unwrap();
        assert!(matches!(
            reader.read_appended(),
            Err(ReaderError::Closed { .. })
        ));
    }

    /// A vanished file is a tick-level I/O error, not a panic.
    #[test]
    fn test_missing_file_is_tick_level_error() {
        let dir = TempDir::new().unwrap();
        let path = file_with(&dir, "app.log", "seed\n");

        let mut reader = FileSourceReader::open_at_end(path.clone());
        fs::remove_file(&path).unwrap();
        assert!(matches!(reader.read_appended(), Err(ReaderError::Io { .. })));

        // The file coming back (smaller than the old offset) is treated as
        // a rotation and read from the start on a later tick.
        fs::write(&path, "ok\n").unwrap();
        assert_eq!(reader.read_appended().unwrap(), vec!["ok"]);
    }
}
