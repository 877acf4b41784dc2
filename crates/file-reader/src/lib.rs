//! Sequential chunked reads from a growing local file.
//!
//! The encoder writes the stream to disk while the uploader tails it:
//! [`FileReader::read_chunk`] returns whatever new bytes are available up
//! to a caller-supplied limit, or `None` at end-of-file-so-far. Callers
//! re-poll as the file grows.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Errors from the file reader.
#[derive(Debug, thiserror::Error)]
pub enum FileReaderError {
    #[error("could not open {path}: {source}")]
    OpenFailed {
        path: String,
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

/// Tails a file sequentially in caller-sized chunks.
#[derive(Debug)]
pub struct FileReader {
    file: File,
    path: PathBuf,
    offset: u64,
}

impl FileReader {
    /// Opens `path` for chunked reading from the start.
    pub fn open(path: &Path) -> Result<Self, FileReaderError> {
        let file = File::open(path).map_err(|source| FileReaderError::OpenFailed {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
            offset: 0,
        })
    }

    /// Reads up to `max_bytes` new bytes.
    ///
    /// Returns `None` when no bytes past the current offset exist yet;
    /// the file may still be growing, so `None` is "nothing right now",
    /// not a terminal condition.
    pub fn read_chunk(&mut self, max_bytes: usize) -> Result<Option<Vec<u8>>, FileReaderError> {
        if max_bytes == 0 {
            return Err(FileReaderError::InvalidArgument("max_bytes must be > 0"));
        }
        let available = self.remaining()?;
        if available == 0 {
            return Ok(None);
        }

        let read_size = (available as usize).min(max_bytes);
        let mut buf = vec![0u8; read_size];
        self.file.seek(SeekFrom::Start(self.offset))?;
        let n = self.file.read(&mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        self.offset += n as u64;
        Ok(Some(buf))
    }

    /// Current read offset in bytes.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Bytes currently on disk past the read offset.
    ///
    /// Re-reads file metadata, so growth since the last call is observed.
    pub fn remaining(&self) -> Result<u64, FileReaderError> {
        let size = self.file.metadata()?.len();
        Ok(size.saturating_sub(self.offset))
    }

    /// Path this reader was opened with.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::TempDir;

    use super::*;

    fn write_file(dir: &TempDir, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn open_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = FileReader::open(&dir.path().join("missing.webm")).unwrap_err();
        assert!(matches!(err, FileReaderError::OpenFailed { .. }));
    }

    #[test]
    fn reads_whole_file_in_chunks() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "stream.webm", b"0123456789");
        let mut reader = FileReader::open(&path).unwrap();

        assert_eq!(reader.read_chunk(4).unwrap().unwrap(), b"0123");
        assert_eq!(reader.read_chunk(4).unwrap().unwrap(), b"4567");
        assert_eq!(reader.read_chunk(4).unwrap().unwrap(), b"89");
        assert!(reader.read_chunk(4).unwrap().is_none());
        assert_eq!(reader.offset(), 10);
    }

    #[test]
    fn zero_max_bytes_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "stream.webm", b"x");
        let mut reader = FileReader::open(&path).unwrap();
        assert!(matches!(
            reader.read_chunk(0),
            Err(FileReaderError::InvalidArgument(_))
        ));
    }

    #[test]
    fn observes_growth_after_eof() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "stream.webm", b"head");
        let mut reader = FileReader::open(&path).unwrap();

        assert_eq!(reader.read_chunk(16).unwrap().unwrap(), b"head");
        assert!(reader.read_chunk(16).unwrap().is_none());

        // Encoder appends more data.
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"-tail").unwrap();
        drop(file);

        assert_eq!(reader.read_chunk(16).unwrap().unwrap(), b"-tail");
        assert!(reader.read_chunk(16).unwrap().is_none());
    }

    #[test]
    fn remaining_counts_unread_bytes() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "stream.webm", b"abcdef");
        let mut reader = FileReader::open(&path).unwrap();
        assert_eq!(reader.remaining().unwrap(), 6);
        reader.read_chunk(2).unwrap();
        assert_eq!(reader.remaining().unwrap(), 4);
    }

    #[test]
    fn empty_file_reads_none() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "stream.webm", b"");
        let mut reader = FileReader::open(&path).unwrap();
        assert!(reader.read_chunk(8).unwrap().is_none());
    }
}
