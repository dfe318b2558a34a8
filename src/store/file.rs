//! Local file store

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::Result;
use crate::HFileError;

use super::{ByteSink, ByteSource};

/// Read side of a local file.
///
/// Seek + read pairs are serialized under a mutex, so one handle can serve
/// any number of concurrent scanners.
pub struct FileSource {
    path: PathBuf,
    file: Mutex<File>,
    len: u64,
}

impl FileSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            len,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    fn len(&self) -> Result<u64> {
        Ok(self.len)
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf)?;
        Ok(())
    }
}

/// Write side of a local file (buffered, fsynced on close)
pub struct FileSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl FileSink {
    /// Create (or truncate) the file at `path`
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: Some(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSink for FileSink {
    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(HFileError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("append to closed file {}", self.path.display()),
            )));
        };
        if let Err(e) = writer.write_all(bytes) {
            // Part of `bytes` may already be buffered, so the file cannot
            // take further appends
            self.writer = None;
            return Err(HFileError::Io(std::io::Error::new(
                e.kind(),
                format!("append to {} failed: {}", self.path.display(), e),
            )));
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        // Closing twice is a no-op
        let Some(writer) = self.writer.take() else {
            return Ok(());
        };
        let file = writer.into_inner().map_err(|e| {
            HFileError::Io(std::io::Error::new(
                e.error().kind(),
                format!("Failed to flush {}: {}", self.path.display(), e),
            ))
        })?;
        file.sync_all()?;
        Ok(())
    }
}
