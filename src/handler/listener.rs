//! Byte sinks for resumable downloads.

use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};

/// Receives the body bytes of a resumable transfer.
pub trait ResumableListener: Send {
    /// Called for each body part, in order.
    fn on_bytes_received(&mut self, chunk: &[u8]) -> io::Result<()>;

    /// Called once the transfer has completed.
    fn on_all_bytes_received(&mut self);

    /// Bytes already held from earlier attempts, or 0 if unknown.
    fn length(&self) -> u64;
}

/// Counts received bytes and discards them.
#[derive(Debug, Default)]
pub struct CountingListener {
    length: u64,
}

impl CountingListener {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResumableListener for CountingListener {
    fn on_bytes_received(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.length += chunk.len() as u64;
        Ok(())
    }

    fn on_all_bytes_received(&mut self) {}

    fn length(&self) -> u64 {
        self.length
    }
}

/// Appends received bytes to a file.
///
/// The file length is the resume offset, so a partially written file from an
/// earlier run picks up where it stopped.
#[derive(Debug)]
pub struct FileResumableListener {
    file: File,
}

impl FileResumableListener {
    /// `file` must be open for writing.
    pub fn new(file: File) -> Self {
        Self { file }
    }
}

impl ResumableListener for FileResumableListener {
    fn on_bytes_received(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(chunk)
    }

    fn on_all_bytes_received(&mut self) {
        if let Err(e) = self.file.sync_all() {
            tracing::warn!(error = %e, "failed to sync resumable download");
        }
    }

    fn length(&self) -> u64 {
        match self.file.metadata() {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                tracing::debug!(error = %e, "cannot stat resumable download");
                0
            }
        }
    }
}
