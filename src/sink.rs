//! The write seam between the scheduler and the destination.
//!
//! `RecordSink` is the narrow async interface the writer task drains into.
//! Production code uses [`FileSink`]; [`MemorySink`] exists so embedders and
//! tests can capture output without touching the filesystem.

use std::fmt::Debug;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

/// Trait for asynchronous log destinations.
///
/// `write` follows OS semantics: it may accept fewer bytes than offered, and
/// the caller is responsible for re-submitting the remainder. `sync` pushes
/// previously written bytes to durable storage (fsync for files).
#[async_trait]
pub trait RecordSink: Send + Debug {
    /// Write as many bytes from `buf` as the destination accepts.
    async fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Push written data down through any internal buffering and out to
    /// durable storage.
    async fn sync(&mut self) -> io::Result<()>;
}

/// Sink over an open [`tokio::fs::File`].
#[derive(Debug)]
pub struct FileSink {
    file: tokio::fs::File,
}

impl FileSink {
    pub fn new(file: tokio::fs::File) -> Self {
        Self { file }
    }
}

#[async_trait]
impl RecordSink for FileSink {
    async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf).await
    }

    async fn sync(&mut self) -> io::Result<()> {
        self.file.flush().await?;
        self.file.sync_data().await
    }
}

/// In-memory sink for testing and embedding.
///
/// Clones share the same underlying buffer, so a clone kept outside the
/// writer can inspect everything the writer produced.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    /// Create a new empty in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the contents of the sink as bytes.
    pub fn contents(&self) -> Vec<u8> {
        self.buf.lock().unwrap().clone()
    }

    /// Get the contents of the sink as a string.
    pub fn contents_string(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }

    /// Clear the sink contents.
    pub fn clear(&self) {
        self.buf.lock().unwrap().clear();
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    async fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}
