//! Error types for the log writer.
//!
//! `WriterError` is deliberately `Clone`: the same failure is delivered both
//! through the typed event channel (`WriterEvent::Error`) and through the
//! result of the operation that tripped over it, so the underlying
//! `std::io::Error` is held behind an `Arc`.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors surfaced by a [`LogWriter`](crate::LogWriter) instance.
///
/// All I/O failures are fatal for the instance that reported them: the writer
/// stops accepting productive writes and no reopen is attempted. Transient
/// conditions (EAGAIN/EBUSY-class) are retried internally and never appear
/// here.
#[derive(Debug, Clone, Error)]
pub enum WriterError {
    /// Creating a missing parent directory for a path destination failed.
    #[error("failed to create log directory for {path:?}: {source}")]
    CreateDir { path: PathBuf, source: Arc<io::Error> },

    /// Opening a path destination for appending failed.
    #[error("failed to open log file {path:?}: {source}")]
    Open { path: PathBuf, source: Arc<io::Error> },

    /// Duplicating a keep-open descriptor failed.
    #[error("failed to duplicate log descriptor: {0}")]
    Descriptor(Arc<io::Error>),

    /// A write to the destination failed with a non-transient error.
    #[error("log write failed: {0}")]
    Write(Arc<io::Error>),

    /// Syncing the destination to durable storage failed.
    #[error("log sync failed: {0}")]
    Sync(Arc<io::Error>),
}

impl WriterError {
    /// The `io::ErrorKind` of the underlying OS error.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            Self::CreateDir { source, .. }
            | Self::Open { source, .. }
            | Self::Descriptor(source)
            | Self::Write(source)
            | Self::Sync(source) => source.kind(),
        }
    }

    pub(crate) fn write(source: io::Error) -> Self {
        Self::Write(Arc::new(source))
    }

    pub(crate) fn sync(source: io::Error) -> Self {
        Self::Sync(Arc::new(source))
    }
}
