//! Log destinations and their resolution into an open sink.
//!
//! A [`LogTarget`] is the immutable identity of a writer: a filesystem path
//! (opened lazily, append-only, parent directories created on demand) or an
//! open descriptor. Descriptors the caller keeps, including the standard
//! streams, are duplicated up front, so teardown only ever closes the
//! writer's own duplicate and the caller's descriptor stays open.

use std::io;
use std::os::fd::{AsFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::WriterError;
use crate::sink::{FileSink, RecordSink};

/// Where log lines go.
#[derive(Debug)]
pub enum LogTarget {
    /// A file path, opened for appending when the writer starts. Missing
    /// parent directories are created; an existing file is never truncated.
    Path(PathBuf),
    /// An open descriptor owned by the writer, closed on teardown.
    Descriptor(OwnedFd),
    /// The process's standard output stream (a duplicate; never closed from
    /// the process's point of view, only synced).
    Stdout,
    /// The process's standard error stream (duplicate, as with `Stdout`).
    Stderr,
}

impl LogTarget {
    /// Target the given file path.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Adopt an open descriptor. The writer owns it and closes it when it
    /// terminates.
    pub fn owned_descriptor(fd: OwnedFd) -> Self {
        Self::Descriptor(fd)
    }

    /// Target a descriptor the caller keeps. The writer operates on a
    /// duplicate and never closes the original, only syncs through it.
    pub fn shared_descriptor(fd: BorrowedFd<'_>) -> Result<Self, WriterError> {
        let dup = fd
            .try_clone_to_owned()
            .map_err(|e| WriterError::Descriptor(Arc::new(e)))?;
        Ok(Self::Descriptor(dup))
    }

    /// Target standard output.
    pub fn stdout() -> Self {
        Self::Stdout
    }

    /// Target standard error.
    pub fn stderr() -> Self {
        Self::Stderr
    }

    /// Parse a destination spec as used by the `LOG_EVENTS` environment
    /// variable: a positive integer selects a descriptor (1 and 2 map to the
    /// standard streams), anything else is treated as a file path.
    ///
    /// A descriptor number above 2 is adopted as owned: the spec is the
    /// parent process asserting it opened that descriptor for us and handed
    /// ownership over.
    pub fn parse(spec: &str) -> Self {
        match spec.parse::<RawFd>() {
            Ok(1) => Self::Stdout,
            Ok(2) => Self::Stderr,
            Ok(fd) if fd > 2 => {
                // SAFETY: the spec names a descriptor inherited from the
                // parent process; ownership transfers to this writer.
                Self::Descriptor(unsafe { OwnedFd::from_raw_fd(fd) })
            }
            _ => Self::Path(PathBuf::from(spec)),
        }
    }

    /// The file path this target resolves to, if it is path-based.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            _ => None,
        }
    }

    /// Open the destination, returning the sink the writer drains into.
    ///
    /// Descriptor targets get a best-effort durability sync before first use;
    /// a directory-creation or open failure on a path target is terminal.
    pub(crate) async fn resolve(self) -> Result<Box<dyn RecordSink>, WriterError> {
        match self {
            Self::Path(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await.map_err(|source| {
                        WriterError::CreateDir {
                            path: path.clone(),
                            source: Arc::new(source),
                        }
                    })?;
                }
                let file = tokio::fs::OpenOptions::new()
                    .append(true)
                    .create(true)
                    .open(&path)
                    .await
                    .map_err(|source| WriterError::Open {
                        path: path.clone(),
                        source: Arc::new(source),
                    })?;
                Ok(Box::new(FileSink::new(file)))
            }
            Self::Descriptor(fd) => Ok(Box::new(sink_from_fd(fd).await)),
            Self::Stdout => {
                let fd = io::stdout()
                    .as_fd()
                    .try_clone_to_owned()
                    .map_err(|e| WriterError::Descriptor(Arc::new(e)))?;
                Ok(Box::new(sink_from_fd(fd).await))
            }
            Self::Stderr => {
                let fd = io::stderr()
                    .as_fd()
                    .try_clone_to_owned()
                    .map_err(|e| WriterError::Descriptor(Arc::new(e)))?;
                Ok(Box::new(sink_from_fd(fd).await))
            }
        }
    }
}

async fn sink_from_fd(fd: OwnedFd) -> FileSink {
    let file = tokio::fs::File::from_std(std::fs::File::from(fd));
    // Best-effort durability check; terminals and pipes reject fsync.
    let _ = file.sync_data().await;
    FileSink::new(file)
}
