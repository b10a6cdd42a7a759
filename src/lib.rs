//! # linelog
//!
//! A line-buffered asynchronous log writer for CLI and server tools.
//!
//! ## Overview
//!
//! linelog provides:
//! - **Line atomicity**: only complete, newline-terminated records are ever
//!   written; a trailing fragment stays buffered until terminated and is
//!   discarded on teardown, never half-written
//! - **Single-writer scheduling**: one task owns the destination, so at most
//!   one write is in flight and records land in enqueue order
//! - **Backpressure**: `write` synchronously reports when buffered bytes
//!   cross the high-water mark
//! - **Partial-write and retry handling**: short OS writes continue with the
//!   remainder; EAGAIN/EBUSY-class failures retry on a fixed delay
//! - **Typed events**: `ready`/`write`/`drain`/`error`/`finish`/`close`
//!   notifications over a broadcast channel
//! - **Structured JSONL events** (feature `logger`): category-scoped loggers
//!   writing one JSON object per line through a process-wide writer
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use linelog::{LogTarget, LogWriter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let writer = LogWriter::new(LogTarget::path("logs/session.jsonl"));
//!
//!     writer.write("{\"event\":\"started\"}\n");
//!     writer.flush().await?;
//!
//!     writer.end().await; // drains, syncs, closes
//!     Ok(())
//! }
//! ```
//!
//! ## Semantics
//!
//! - `write` never performs I/O on the caller's stack; it enqueues and
//!   returns the backpressure signal. Failures surface through the event
//!   channel, not through `write`'s return value.
//! - `flush` resolves only after every complete line enqueued strictly
//!   before the call has been written and fsync'd. It makes no promise about
//!   an open partial fragment.
//! - `end` drains and then closes; `destroy` (and `Drop`) discards buffered
//!   data and closes immediately. Both paths emit `Close` exactly once.
//! - Writers over a shared descriptor (stdout, stderr, or
//!   `LogTarget::shared_descriptor`) work on a duplicate and never close the
//!   caller's descriptor, only sync it.

pub mod buffer;
pub mod error;
pub mod sink;
pub mod target;
pub mod writer;

// Structured event layer (feature-gated)
#[cfg(feature = "logger")]
pub mod logger;

// Re-exports for convenience
pub use buffer::HIGH_WATER_MARK;
pub use error::WriterError;
pub use sink::{FileSink, MemorySink, RecordSink};
pub use target::LogTarget;
pub use writer::{LogWriter, WriterEvent};

#[cfg(feature = "logger")]
pub use logger::EventLogger;

// Internal test modules (see src/tests)
#[cfg(test)]
mod tests;
