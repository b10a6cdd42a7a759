//! Structured JSONL event logging on top of the raw writer.
//!
//! A process-wide [`LogWriter`] is installed once (typically from the
//! `LOG_EVENTS` environment variable); category-scoped [`EventLogger`]s then
//! serialize one JSON object per event and hand the complete,
//! newline-terminated line to the writer. The logger chooses *what* and
//! *when* to log; durability and ordering belong to the writer alone.
//!
//! Each record carries `_e` (`"<category>:<event>"`) and `_t` (unix
//! milliseconds) alongside the payload's own fields:
//!
//! ```rust,ignore
//! use linelog::logger::{self, EventLogger};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct ResolveEvent<'a> {
//!     module: &'a str,
//! }
//!
//! static BUNDLER: EventLogger = EventLogger::new("bundler");
//!
//! logger::install_from_env();
//! BUNDLER.emit("resolve", &ResolveEvent { module: "./App.tsx" });
//! // -> {"_e":"bundler:resolve","_t":1724500000000,"module":"./App.tsx"}
//! ```

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::WriterError;
use crate::target::LogTarget;
use crate::writer::LogWriter;

/// Environment variable naming the event log destination.
pub const LOG_EVENTS_ENV: &str = "LOG_EVENTS";

/// The on-disk format identifier recorded in the `root:init` event.
const FORMAT: &str = "v0-jsonl";

static SINK: OnceLock<EventSink> = OnceLock::new();

struct EventSink {
    writer: LogWriter,
    /// Base directory that [`EventLogger::relative_path`] renders against.
    base: PathBuf,
}

#[derive(Serialize)]
struct InitMetadata<'a> {
    format: &'a str,
    version: &'a str,
}

/// Install the process-wide event log from the `LOG_EVENTS` environment
/// variable. Returns `true` if a writer was installed by this call.
///
/// Must be called from within a tokio runtime.
pub fn install_from_env() -> bool {
    match std::env::var(LOG_EVENTS_ENV) {
        Ok(spec) if !spec.is_empty() => install(&spec),
        _ => false,
    }
}

/// Install the process-wide event log for the given destination spec (a
/// descriptor number or a file path, see [`LogTarget::parse`]). The first
/// call wins; later calls are no-ops returning `false`.
pub fn install(spec: &str) -> bool {
    if SINK.get().is_some() {
        return false;
    }
    let target = LogTarget::parse(spec);
    let base = match &target {
        LogTarget::Path(path) => path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
        _ => std::env::current_dir().unwrap_or_default(),
    };
    install_with(LogWriter::new(target), base)
}

/// Install an already-constructed writer as the process-wide event log, with
/// `base` as the directory paths are rendered relative to. The first call
/// wins; later calls are no-ops returning `false`.
pub fn install_with(writer: LogWriter, base: impl Into<PathBuf>) -> bool {
    let mut installed = false;
    SINK.get_or_init(|| {
        installed = true;
        EventSink {
            writer,
            base: base.into(),
        }
    });
    if installed {
        ROOT.emit(
            "init",
            &InitMetadata {
                format: FORMAT,
                version: env!("CARGO_PKG_VERSION"),
            },
        );
    }
    installed
}

/// Whether the process-wide event log is installed and still writable.
pub fn active() -> bool {
    SINK.get().is_some_and(|sink| sink.writer.writable())
}

/// Durably sync everything logged so far. No-op when inactive.
pub async fn flush() -> Result<(), WriterError> {
    match SINK.get() {
        Some(sink) => sink.writer.flush().await,
        None => Ok(()),
    }
}

/// Gracefully end the process-wide event log, draining queued events.
pub async fn shutdown() {
    if let Some(sink) = SINK.get() {
        sink.writer.end().await;
    }
}

/// A category-scoped structured event logger.
///
/// Cheap and `const`-constructible; typically one `static` per subsystem.
/// Emitting while no process-wide writer is installed is a no-op.
#[derive(Debug, Clone, Copy)]
pub struct EventLogger {
    category: &'static str,
}

static ROOT: EventLogger = EventLogger::new("root");

impl EventLogger {
    pub const fn new(category: &'static str) -> Self {
        Self { category }
    }

    pub fn category(&self) -> &'static str {
        self.category
    }

    /// Log one event. The payload's fields are flattened into the record;
    /// non-object payloads contribute no extra fields.
    pub fn emit<T: Serialize>(&self, event: &str, payload: &T) {
        let Some(sink) = SINK.get() else { return };
        if !sink.writer.writable() {
            return;
        }

        let mut record = Map::new();
        record.insert(
            "_e".into(),
            Value::String(format!("{}:{event}", self.category)),
        );
        record.insert("_t".into(), Value::from(unix_millis()));
        if let Ok(Value::Object(fields)) = serde_json::to_value(payload) {
            record.extend(fields);
        }

        let Ok(mut line) = serde_json::to_string(&Value::Object(record)) else {
            return;
        };
        line.push('\n');
        sink.writer.write(line);
    }

    /// Render a path relative to the log base directory, with forward
    /// slashes. Paths outside the base directory are rendered as given.
    pub fn relative_path(&self, target: &Path) -> String {
        let Some(sink) = SINK.get() else {
            return target.display().to_string();
        };
        match target.strip_prefix(&sink.base) {
            Ok(rel) if rel.as_os_str().is_empty() => ".".into(),
            Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
            Err(_) => target.display().to_string(),
        }
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
