//! Tests for the structured JSONL event layer.
//!
//! The event log is installed process-wide, first call wins, so everything
//! touching the global sink lives in a single test.

use std::path::Path;

use serde::Serialize;

use crate::logger::{self, EventLogger};
use crate::sink::MemorySink;
use crate::writer::LogWriter;

#[derive(Serialize)]
struct ResolveEvent<'a> {
    module: &'a str,
    cached: bool,
}

#[tokio::test]
async fn event_log_installs_once_and_writes_jsonl_records() {
    let sink = MemorySink::new();
    let writer = LogWriter::with_sink(Box::new(sink.clone()));

    assert!(!logger::active());
    assert!(logger::install_with(writer, "/project"));
    assert!(logger::active());

    // Only the first install wins.
    assert!(!logger::install("ignored.log"));

    static BUNDLER: EventLogger = EventLogger::new("bundler");
    assert_eq!(BUNDLER.category(), "bundler");

    BUNDLER.emit(
        "resolve",
        &ResolveEvent {
            module: "./App.tsx",
            cached: false,
        },
    );
    // Non-object payloads contribute no extra fields.
    BUNDLER.emit("tick", &42u32);

    logger::flush().await.unwrap();

    let contents = sink.contents_string();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 3);

    let init: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(init["_e"], "root:init");
    assert_eq!(init["format"], "v0-jsonl");
    assert_eq!(init["version"], env!("CARGO_PKG_VERSION"));

    let resolve: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(resolve["_e"], "bundler:resolve");
    assert!(resolve["_t"].as_u64().unwrap() > 0);
    assert_eq!(resolve["module"], "./App.tsx");
    assert_eq!(resolve["cached"], false);

    let tick: serde_json::Value = serde_json::from_str(lines[2]).unwrap();
    assert_eq!(tick["_e"], "bundler:tick");
    assert!(tick.as_object().unwrap().len() == 2); // _e and _t only

    // Paths render relative to the installed base directory.
    assert_eq!(
        BUNDLER.relative_path(Path::new("/project/src/App.tsx")),
        "src/App.tsx"
    );
    assert_eq!(BUNDLER.relative_path(Path::new("/project")), ".");
    assert_eq!(
        BUNDLER.relative_path(Path::new("/elsewhere/file.rs")),
        "/elsewhere/file.rs"
    );

    logger::shutdown().await;
    assert!(!logger::active());

    // Emitting after shutdown is a quiet no-op.
    BUNDLER.emit("late", &ResolveEvent {
        module: "x",
        cached: true,
    });
    assert_eq!(sink.contents_string().lines().count(), 3);
}
