//! Tests for the sink implementations.

use crate::sink::{FileSink, MemorySink, RecordSink};

#[tokio::test]
async fn memory_sink_accumulates_writes() {
    let sink = MemorySink::new();
    let mut writer: Box<dyn RecordSink> = Box::new(sink.clone());

    assert_eq!(writer.write(b"abc").await.unwrap(), 3);
    assert_eq!(writer.write(b"def").await.unwrap(), 3);
    writer.sync().await.unwrap();

    assert_eq!(sink.contents(), b"abcdef".to_vec());
    assert_eq!(sink.contents_string(), "abcdef");

    sink.clear();
    assert!(sink.contents().is_empty());
}

#[tokio::test]
async fn file_sink_writes_and_syncs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.log");
    let file = tokio::fs::File::create(&path).await.unwrap();

    let mut sink = FileSink::new(file);
    let mut offset = 0;
    let data = b"hello sink\n";
    while offset < data.len() {
        offset += sink.write(&data[offset..]).await.unwrap();
    }
    sink.sync().await.unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), data.to_vec());
}
