//! Tests for destination parsing and resolution.

use std::path::Path;

use crate::target::LogTarget;

#[test]
fn parse_maps_standard_descriptors() {
    assert!(matches!(LogTarget::parse("1"), LogTarget::Stdout));
    assert!(matches!(LogTarget::parse("2"), LogTarget::Stderr));
}

#[test]
fn parse_treats_non_numbers_as_paths() {
    let target = LogTarget::parse("logs/session.jsonl");
    assert_eq!(
        target.as_path(),
        Some(Path::new("logs/session.jsonl"))
    );
}

#[test]
fn parse_treats_non_positive_numbers_as_paths() {
    // "0" and "-1" are not usable descriptors; fall back to path handling.
    assert!(matches!(LogTarget::parse("0"), LogTarget::Path(_)));
    assert!(matches!(LogTarget::parse("-1"), LogTarget::Path(_)));
}

#[tokio::test]
async fn resolving_a_path_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("log.jsonl");

    let sink = LogTarget::path(&path).resolve().await;
    assert!(sink.is_ok());
    assert!(path.parent().unwrap().is_dir());
    assert!(path.exists());
}

#[tokio::test]
async fn resolving_a_path_never_truncates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.jsonl");
    std::fs::write(&path, b"existing\n").unwrap();

    let sink = LogTarget::path(&path).resolve().await;
    assert!(sink.is_ok());
    assert_eq!(std::fs::read(&path).unwrap(), b"existing\n".to_vec());
}

#[tokio::test]
async fn resolving_an_unopenable_path_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    // A file where a parent directory is expected.
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"").unwrap();
    let path = blocker.join("log.jsonl");

    let result = LogTarget::path(&path).resolve().await;
    assert!(result.is_err());
}
