//! Tests for line decomposition and fragment handling.

use crate::buffer::LineBuffer;

#[test]
fn complete_line_is_queued() {
    let mut buf = LineBuffer::default();
    buf.ingest(b"hello\n");

    assert!(buf.has_complete_line());
    assert_eq!(buf.pop_line().unwrap(), b"hello\n");
    assert!(!buf.has_complete_line());
}

#[test]
fn multiple_newlines_in_one_chunk_queue_multiple_lines() {
    let mut buf = LineBuffer::default();
    buf.ingest(b"line 1\nline 2\nline 3\n");

    assert_eq!(buf.pop_line().unwrap(), b"line 1\n");
    assert_eq!(buf.pop_line().unwrap(), b"line 2\n");
    assert_eq!(buf.pop_line().unwrap(), b"line 3\n");
    assert!(buf.pop_line().is_none());
}

#[test]
fn trailing_segment_becomes_fragment() {
    let mut buf = LineBuffer::default();
    buf.ingest(b"complete\npartial");

    assert_eq!(buf.pop_line().unwrap(), b"complete\n");
    assert!(!buf.has_complete_line());
    assert_eq!(buf.partial_len(), 7);
}

#[test]
fn fragment_spanning_many_ingests_is_never_queued_until_terminated() {
    let mut buf = LineBuffer::default();
    buf.ingest(b"a");
    buf.ingest(b"b");
    buf.ingest(b"c");
    assert!(!buf.has_complete_line());

    buf.ingest(b"\n");
    assert_eq!(buf.pop_line().unwrap(), b"abc\n");
    assert_eq!(buf.partial_len(), 0);
}

#[test]
fn fragment_merges_with_completing_segment() {
    let mut buf = LineBuffer::default();
    buf.ingest(b"complete 1\npartial");
    buf.ingest(b" complete 2\n");

    assert_eq!(buf.pop_line().unwrap(), b"complete 1\n");
    assert_eq!(buf.pop_line().unwrap(), b"partial complete 2\n");
}

#[test]
fn empty_chunk_is_a_no_op() {
    let mut buf = LineBuffer::default();
    buf.ingest(b"");
    assert!(!buf.has_complete_line());
    assert_eq!(buf.partial_len(), 0);
}

#[test]
fn clear_discards_lines_and_fragment() {
    let mut buf = LineBuffer::default();
    buf.ingest(b"line\npartial");
    buf.clear();

    assert!(!buf.has_complete_line());
    assert_eq!(buf.partial_len(), 0);
}
