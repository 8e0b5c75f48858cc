// tests/line_buffer.rs

use launchcheck::exec::capture::{LineBuffer, MAX_LINE};

#[test]
fn lines_are_split_across_chunks() {
    let mut buf = LineBuffer::new();
    assert!(buf.push(b"Started App").is_empty());
    let lines = buf.push(b" in 1.2 seconds\nREADY\npart");
    assert_eq!(lines, vec![b"Started App in 1.2 seconds\n".to_vec(), b"READY\n".to_vec()]);
    assert_eq!(buf.finish(), Some(b"part".to_vec()));
}

#[test]
fn output_without_newlines_stays_bounded() {
    let mut buf = LineBuffer::new();
    let progress = b"\r[=====     ] 50%".repeat(64);
    let mut flushed = Vec::new();
    for _ in 0..200 {
        flushed.extend(buf.push(&progress));
        assert!(buf.pending_len() <= MAX_LINE + progress.len());
    }
    assert!(!flushed.is_empty(), "oversized runs are handed out for inspection");
    assert!(flushed.iter().all(|piece| piece.len() > MAX_LINE));
}

#[test]
fn empty_stream_has_no_trailing_line() {
    assert_eq!(LineBuffer::new().finish(), None);
}
