use super::*;

#[test]
fn width_is_fixed_by_first_write() {
    let mut ctx = BatchOutputContext::new();
    assert!(ctx.output_vector("offset", &[1.0f32, 2.0, 3.0]));
    ctx.advance();
    assert!(!ctx.output_vector("offset", &[1.0f32, 2.0]));
    assert_eq!(ctx.stream_width("offset"), Some(3));
    assert_eq!(ctx.discarded_writes(), 1);

    assert!(ctx.output_vector("offset", &[4.0f32, 5.0, 6.0]));
    let streams = ctx.finalize(2);
    assert_eq!(streams.len(), 1);
    assert_eq!(streams[0].width, 3);
    assert_eq!(
        streams[0].data,
        StreamData::Float(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
    );
}

#[test]
fn first_write_at_nonzero_entry_is_discarded() {
    let mut ctx = BatchOutputContext::new();
    ctx.advance();
    assert!(!ctx.output_value("late", 1i32));
    assert_eq!(ctx.stream_width("late"), None);
    assert!(ctx.finalize(2).is_empty());
}

#[test]
fn kind_mismatch_and_duplicate_entry_are_discarded() {
    let mut ctx = BatchOutputContext::new();
    assert!(ctx.output_value("flag", true));
    assert!(!ctx.output_value("flag", 1.0f32));
    assert!(!ctx.output_value("flag", false));
    assert_eq!(ctx.discarded_writes(), 2);

    let streams = ctx.finalize(1);
    assert_eq!(streams[0].data, StreamData::Bool(vec![true]));
}

#[test]
fn skipped_entries_are_padded_to_keep_alignment() {
    let mut ctx = BatchOutputContext::new();
    ctx.output_vector("v", &[1i32, 1]);
    ctx.advance();
    ctx.advance();
    ctx.output_vector("v", &[3i32, 3]);

    // Entry 1 was skipped and entry 3 never written.
    let streams = ctx.finalize(4);
    assert_eq!(
        streams[0].data,
        StreamData::Int(vec![1, 1, 0, 0, 3, 3, 0, 0])
    );
    assert_eq!(streams[0].data.len(), 4 * streams[0].width);
}

#[test]
fn finalize_orders_streams_by_name() {
    let mut ctx = BatchOutputContext::new();
    ctx.output_value("zeta", 1.0f32);
    ctx.output_value("alpha", 2.0f32);
    let names: Vec<_> = ctx.finalize(1).into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["alpha".to_owned(), "zeta".to_owned()]);
}

#[test]
fn width_mismatch_is_logged_as_error() {
    let mut ctx = BatchOutputContext::new();
    ctx.output_vector("offset", &[1.0f32, 2.0, 3.0]);
    ctx.advance();
    let (accepted, logs) = crate::log_capture::capture_logs(|| ctx.output_vector("offset", &[1.0f32]));
    assert!(!accepted);
    assert!(logs.contains("ERROR"), "{logs}");
    assert!(logs.contains("discarding auxiliary output write"), "{logs}");
    assert!(logs.contains("width mismatch: declared 3, got 1"), "{logs}");
}
