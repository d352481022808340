use super::*;

#[test]
fn destination_list_grows_and_trims_by_policy() {
    let mut s = CaptureSetup::new("cam0", OutputKind::Color, false);
    s.prepare(100, false, 2, 32);
    assert_eq!(s.capacity(), 100);

    // 100 <= 2 * 50: kept
    s.prepare(50, false, 2, 32);
    assert_eq!(s.capacity(), 100);

    // 100 > 2 * 10 but the batch is below min_batch: kept
    s.prepare(10, false, 2, 32);
    assert_eq!(s.capacity(), 100);

    s.prepare(33, false, 2, 32);
    assert_eq!(s.capacity(), 33);
}

#[test]
fn wire_format_follows_alpha_flag() {
    let mut s = CaptureSetup::new("cam0", OutputKind::Color, false);
    assert_eq!(s.wire_format(), PixelFormat::Rgb8);
    s.prepare(1, true, 2, 32);
    assert_eq!(s.wire_format(), PixelFormat::Rgba8);
    assert_eq!(s.class(), FormatClass::Color8);
}
