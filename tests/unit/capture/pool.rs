use super::*;

#[test]
fn acquire_rotates_and_records_history() {
    let mut p = RenderTargetPool::new(FormatClass::Color8);
    assert_eq!(p.acquire(), None);
    p.resize(4, 2, 3);
    let got: Vec<_> = (0..5).filter_map(|_| p.acquire()).collect();
    assert_eq!(got, vec![0, 1, 2, 0, 1]);
    assert_eq!(p.history(), &got[..]);
    assert!(p.history().windows(2).all(|w| w[0] != w[1]));
}

#[test]
fn resize_reuses_surfaces_unless_resolution_changes() {
    let mut p = RenderTargetPool::new(FormatClass::PackedFloat);
    p.resize(8, 8, 2);
    assert_eq!(p.stats().allocations, 2);
    assert_eq!(p.stats().bytes, 2 * 8 * 8 * 16);

    p.resize(8, 8, 3);
    assert_eq!(p.stats().allocations, 3);
    p.resize(8, 8, 1);
    assert_eq!(p.stats().surfaces, 1);
    assert_eq!(p.stats().allocations, 3);

    p.resize(16, 8, 1);
    assert_eq!(p.stats().allocations, 4);
    assert_eq!(p.surface(0).map(|s| s.desc().width), Some(16));
    assert!(p.history().is_empty());
}
