use super::*;

#[test]
fn partial_json_keeps_defaults() {
    let cfg = ServerConfig::from_reader(
        r#"{"queue": {"spin_checks": 2}, "capture": {"trim": {"min_batch": 8}}}"#.as_bytes(),
    )
    .unwrap();
    assert_eq!(cfg.queue.spin_checks, 2);
    assert_eq!(cfg.queue.idle_wait_ms, QueueOpts::default().idle_wait_ms);
    assert_eq!(cfg.capture.trim.min_batch, 8);
    assert_eq!(cfg.capture.trim.factor, 2);
    assert_eq!(cfg.capture.copy_latency_ticks, 1);
    assert_eq!(cfg.thread_name, "orrb-sim");
    assert_eq!(
        cfg.capture.max_surface_bytes,
        Some(crate::capture::recorder::DEFAULT_MAX_SURFACE_BYTES)
    );
}

#[test]
fn surface_limit_can_be_disabled_but_not_zeroed() {
    let cfg = ServerConfig::from_reader(r#"{"capture": {"max_surface_bytes": null}}"#.as_bytes())
        .unwrap();
    assert_eq!(cfg.capture.max_surface_bytes, None);
    let err = ServerConfig::from_reader(r#"{"capture": {"max_surface_bytes": 0}}"#.as_bytes())
        .unwrap_err();
    assert!(err.to_string().contains("max_surface_bytes"));
}

#[test]
fn invalid_configs_are_rejected() {
    let err = ServerConfig::from_reader(r#"{"thread_name": " "}"#.as_bytes()).unwrap_err();
    assert!(matches!(err, OrrbError::Config(_)));
    let err = ServerConfig::from_reader(r#"{"capture": {"trim": {"factor": 0}}}"#.as_bytes())
        .unwrap_err();
    assert!(err.to_string().contains("factor"));
    assert!(ServerConfig::from_reader("not json".as_bytes()).is_err());
    assert!(ServerConfig::from_path("/nonexistent/orrb.json").is_err());
}
