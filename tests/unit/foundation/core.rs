use super::*;

#[test]
fn output_flags_kinds_always_start_with_color() {
    assert_eq!(OutputFlags::color_only().kinds(), vec![OutputKind::Color]);

    let depth_only = OutputFlags {
        depth: true,
        ..OutputFlags::default()
    };
    assert_eq!(
        depth_only.kinds(),
        vec![OutputKind::Color, OutputKind::DepthNormals]
    );

    // Depth and normals share one packed product.
    assert_eq!(
        OutputFlags::all().kinds(),
        vec![
            OutputKind::Color,
            OutputKind::DepthNormals,
            OutputKind::Segmentation
        ]
    );
}

#[test]
fn vec3_normalize_and_cross() {
    let v = Vec3::new(3.0, 0.0, 4.0).normalized();
    assert!((v.length() - 1.0).abs() < 1e-6);
    assert_eq!(Vec3::ZERO.normalized(), Vec3::ZERO);

    let z = Vec3::new(1.0, 0.0, 0.0).cross(Vec3::new(0.0, 1.0, 0.0));
    assert_eq!(z, Vec3::new(0.0, 0.0, 1.0));
}

#[test]
fn pose_serializes_as_plain_array() {
    let p = Pose::from(vec![0.5, -1.0]);
    let json = serde_json::to_string(&p).unwrap();
    assert_eq!(json, "[0.5,-1.0]");
    let back: Pose = serde_json::from_str(&json).unwrap();
    assert_eq!(back, p);
}
