use super::*;
use crate::render::backend::SurfaceDesc;

fn surface(kind: OutputKind, w: u32, h: u32) -> Surface {
    Surface::new(SurfaceDesc {
        width: w,
        height: h,
        format: PixelFormat::surface(kind),
    })
}

fn state() -> SceneState {
    SceneState {
        joints: vec![0.0, 0.3, -0.2, 0.1],
        ..SceneState::default()
    }
}

fn render(r: &mut CpuRenderer, kind: OutputKind) -> Vec<u8> {
    let mut s = surface(kind, 48, 32);
    r.render(&state(), &Camera::new("cam0"), kind, &mut s)
        .unwrap();
    s.data().to_vec()
}

#[test]
fn color_pass_is_deterministic_and_draws_geometry() {
    let mut r = CpuRenderer::default();
    r.init().unwrap();
    let a = render(&mut r, OutputKind::Color);
    let b = render(&mut r, OutputKind::Color);
    assert_eq!(a, b);
    let bg = CpuRendererOpts::default().background;
    assert!(a.chunks_exact(4).any(|px| px != bg));
    assert!(a.chunks_exact(4).any(|px| px == bg));
}

#[test]
fn parallel_rows_match_serial_output() {
    let mut serial = CpuRenderer::default();
    let mut parallel = CpuRenderer::new(CpuRendererOpts {
        parallel: true,
        threads: Some(2),
        ..CpuRendererOpts::default()
    });
    serial.init().unwrap();
    parallel.init().unwrap();
    for kind in OutputKind::ALL {
        assert_eq!(render(&mut serial, kind), render(&mut parallel, kind));
    }
}

#[test]
fn segmentation_uses_joint_categories() {
    let mut r = CpuRenderer::default();
    let ids = render(&mut r, OutputKind::Segmentation);
    assert!(ids.contains(&0));
    assert!(ids.iter().all(|&id| id <= 4));
    assert!(ids.iter().any(|&id| id > 0));
}

#[test]
fn depth_pass_stays_within_clip_range() {
    let mut r = CpuRenderer::default();
    let cam = Camera::new("cam0");
    let bytes = render(&mut r, OutputKind::DepthNormals);
    let (depth, normals) = crate::capture::format::deinterleave_depth_normals(&bytes);
    assert_eq!(depth.len(), 48 * 32);
    assert!(depth.iter().all(|d| *d >= cam.near - 1e-3 && *d <= cam.far + 1e-2));
    assert!(depth.iter().any(|d| *d < cam.far - 1.0));
    assert!(normals.iter().all(|n| (-1e-4..=1.0 + 1e-4).contains(n)));
}

#[test]
fn mismatched_surface_format_is_a_render_error() {
    let mut r = CpuRenderer::default();
    let mut s = surface(OutputKind::Segmentation, 8, 8);
    let err = r
        .render(&state(), &Camera::new("cam0"), OutputKind::Color, &mut s)
        .unwrap_err();
    assert!(matches!(err, OrrbError::Render(_)));
}

#[test]
fn zero_threads_is_rejected_at_init() {
    let mut r = CpuRenderer::new(CpuRendererOpts {
        parallel: true,
        threads: Some(0),
        ..CpuRendererOpts::default()
    });
    assert!(r.init().is_err());
}

#[test]
fn readback_strips_alpha_for_rgb_wire_format() {
    let mut r = CpuRenderer::default();
    let mut s = surface(OutputKind::Color, 4, 4);
    r.render(&state(), &Camera::new("cam0"), OutputKind::Color, &mut s)
        .unwrap();
    let mut dest = Vec::new();
    r.readback(&s, PixelFormat::Rgb8, &mut dest).unwrap();
    assert_eq!(dest.len(), 4 * 4 * 3);
}
