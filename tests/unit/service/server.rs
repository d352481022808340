use super::*;
use crate::{
    foundation::core::Pose,
    render::cpu::CpuRenderer,
    scene::{model::SceneConfig, registry::ComponentRegistry, runtime::Scene},
};

struct BrokenRenderer;

impl FrameRenderer for BrokenRenderer {
    fn init(&mut self) -> OrrbResult<()> {
        Err(OrrbError::render("no device"))
    }

    fn render(
        &mut self,
        _scene: &crate::scene::state::SceneState,
        _camera: &crate::scene::model::Camera,
        _kind: crate::foundation::core::OutputKind,
        _surface: &mut crate::render::backend::Surface,
    ) -> OrrbResult<()> {
        Ok(())
    }
}

fn scene() -> Box<Scene> {
    let cfg = SceneConfig::from_json_str(r#"{"cameras": [{"name": "cam0"}]}"#).unwrap();
    Box::new(Scene::from_config(&cfg, &ComponentRegistry::with_builtins()).unwrap())
}

#[test]
fn renderer_init_failure_is_fatal() {
    let err = RenderServer::start(ServerConfig::default(), scene(), Box::new(BrokenRenderer))
        .err()
        .unwrap();
    assert!(err.to_string().contains("no device"));
}

#[test]
fn requests_from_many_threads_all_complete() {
    let server =
        RenderServer::start(ServerConfig::default(), scene(), Box::new(CpuRenderer::default()))
            .unwrap();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let svc = server.service();
            std::thread::spawn(move || {
                let req = BatchRenderRequest::new(["cam0"], 8, 8).with_entries(&Pose::default(), i + 1);
                svc.render_batch(req).wait()
            })
        })
        .collect();
    for (i, h) in handles.into_iter().enumerate() {
        let resp = h.join().unwrap().unwrap();
        assert_eq!(resp.batch_size, i + 1);
    }
    server.shutdown().unwrap();
}

#[test]
fn requests_after_shutdown_resolve_to_shutdown() {
    let server =
        RenderServer::start(ServerConfig::default(), scene(), Box::new(CpuRenderer::default()))
            .unwrap();
    let svc = server.service();
    server.shutdown().unwrap();
    let res = svc
        .render_batch(BatchRenderRequest::new(["cam0"], 8, 8).with_entries(&Pose::default(), 1))
        .wait();
    assert!(matches!(res, Err(OrrbError::Shutdown(_))));
}

struct PanickingRenderer;

impl FrameRenderer for PanickingRenderer {
    fn render(
        &mut self,
        _scene: &crate::scene::state::SceneState,
        _camera: &crate::scene::model::Camera,
        _kind: crate::foundation::core::OutputKind,
        _surface: &mut crate::render::backend::Surface,
    ) -> OrrbResult<()> {
        panic!("surface lost")
    }
}

#[test]
fn simulation_panic_fails_queued_and_later_requests() {
    let server =
        RenderServer::start(ServerConfig::default(), scene(), Box::new(PanickingRenderer)).unwrap();
    let svc = server.service();
    let req = || BatchRenderRequest::new(["cam0"], 8, 8).with_entries(&Pose::default(), 2);

    let first = svc.render_batch(req());
    let queued = svc.render_batch(req());
    assert!(matches!(first.wait(), Err(OrrbError::Shutdown(_))));
    assert!(matches!(queued.wait(), Err(OrrbError::Shutdown(_))));

    let late = svc.update_components(UpdateRequest::new()).wait();
    assert!(matches!(late, Err(OrrbError::Shutdown(_))));

    let err = server.shutdown().unwrap_err();
    assert!(err.to_string().contains("panicked"));
}
