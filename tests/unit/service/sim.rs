use super::*;
use crate::{
    foundation::core::Pose,
    render::cpu::CpuRenderer,
    scene::{model::SceneConfig, registry::ComponentRegistry, runtime::Scene},
    service::{
        request::{BatchRenderRequest, UpdateRequest},
        workload::{BatchWorkload, UpdateWorkload},
    },
};

fn sim(queue: &Arc<WorkQueue<Workload>>) -> SimulationLoop {
    let cfg = SceneConfig::from_json_str(r#"{"cameras": [{"name": "cam0"}]}"#).unwrap();
    let scene = Scene::from_config(&cfg, &ComponentRegistry::with_builtins()).unwrap();
    SimulationLoop::new(
        Arc::clone(queue),
        Box::new(scene),
        Box::new(CpuRenderer::default()),
        CaptureOpts::default(),
    )
}

fn batch(id: u64, entries: usize) -> (Workload, crate::service::workload::PendingResult<crate::service::response::BatchRenderResponse>) {
    let req = BatchRenderRequest::new(["cam0"], 4, 4).with_entries(&Pose::default(), entries);
    let (w, p) = BatchWorkload::new(id, req);
    (Workload::Batch(w), p)
}

#[test]
fn idle_tick_does_nothing() {
    let q = Arc::new(WorkQueue::default());
    let mut s = sim(&q);
    assert!(!s.tick());
    assert_eq!(s.current_state(), None);
    assert_eq!(s.ticks(), 0);
}

#[test]
fn later_workload_waits_for_the_current_one() {
    let q = Arc::new(WorkQueue::default());
    let mut s = sim(&q);
    let (a, mut pa) = batch(1, 2);
    let (u, mut pu) = UpdateWorkload::new(2, UpdateRequest::new());
    q.enqueue(a).unwrap();
    q.enqueue(Workload::Update(u)).unwrap();

    // init + 2 steps + completion
    for _ in 0..3 {
        assert!(s.tick());
        assert_eq!(q.len(), 1);
        assert!(pu.try_take().is_none());
    }
    assert!(pa.try_take().is_none());
    assert!(s.tick());
    assert!(pa.try_take().unwrap().is_ok());
    assert!(pu.try_take().is_none());

    assert!(s.tick());
    assert!(pu.try_take().unwrap().is_ok());
    assert_eq!(s.finished(), 2);
    assert!(q.is_empty());
}

#[test]
fn run_drains_the_queue_after_close() {
    let q = Arc::new(WorkQueue::default());
    let mut s = sim(&q);
    let pending: Vec<_> = (0..3)
        .map(|i| {
            let (w, p) = batch(i, 2);
            q.enqueue(w).unwrap();
            p
        })
        .collect();
    q.close();
    s.run();
    assert_eq!(s.finished(), 3);
    for p in pending {
        assert_eq!(p.wait().unwrap().batch_size, 2);
    }
    assert_eq!(s.recorder().stats().batches, 3);
    assert_eq!(s.recorder().stats().stalls, 0);
}
