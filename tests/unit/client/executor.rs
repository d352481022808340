use super::*;
use crate::{
    client::dataset::DatasetValue,
    render::cpu::CpuRenderer,
    scene::{component::PropertyValue, model::SceneConfig, registry::ComponentRegistry, runtime::Scene},
    service::{config::ServerConfig, server::RenderServer},
};

const SCENE: &str = r#"{
    "cameras": [{"name": "cam0"}],
    "components": [{"name": "tint", "type": "material_tint"}]
}"#;

fn server() -> RenderServer {
    let cfg = SceneConfig::from_json_str(SCENE).unwrap();
    let scene = Scene::from_config(&cfg, &ComponentRegistry::with_builtins()).unwrap();
    RenderServer::start(
        ServerConfig::default(),
        Box::new(scene),
        Box::new(CpuRenderer::default()),
    )
    .unwrap()
}

fn config() -> ClientConfig {
    ClientConfig {
        cameras: vec!["cam0".to_owned()],
        width: 8,
        height: 8,
        outputs: OutputFlags::default(),
    }
}

fn poses(n: usize) -> Vec<Pose> {
    (0..n).map(|i| Pose(vec![i as f32 * 0.1])).collect()
}

#[test]
fn start_requires_a_service() {
    let err = BatchClient::start(config(), Vec::new(), QueueOpts::default())
        .err()
        .unwrap();
    assert!(matches!(err, OrrbError::Validation(_)));
}

#[test]
fn blocking_render_returns_decoded_dataset() {
    let servers = [server(), server()];
    let client = BatchClient::start(
        config(),
        servers.iter().map(RenderServer::service).collect(),
        QueueOpts::default(),
    )
    .unwrap();
    assert_eq!(client.workers(), 2);

    let ds = client.render_batch(BatchJob::seeded(poses(3), 7)).unwrap();
    assert_eq!(ds.batch_size(), 3);
    assert_eq!(ds.get("cam0").unwrap().shape(), &[3, 8, 8, 3]);
    assert_eq!(ds.get("tint").unwrap().shape(), &[3, 3]);
    client.shutdown().unwrap();
}

#[test]
fn updates_reach_every_worker_before_the_next_batch() {
    let servers = [server(), server()];
    let client = BatchClient::start(
        config(),
        servers.iter().map(RenderServer::service).collect(),
        QueueOpts::default(),
    )
    .unwrap();
    assert_eq!(client.stamp(), 0);

    let stamp = client.update(UpdateRequest::new().set(
        "tint",
        "color",
        PropertyValue::List(vec![1.0, 0.0, 0.0]),
    ));
    assert_eq!(stamp, 1);

    let (tx, rx) = mpsc::channel();
    for seed in 0..6 {
        client
            .render_batch_async(BatchJob::seeded(poses(2), seed), tx.clone())
            .unwrap();
    }
    drop(tx);
    let results: Vec<_> = rx.iter().collect();
    assert_eq!(results.len(), 6);
    for ds in results {
        let ds = ds.unwrap();
        let tint = ds.get("tint").and_then(DatasetValue::as_f32).unwrap();
        assert_eq!(tint.data, vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }
    client.shutdown().unwrap();
}

#[test]
fn entry_seeds_must_match_poses() {
    assert!(BatchJob::with_entry_seeds(poses(2), vec![1]).is_err());
    let job = BatchJob::with_entry_seeds(poses(2), vec![4, 9]).unwrap();
    let req = job.into_request(&config());
    assert!(req.use_entry_seeds);
    assert_eq!(req.entry_seed(1), 9);
}

#[test]
fn batch_seed_offsets_each_entry() {
    let req = BatchJob::seeded(poses(3), 100).into_request(&config());
    assert!(!req.use_entry_seeds);
    assert_eq!(req.entry_seed(2), 102);
    assert_eq!(req.cameras, vec!["cam0".to_owned()]);
}

#[test]
fn jobs_after_shutdown_are_rejected() {
    let server = server();
    let client = BatchClient::start(config(), vec![server.service()], QueueOpts::default()).unwrap();
    client.queue.close();
    let err = client.render_batch(BatchJob::seeded(poses(1), 0)).unwrap_err();
    assert!(matches!(err, OrrbError::Shutdown(_)));
}
