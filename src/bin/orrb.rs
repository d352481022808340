use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "orrb", version)]
struct Cli {
    /// Log render server activity to stderr.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one batch and write every product as PNG plus the auxiliary streams as JSON.
    Render(RenderArgs),
    /// Measure batch throughput over several render servers.
    Bench(BenchArgs),
}

#[derive(Args, Debug)]
struct SceneArgs {
    /// Scene description JSON.
    #[arg(long)]
    scene: PathBuf,

    /// Optional server config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Shade rows on a rayon pool.
    #[arg(long)]
    parallel: bool,

    /// Images per batch.
    #[arg(long, default_value_t = 4)]
    batch_size: usize,

    #[arg(long, default_value_t = 128)]
    width: u32,

    #[arg(long, default_value_t = 128)]
    height: u32,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Output directory.
    #[arg(long)]
    out: PathBuf,

    /// Camera to render. Repeat for several; defaults to every scene camera.
    #[arg(long = "camera")]
    cameras: Vec<String>,

    /// Component update JSON applied before the batch.
    #[arg(long)]
    update: Option<PathBuf>,

    /// Batch seed; entry `i` uses `seed + i`.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long)]
    alpha: bool,

    #[arg(long)]
    depth: bool,

    #[arg(long)]
    normals: bool,

    #[arg(long)]
    segmentation: bool,
}

#[derive(Args, Debug)]
struct BenchArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Client workers, each driving its own render server.
    #[arg(long, default_value_t = 2)]
    clients: usize,

    /// Batches to render.
    #[arg(long, default_value_t = 16)]
    iterations: u64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    }
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Bench(args) => cmd_bench(args),
    }
}

fn read_server_config(path: Option<&Path>) -> anyhow::Result<orrb::ServerConfig> {
    Ok(match path {
        Some(p) => orrb::ServerConfig::from_path(p)?,
        None => orrb::ServerConfig::default(),
    })
}

fn start_server(
    scene_cfg: &orrb::SceneConfig,
    args: &SceneArgs,
) -> anyhow::Result<orrb::RenderServer> {
    let config = read_server_config(args.config.as_deref())?;
    let scene = orrb::Scene::from_config(scene_cfg, &orrb::ComponentRegistry::with_builtins())?;
    let renderer = orrb::CpuRenderer::new(orrb::CpuRendererOpts {
        parallel: args.parallel,
        ..Default::default()
    });
    Ok(orrb::RenderServer::start(
        config,
        Box::new(scene),
        Box::new(renderer),
    )?)
}

/// Deterministic sweep: joint `j` of entry `i` is rotated by `0.3*i + 0.1*j` radians.
fn sweep_poses(joints: usize, batch_size: usize) -> Vec<orrb::Pose> {
    let joints = if joints == 0 { 6 } else { joints };
    (0..batch_size)
        .map(|i| orrb::Pose((0..joints).map(|j| 0.3 * i as f32 + 0.1 * j as f32).collect()))
        .collect()
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let scene_cfg = orrb::SceneConfig::from_path(&args.scene.scene)?;
    let server = start_server(&scene_cfg, &args.scene)?;
    let service = server.service();

    if let Some(path) = &args.update {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read update '{}'", path.display()))?;
        let report = service
            .update_components(orrb::UpdateRequest::from_json_str(&text)?)
            .wait()?;
        for skipped in &report.skipped {
            eprintln!("update skipped: {skipped}");
        }
    }

    let cameras = if args.cameras.is_empty() {
        scene_cfg.cameras.iter().map(|c| c.name.clone()).collect()
    } else {
        args.cameras.clone()
    };
    let mut req = orrb::BatchRenderRequest::new(cameras, args.scene.width, args.scene.height);
    req.outputs = orrb::OutputFlags {
        alpha: args.alpha,
        depth: args.depth,
        normals: args.normals,
        segmentation: args.segmentation,
    };
    req.batch_seed = args.seed;
    for pose in sweep_poses(scene_cfg.joints, args.scene.batch_size) {
        req = req.with_entry(pose, 0);
    }
    let cameras = req.cameras.clone();

    let resp = service.render_batch(req).wait()?;
    server.shutdown()?;

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("create output dir '{}'", args.out.display()))?;
    let ds = orrb::BatchDataset::from_response(&resp);
    let (w, h) = (resp.width, resp.height);
    for cam in &cameras {
        let far = scene_cfg
            .cameras
            .iter()
            .find(|c| &c.name == cam)
            .map_or(20.0, |c| c.far);
        write_camera(&args, &ds, cam, w, h, far)?;
    }

    let aux_path = args.out.join("auxiliary.json");
    let f = File::create(&aux_path)
        .with_context(|| format!("create '{}'", aux_path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(f), &resp.auxiliary)
        .with_context(|| format!("write '{}'", aux_path.display()))?;
    eprintln!("wrote {}", aux_path.display());
    Ok(())
}

fn write_camera(
    args: &RenderArgs,
    ds: &orrb::BatchDataset,
    cam: &str,
    w: u32,
    h: u32,
    far: f32,
) -> anyhow::Result<()> {
    use orrb::client::visualize;

    let color = ds
        .get(cam)
        .and_then(orrb::DatasetValue::as_u8)
        .with_context(|| format!("missing colour for camera '{cam}'"))?;
    let channels = color.shape.last().copied().unwrap_or(3);
    let depth = ds.get(&format!("{cam}_depth")).and_then(orrb::DatasetValue::as_f32);
    let normals = ds.get(&format!("{cam}_normals")).and_then(orrb::DatasetValue::as_f32);
    let seg = ds
        .get(&format!("{cam}_segmentation"))
        .and_then(orrb::DatasetValue::as_u8);

    for i in 0..ds.batch_size() {
        if let Some(px) = color.item(i) {
            let img = visualize::color_image(px, w, h, channels)?;
            save(&args.out.join(format!("{cam}_{i:03}.png")), |p| img.save(p))?;
        }
        if args.depth
            && let Some(d) = depth.and_then(|t| t.item(i))
        {
            let img = visualize::depth_to_rgb(d, w, h, far)?;
            save(&args.out.join(format!("{cam}_{i:03}_depth.png")), |p| img.save(p))?;
        }
        if args.normals
            && let Some(n) = normals.and_then(|t| t.item(i))
        {
            let img = visualize::normals_to_rgb(n, w, h)?;
            save(&args.out.join(format!("{cam}_{i:03}_normals.png")), |p| img.save(p))?;
        }
        if let Some(s) = seg.and_then(|t| t.item(i)) {
            let img = visualize::segmentation_to_rgb(s, w, h)?;
            save(&args.out.join(format!("{cam}_{i:03}_segmentation.png")), |p| img.save(p))?;
        }
    }
    Ok(())
}

fn save(path: &Path, write: impl FnOnce(&Path) -> image::ImageResult<()>) -> anyhow::Result<()> {
    write(path).with_context(|| format!("write png '{}'", path.display()))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn cmd_bench(args: BenchArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.clients > 0, "--clients must be at least 1");
    let scene_cfg = orrb::SceneConfig::from_path(&args.scene.scene)?;
    let servers = (0..args.clients)
        .map(|_| start_server(&scene_cfg, &args.scene))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let client = orrb::BatchClient::start(
        orrb::ClientConfig {
            cameras: scene_cfg.cameras.iter().map(|c| c.name.clone()).collect(),
            width: args.scene.width,
            height: args.scene.height,
            outputs: orrb::OutputFlags::default(),
        },
        servers.iter().map(orrb::RenderServer::service).collect(),
        orrb::QueueOpts::default(),
    )?;

    let poses = sweep_poses(scene_cfg.joints, args.scene.batch_size);
    let start = Instant::now();
    let (tx, rx) = std::sync::mpsc::channel();
    for seed in 0..args.iterations {
        client.render_batch_async(orrb::BatchJob::seeded(poses.clone(), seed), tx.clone())?;
    }
    drop(tx);
    let mut images = 0usize;
    for ds in rx {
        images += ds?.batch_size() * scene_cfg.cameras.len();
    }
    let elapsed = start.elapsed().as_secs_f64();

    client.shutdown()?;
    for s in servers {
        s.shutdown()?;
    }
    eprintln!(
        "rendered {images} images in {elapsed:.3}s ({:.1} images/s)",
        images as f64 / elapsed.max(1e-9)
    );
    Ok(())
}
