use rayon::prelude::*;

use crate::{
    capture::format::{PixelFormat, normalize_depth, pack_depth_normal, write_texel},
    foundation::{
        core::{OutputKind, Vec3},
        error::{OrrbError, OrrbResult},
    },
    render::backend::{FrameRenderer, Surface},
    scene::{model::Camera, state::SceneState},
};

const RING_RADIUS: f32 = 0.6;
const JOINT_RADIUS: f32 = 0.15;
const AMBIENT: f32 = 0.15;
const PALETTE: [[f32; 3]; 7] = [
    [0.90, 0.30, 0.25],
    [0.30, 0.75, 0.35],
    [0.25, 0.45, 0.90],
    [0.95, 0.80, 0.25],
    [0.70, 0.35, 0.85],
    [0.25, 0.80, 0.80],
    [0.85, 0.85, 0.85],
];

/// Options for [`CpuRenderer`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CpuRendererOpts {
    /// Shade rows in parallel on a rayon pool.
    pub parallel: bool,
    /// Worker threads for the pool. `None` uses rayon's default.
    pub threads: Option<usize>,
    /// RGBA written where no geometry is hit.
    pub background: [u8; 4],
}

impl Default for CpuRendererOpts {
    fn default() -> Self {
        Self {
            parallel: false,
            threads: None,
            background: [16, 16, 24, 0],
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Sphere {
    center: Vec3,
    radius: f32,
    category: u8,
}

#[derive(Clone, Copy, Debug)]
struct Hit {
    sphere: usize,
    view_depth: f32,
    normal: Vec3,
}

/// Camera basis plus per-frame geometry, shared read-only by every row.
struct Frame<'a> {
    eye: Vec3,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    half_h: f32,
    half_w: f32,
    width: u32,
    height: u32,
    near: f32,
    far: f32,
    spheres: &'a [Sphere],
    light_dir: Vec3,
    light: f32,
    tint: [f32; 3],
    background: [u8; 4],
}

impl Frame<'_> {
    fn trace(&self, px: u32, py: u32) -> Option<Hit> {
        let x = (2.0 * (px as f32 + 0.5) / self.width as f32 - 1.0) * self.half_w;
        let y = (1.0 - 2.0 * (py as f32 + 0.5) / self.height as f32) * self.half_h;
        let dir = (self.forward + self.right * x + self.up * y).normalized();
        let cos = dir.dot(self.forward);

        let mut best: Option<Hit> = None;
        for (i, s) in self.spheres.iter().enumerate() {
            let oc = self.eye - s.center;
            let b = oc.dot(dir);
            let c = oc.dot(oc) - s.radius * s.radius;
            let disc = b * b - c;
            if disc < 0.0 {
                continue;
            }
            let t = -b - disc.sqrt();
            let z = t * cos;
            if !(self.near..=self.far).contains(&z) {
                continue;
            }
            if best.is_none_or(|h| z < h.view_depth) {
                let p = self.eye + dir * t;
                best = Some(Hit {
                    sphere: i,
                    view_depth: z,
                    normal: (p - s.center).normalized(),
                });
            }
        }
        best
    }

    fn shade_row(&self, kind: OutputKind, py: u32, row: &mut [u8]) {
        let bpp = PixelFormat::surface(kind).bytes_per_pixel();
        for (px, dst) in row.chunks_exact_mut(bpp).enumerate() {
            let hit = self.trace(px as u32, py);
            match kind {
                OutputKind::Color => dst.copy_from_slice(&self.color(hit)),
                OutputKind::DepthNormals => {
                    let texel = match hit {
                        Some(h) => {
                            let n = Vec3::new(
                                h.normal.dot(self.right),
                                h.normal.dot(self.up),
                                -h.normal.dot(self.forward),
                            );
                            pack_depth_normal(
                                normalize_depth(h.view_depth, self.near, self.far),
                                self.near,
                                self.far,
                                n,
                            )
                        }
                        None => pack_depth_normal(1.0, self.near, self.far, Vec3::ZERO),
                    };
                    write_texel(dst, texel);
                }
                OutputKind::Segmentation => {
                    dst[0] = hit.map_or(0, |h| self.spheres[h.sphere].category);
                }
            }
        }
    }

    fn color(&self, hit: Option<Hit>) -> [u8; 4] {
        let Some(h) = hit else {
            return self.background;
        };
        let base = PALETTE[h.sphere % PALETTE.len()];
        let lambert = h.normal.dot(self.light_dir).max(0.0);
        let shade = (AMBIENT + (1.0 - AMBIENT) * lambert) * self.light;
        let ch = |i: usize| (base[i] * self.tint[i] * shade).clamp(0.0, 1.0) * 255.0;
        [ch(0).round() as u8, ch(1).round() as u8, ch(2).round() as u8, 255]
    }
}

/// Deterministic software renderer: joints drawn as shaded spheres on a ring.
///
/// Joint `i` of `n` sits at angle `2*pi*i/n + q_i` on a horizontal ring around the origin; an
/// empty pose draws a single sphere at the origin. Category ids are `i % 6 + 1`, background is 0,
/// which keeps every frame within the 8-colour segmentation palette.
pub struct CpuRenderer {
    opts: CpuRendererOpts,
    pool: Option<rayon::ThreadPool>,
    spheres: Vec<Sphere>,
}

impl CpuRenderer {
    pub fn new(opts: CpuRendererOpts) -> Self {
        Self {
            opts,
            pool: None,
            spheres: Vec::new(),
        }
    }

    pub fn opts(&self) -> &CpuRendererOpts {
        &self.opts
    }

    fn layout(&mut self, joints: &[f32]) {
        self.spheres.clear();
        if joints.is_empty() {
            self.spheres.push(Sphere {
                center: Vec3::ZERO,
                radius: JOINT_RADIUS,
                category: 1,
            });
            return;
        }
        let n = joints.len() as f32;
        self.spheres
            .extend(joints.iter().enumerate().map(|(i, q)| {
                let a = std::f32::consts::TAU * i as f32 / n + q;
                Sphere {
                    center: Vec3::new(RING_RADIUS * a.cos(), 0.0, RING_RADIUS * a.sin()),
                    radius: JOINT_RADIUS,
                    category: (i % 6 + 1) as u8,
                }
            }));
    }
}

impl Default for CpuRenderer {
    fn default() -> Self {
        Self::new(CpuRendererOpts::default())
    }
}

impl FrameRenderer for CpuRenderer {
    fn init(&mut self) -> OrrbResult<()> {
        if self.opts.parallel {
            self.pool = Some(build_thread_pool(self.opts.threads)?);
        }
        tracing::debug!(parallel = self.opts.parallel, "cpu renderer ready");
        Ok(())
    }

    fn render(
        &mut self,
        scene: &SceneState,
        camera: &Camera,
        kind: OutputKind,
        surface: &mut Surface,
    ) -> OrrbResult<()> {
        let desc = surface.desc();
        if desc.format != PixelFormat::surface(kind) {
            return Err(OrrbError::render(format!(
                "{} pass cannot target a {:?} surface",
                kind.label(),
                desc.format
            )));
        }
        self.layout(&scene.joints);

        let eye = camera.position + scene.camera_offset;
        let forward = (camera.look_at - eye).normalized();
        let mut right = forward.cross(Vec3::new(0.0, 1.0, 0.0));
        if right.length() <= 1e-6 {
            right = Vec3::new(1.0, 0.0, 0.0);
        }
        let right = right.normalized();
        let half_h = (camera.fov_deg.to_radians() * 0.5).tan();
        let frame = Frame {
            eye,
            forward,
            right,
            up: right.cross(forward),
            half_h,
            half_w: half_h * desc.width as f32 / desc.height as f32,
            width: desc.width,
            height: desc.height,
            near: camera.near,
            far: camera.far,
            spheres: &self.spheres,
            light_dir: Vec3::new(0.5, 1.0, 0.8).normalized(),
            light: scene.light_intensity,
            tint: scene.tint,
            background: self.opts.background,
        };

        let row_bytes = desc.format.byte_len(desc.width, 1);
        let data = surface.data_mut();
        match &self.pool {
            Some(pool) => pool.install(|| {
                data.par_chunks_mut(row_bytes)
                    .enumerate()
                    .for_each(|(y, row)| frame.shade_row(kind, y as u32, row));
            }),
            None => {
                for (y, row) in data.chunks_mut(row_bytes).enumerate() {
                    frame.shade_row(kind, y as u32, row);
                }
            }
        }
        Ok(())
    }
}

fn build_thread_pool(threads: Option<usize>) -> OrrbResult<rayon::ThreadPool> {
    if threads == Some(0) {
        return Err(OrrbError::config("renderer 'threads' must be >= 1 when set"));
    }
    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("orrb-shade-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| OrrbError::render(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
