use std::collections::VecDeque;

use crate::{
    capture::{
        format::{FormatClass, PixelFormat},
        pool::{PoolStats, RenderTargetPool},
        setup::{CaptureSetup, InFlight},
    },
    foundation::{
        core::{OutputFlags, OutputKind},
        error::{OrrbError, OrrbResult},
    },
    render::backend::FrameRenderer,
    scene::runtime::SceneRuntime,
};

/// When oversized destination lists are cut back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrimPolicy {
    /// Trim once a list holds more than `factor * batch_size` buffers.
    pub factor: usize,
    /// Never trim for batches smaller than this.
    pub min_batch: usize,
}

impl Default for TrimPolicy {
    fn default() -> Self {
        Self {
            factor: 2,
            min_batch: 32,
        }
    }
}

/// Capture pipeline tuning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CaptureOpts {
    /// Ticks a readback stays in flight after it is issued.
    pub copy_latency_ticks: u32,
    /// Destination list trimming.
    pub trim: TrimPolicy,
    /// Largest render surface a batch may allocate, in bytes. `None` disables the check.
    pub max_surface_bytes: Option<u64>,
}

/// Default surface cap: 1 GiB, e.g. 8192x8192 packed depth+normals.
pub const DEFAULT_MAX_SURFACE_BYTES: u64 = 1 << 30;

impl Default for CaptureOpts {
    fn default() -> Self {
        Self {
            copy_latency_ticks: 1,
            trim: TrimPolicy::default(),
            max_surface_bytes: Some(DEFAULT_MAX_SURFACE_BYTES),
        }
    }
}

/// Cumulative recorder counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecorderStats {
    /// Render passes issued.
    pub renders: u64,
    /// Readbacks completed.
    pub copies: u64,
    /// Readbacks forced early because their surface was about to be rendered into.
    pub stalls: u64,
    /// Batches emitted.
    pub batches: u64,
}

/// Every entry captured for one (camera, kind) pair.
#[derive(Clone, Debug, PartialEq)]
pub struct CapturedImages {
    pub camera: String,
    pub kind: OutputKind,
    pub format: PixelFormat,
    /// One wire-format buffer per batch entry.
    pub entries: Vec<Vec<u8>>,
}

/// A completed batch of captures, in setup order (camera-major, then kind).
#[derive(Clone, Debug, PartialEq)]
pub struct CapturedBatch {
    pub batch_size: usize,
    pub width: u32,
    pub height: u32,
    pub images: Vec<CapturedImages>,
}

#[derive(Clone, Copy, Debug)]
struct PendingCopy {
    setup: usize,
    class: FormatClass,
    surface: usize,
    entry: usize,
    issued: u64,
}

/// Surfaces a class must hold so the next round-robin surface never has a readback pending.
///
/// Each setup holds the surface rendered this tick, the one rendered last tick whose readback
/// is issued this tick, and `latency` surfaces with readbacks still in flight.
pub fn in_flight(setups: usize, copy_latency_ticks: u32) -> usize {
    if setups == 0 {
        return 0;
    }
    setups * (copy_latency_ticks as usize + 2) - 1
}

/// Pooled round-robin capture of one batch across every (camera, kind) setup.
///
/// Each tick renders every setup into the next surface of its class pool and issues the readback
/// of that setup's previous surface. Readbacks complete `copy_latency_ticks` ticks after issue.
/// The batch is emitted by [`BatchRecorder::poll_complete`] on the tick after the last render.
pub struct BatchRecorder {
    opts: CaptureOpts,
    pools: [RenderTargetPool; 3],
    setups: Vec<CaptureSetup>,
    pending: VecDeque<PendingCopy>,
    batch_size: usize,
    width: u32,
    height: u32,
    cursor: usize,
    tick: u64,
    stats: RecorderStats,
}

impl BatchRecorder {
    pub fn new(opts: CaptureOpts) -> Self {
        Self {
            opts,
            pools: FormatClass::ALL.map(RenderTargetPool::new),
            setups: Vec::new(),
            pending: VecDeque::new(),
            batch_size: 0,
            width: 0,
            height: 0,
            cursor: 0,
            tick: 0,
            stats: RecorderStats::default(),
        }
    }

    pub fn opts(&self) -> &CaptureOpts {
        &self.opts
    }

    pub fn stats(&self) -> RecorderStats {
        self.stats
    }

    pub fn pool(&self, class: FormatClass) -> &RenderTargetPool {
        &self.pools[class.index()]
    }

    pub fn pool_stats(&self, class: FormatClass) -> PoolStats {
        self.pool(class).stats()
    }

    pub fn setups(&self) -> &[CaptureSetup] {
        &self.setups
    }

    /// Entries captured so far in the current batch.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Readbacks issued but not yet completed.
    pub fn pending_copies(&self) -> usize {
        self.pending.len()
    }

    /// Start a new batch: rebuild the setups, size destination lists and pools.
    #[tracing::instrument(level = "debug", skip(self, cameras))]
    pub fn reset_batch(
        &mut self,
        batch_size: usize,
        width: u32,
        height: u32,
        flags: OutputFlags,
        cameras: &[String],
    ) {
        let mut old = std::mem::take(&mut self.setups);
        for camera in cameras {
            for kind in flags.kinds() {
                let setup = match old
                    .iter()
                    .position(|s| s.camera() == camera && s.kind() == kind)
                {
                    Some(i) => old.swap_remove(i),
                    None => CaptureSetup::new(camera.clone(), kind, flags.alpha),
                };
                self.setups.push(setup);
            }
        }
        let trim = self.opts.trim;
        for s in &mut self.setups {
            s.prepare(batch_size, flags.alpha, trim.factor, trim.min_batch);
        }

        for pool in &mut self.pools {
            let class = pool.class();
            let n = self.setups.iter().filter(|s| s.class() == class).count();
            let depth = match n {
                0 => 0,
                n => in_flight(n, self.opts.copy_latency_ticks) + 1,
            };
            pool.resize(width, height, depth);
        }

        self.pending.clear();
        self.batch_size = batch_size;
        self.width = width;
        self.height = height;
        self.cursor = 0;
    }

    /// Capture the current entry from every setup.
    pub fn capture(
        &mut self,
        renderer: &mut dyn FrameRenderer,
        scene: &dyn SceneRuntime,
    ) -> OrrbResult<()> {
        if self.cursor >= self.batch_size {
            return Err(OrrbError::render(format!(
                "capture past end of batch ({} of {})",
                self.cursor, self.batch_size
            )));
        }
        let entry = self.cursor;
        for i in 0..self.setups.len() {
            let class = self.setups[i].class();
            let kind = self.setups[i].kind();
            let camera = scene
                .camera(self.setups[i].camera())
                .ok_or_else(|| OrrbError::camera_not_found(self.setups[i].camera()))?;

            let surface = self.pools[class.index()]
                .acquire()
                .ok_or_else(|| OrrbError::render(format!("empty {class:?} pool")))?;

            while let Some(pos) = self
                .pending
                .iter()
                .position(|c| c.class == class && c.surface == surface)
            {
                if let Some(copy) = self.pending.remove(pos) {
                    tracing::warn!(?class, surface, entry = copy.entry, "readback stall");
                    self.stats.stalls += 1;
                    self.complete(renderer, copy)?;
                }
            }

            let target = self.pools[class.index()]
                .surface_mut(surface)
                .ok_or_else(|| OrrbError::render(format!("surface {surface} out of range")))?;
            renderer.render(scene.view(), camera, kind, target)?;
            self.stats.renders += 1;
            tracing::debug!(camera = %camera.name, kind = kind.label(), entry, surface, "render");

            let prev = self.setups[i].replace_current(Some(InFlight { surface, entry }));
            if let Some(prev) = prev {
                self.pending.push_back(PendingCopy {
                    setup: i,
                    class,
                    surface: prev.surface,
                    entry: prev.entry,
                    issued: self.tick,
                });
            }
        }

        let latency = u64::from(self.opts.copy_latency_ticks);
        while self
            .pending
            .front()
            .is_some_and(|c| self.tick - c.issued >= latency)
        {
            if let Some(copy) = self.pending.pop_front() {
                self.complete(renderer, copy)?;
            }
        }

        self.cursor += 1;
        self.tick += 1;
        Ok(())
    }

    /// Emit the batch once every entry has been captured.
    ///
    /// Flushes the surfaces still in flight and completes every outstanding readback, then
    /// resets the cursor. Returns `None` while the batch is still being captured.
    pub fn poll_complete(
        &mut self,
        renderer: &mut dyn FrameRenderer,
    ) -> OrrbResult<Option<CapturedBatch>> {
        if self.batch_size == 0 || self.cursor < self.batch_size {
            return Ok(None);
        }
        for i in 0..self.setups.len() {
            let class = self.setups[i].class();
            if let Some(prev) = self.setups[i].replace_current(None) {
                self.pending.push_back(PendingCopy {
                    setup: i,
                    class,
                    surface: prev.surface,
                    entry: prev.entry,
                    issued: self.tick,
                });
            }
        }
        while let Some(copy) = self.pending.pop_front() {
            self.complete(renderer, copy)?;
        }

        let images = self
            .setups
            .iter()
            .map(|s| CapturedImages {
                camera: s.camera().to_owned(),
                kind: s.kind(),
                format: s.wire_format(),
                entries: s.snapshot(self.batch_size),
            })
            .collect();
        self.stats.batches += 1;
        tracing::debug!(batch_size = self.batch_size, stats = ?self.stats, "batch captured");
        let batch = CapturedBatch {
            batch_size: self.batch_size,
            width: self.width,
            height: self.height,
            images,
        };
        self.cursor = 0;
        Ok(Some(batch))
    }

    fn complete(&mut self, renderer: &mut dyn FrameRenderer, copy: PendingCopy) -> OrrbResult<()> {
        let surface = self.pools[copy.class.index()]
            .surface(copy.surface)
            .ok_or_else(|| OrrbError::render(format!("surface {} out of range", copy.surface)))?;
        let setup = &mut self.setups[copy.setup];
        let format = setup.wire_format();
        let dest = setup
            .dest_mut(copy.entry)
            .ok_or_else(|| OrrbError::render(format!("entry {} out of range", copy.entry)))?;
        renderer.readback(surface, format, dest)?;
        self.stats.copies += 1;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/recorder.rs"]
mod tests;
