use crate::{
    capture::format::FormatClass,
    render::backend::{Surface, SurfaceDesc},
};

/// Allocation counters for one pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Surfaces currently held.
    pub surfaces: usize,
    /// Surfaces allocated since the pool was created.
    pub allocations: u64,
    /// Bytes currently held.
    pub bytes: usize,
}

/// Fixed-size round-robin collection of interchangeable surfaces of one format class.
///
/// The pool never tracks whether a surface is busy; the recorder sizes it so the surface handed
/// out next has no readback pending.
pub struct RenderTargetPool {
    class: FormatClass,
    desc: Option<SurfaceDesc>,
    surfaces: Vec<Surface>,
    next: usize,
    history: Vec<usize>,
    allocations: u64,
}

impl RenderTargetPool {
    pub fn new(class: FormatClass) -> Self {
        Self {
            class,
            desc: None,
            surfaces: Vec::new(),
            next: 0,
            history: Vec::new(),
            allocations: 0,
        }
    }

    pub fn class(&self) -> FormatClass {
        self.class
    }

    /// Number of surfaces in rotation.
    pub fn depth(&self) -> usize {
        self.surfaces.len()
    }

    /// Resize to `depth` surfaces of `width x height`, restarting the rotation.
    ///
    /// A resolution change reallocates every surface; otherwise surfaces are kept and only the
    /// difference is allocated or dropped.
    pub fn resize(&mut self, width: u32, height: u32, depth: usize) {
        let desc = SurfaceDesc {
            width,
            height,
            format: self.class.surface_format(),
        };
        if self.desc != Some(desc) {
            self.surfaces.clear();
            self.desc = Some(desc);
        }
        if self.surfaces.len() > depth {
            self.surfaces.truncate(depth);
        }
        while self.surfaces.len() < depth {
            self.surfaces.push(Surface::new(desc));
            self.allocations += 1;
        }
        self.next = 0;
        self.history.clear();
        tracing::debug!(class = ?self.class, width, height, depth, "pool resized");
    }

    /// Hand out the next surface index in rotation and record it.
    ///
    /// Returns `None` for an empty pool.
    pub fn acquire(&mut self) -> Option<usize> {
        if self.surfaces.is_empty() {
            return None;
        }
        let idx = self.next;
        self.next = (self.next + 1) % self.surfaces.len();
        self.history.push(idx);
        Some(idx)
    }

    pub fn surface(&self, idx: usize) -> Option<&Surface> {
        self.surfaces.get(idx)
    }

    pub fn surface_mut(&mut self, idx: usize) -> Option<&mut Surface> {
        self.surfaces.get_mut(idx)
    }

    /// Surface indices handed out since the last resize, in order.
    pub fn history(&self) -> &[usize] {
        &self.history
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            surfaces: self.surfaces.len(),
            allocations: self.allocations,
            bytes: self.desc.map_or(0, |d| d.byte_len()) * self.surfaces.len(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/pool.rs"]
mod tests;
