use crate::{
    capture::format::{FormatClass, PixelFormat},
    foundation::core::OutputKind,
};

/// Destination buffers and in-flight surface for one (camera, output kind) pair.
#[derive(Debug)]
pub struct CaptureSetup {
    camera: String,
    kind: OutputKind,
    wire: PixelFormat,
    dest: Vec<Vec<u8>>,
    current: Option<InFlight>,
}

/// A rendered surface whose readback has not been issued yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct InFlight {
    pub(crate) surface: usize,
    pub(crate) entry: usize,
}

impl CaptureSetup {
    pub fn new(camera: impl Into<String>, kind: OutputKind, alpha: bool) -> Self {
        Self {
            camera: camera.into(),
            kind,
            wire: PixelFormat::wire(kind, alpha),
            dest: Vec::new(),
            current: None,
        }
    }

    pub fn camera(&self) -> &str {
        &self.camera
    }

    pub fn kind(&self) -> OutputKind {
        self.kind
    }

    pub fn class(&self) -> FormatClass {
        FormatClass::of(self.kind)
    }

    /// Format copied into the destination buffers.
    pub fn wire_format(&self) -> PixelFormat {
        self.wire
    }

    /// Number of destination buffers currently retained.
    pub fn capacity(&self) -> usize {
        self.dest.len()
    }

    /// Prepare for a batch of `batch_size` entries.
    ///
    /// The destination list only grows, except when it holds more than `factor * batch_size`
    /// buffers for a batch of at least `min_batch` entries; then it is cut back to `batch_size`.
    pub(crate) fn prepare(&mut self, batch_size: usize, alpha: bool, factor: usize, min_batch: usize) {
        self.wire = PixelFormat::wire(self.kind, alpha);
        self.current = None;
        if self.dest.len() < batch_size {
            self.dest.resize_with(batch_size, Vec::new);
        } else if self.dest.len() > factor.saturating_mul(batch_size) && batch_size >= min_batch {
            tracing::debug!(
                camera = %self.camera,
                kind = self.kind.label(),
                from = self.dest.len(),
                to = batch_size,
                "trimming destination buffers"
            );
            self.dest.truncate(batch_size);
            self.dest.shrink_to_fit();
        }
    }

    pub(crate) fn replace_current(&mut self, next: Option<InFlight>) -> Option<InFlight> {
        std::mem::replace(&mut self.current, next)
    }

    pub(crate) fn dest_mut(&mut self, entry: usize) -> Option<&mut Vec<u8>> {
        self.dest.get_mut(entry)
    }

    /// Clone out the first `batch_size` destination buffers.
    pub(crate) fn snapshot(&self, batch_size: usize) -> Vec<Vec<u8>> {
        self.dest.iter().take(batch_size).cloned().collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/setup.rs"]
mod tests;
