use std::collections::{BTreeMap, BTreeSet};

use crate::{
    foundation::{
        core::{OutputFlags, Pose},
        error::{OrrbError, OrrbResult},
    },
    capture::format::PixelFormat,
    scene::{component::PropertyValue, runtime::SceneRuntime},
};

/// One frame of a batch: the pose to apply and an optional per-entry seed.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BatchEntry {
    /// Joint values applied before the frame's component pass.
    pub pose: Pose,
    /// Seed used when the request sets `use_entry_seeds`.
    #[serde(default)]
    pub seed: u64,
}

/// A request for `entries.len()` frames from each named camera.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BatchRenderRequest {
    /// Cameras to capture, in response order.
    pub cameras: Vec<String>,
    /// Frames to produce, in order.
    pub entries: Vec<BatchEntry>,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Extra image products.
    #[serde(default)]
    pub outputs: OutputFlags,
    /// Base seed; entry `i` uses `batch_seed + i` unless `use_entry_seeds` is set.
    #[serde(default)]
    pub batch_seed: u64,
    /// Use each entry's own seed instead of deriving one from `batch_seed`.
    #[serde(default)]
    pub use_entry_seeds: bool,
}

impl BatchRenderRequest {
    /// Request for `cameras` at `width x height` with no entries and colour output only.
    pub fn new<S: Into<String>>(
        cameras: impl IntoIterator<Item = S>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            cameras: cameras.into_iter().map(Into::into).collect(),
            entries: Vec::new(),
            width,
            height,
            outputs: OutputFlags::color_only(),
            batch_seed: 0,
            use_entry_seeds: false,
        }
    }

    /// Append one entry.
    pub fn with_entry(mut self, pose: impl Into<Pose>, seed: u64) -> Self {
        self.entries.push(BatchEntry {
            pose: pose.into(),
            seed,
        });
        self
    }

    /// Append `n` entries sharing `pose`, with entry seeds `0..n`.
    pub fn with_entries(mut self, pose: &Pose, n: usize) -> Self {
        self.entries.extend((0..n as u64).map(|seed| BatchEntry {
            pose: pose.clone(),
            seed,
        }));
        self
    }

    /// Number of frames requested.
    pub fn batch_size(&self) -> usize {
        self.entries.len()
    }

    /// Seed for entry `cursor`.
    pub fn entry_seed(&self, cursor: usize) -> u64 {
        if self.use_entry_seeds {
            self.entries.get(cursor).map(|e| e.seed).unwrap_or_default()
        } else {
            self.batch_seed.wrapping_add(cursor as u64)
        }
    }

    /// Check the request against the scene it will be rendered from.
    pub fn validate(&self, scene: &dyn SceneRuntime) -> OrrbResult<()> {
        if self.cameras.is_empty() {
            return Err(OrrbError::validation("request names no cameras"));
        }
        let mut seen = BTreeSet::new();
        for name in &self.cameras {
            if !seen.insert(name.as_str()) {
                return Err(OrrbError::validation(format!(
                    "camera '{name}' requested twice"
                )));
            }
            if !scene.has_camera(name) {
                return Err(OrrbError::camera_not_found(name.clone()));
            }
        }
        if self.entries.is_empty() {
            return Err(OrrbError::validation("request has no entries"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(OrrbError::validation(format!(
                "resolution must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Bytes of the largest render surface this request allocates.
    pub fn surface_bytes(&self) -> u64 {
        let bpp = self
            .outputs
            .kinds()
            .into_iter()
            .map(|k| PixelFormat::surface(k).bytes_per_pixel())
            .max()
            .unwrap_or(0) as u64;
        (u64::from(self.width) * u64::from(self.height)).saturating_mul(bpp)
    }

    /// Reject requests whose surfaces would exceed `limit` bytes.
    pub fn check_surface_size(&self, limit: Option<u64>) -> OrrbResult<()> {
        let bytes = self.surface_bytes();
        match limit {
            Some(limit) if bytes > limit => Err(OrrbError::validation(format!(
                "{}x{} needs {bytes} bytes per surface, limit is {limit}",
                self.width, self.height
            ))),
            _ => Ok(()),
        }
    }
}

/// Property updates keyed by component instance name.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UpdateRequest {
    /// Component name to property name to new value.
    pub components: BTreeMap<String, BTreeMap<String, PropertyValue>>,
}

impl UpdateRequest {
    /// Empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style single property update.
    pub fn set(
        mut self,
        component: impl Into<String>,
        property: impl Into<String>,
        value: PropertyValue,
    ) -> Self {
        self.components
            .entry(component.into())
            .or_default()
            .insert(property.into(), value);
        self
    }

    /// Parse from JSON text.
    pub fn from_json_str(s: &str) -> OrrbResult<Self> {
        serde_json::from_str(s).map_err(|e| OrrbError::config(format!("update json: {e}")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/service/request.rs"]
mod tests;
