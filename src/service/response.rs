use crate::{capture::format::PixelFormat, output::context::AuxiliaryStream};

/// Images captured for one entry from one camera.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StreamEntry {
    /// RGB8 or RGBA8 pixels.
    pub color: Vec<u8>,
    /// Packed 4 x f32 little-endian depth+normals, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth_normals: Option<Vec<u8>>,
    /// One category id byte per pixel, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segmentation: Option<Vec<u8>>,
}

/// Every entry captured from one camera, in entry order.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CameraStream {
    /// Camera name.
    pub name: String,
    /// Wire format of [`StreamEntry::color`].
    pub color_format: PixelFormat,
    /// One element per batch entry.
    pub entries: Vec<StreamEntry>,
}

/// Result of a completed batch.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BatchRenderResponse {
    /// Number of entries in every stream.
    pub batch_size: usize,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// One stream per requested camera, in request order.
    pub streams: Vec<CameraStream>,
    /// Flattened auxiliary streams written by scene components.
    pub auxiliary: Vec<AuxiliaryStream>,
}

impl BatchRenderResponse {
    /// Find a camera stream by name.
    pub fn stream(&self, name: &str) -> Option<&CameraStream> {
        self.streams.iter().find(|s| s.name == name)
    }

    /// Find an auxiliary stream by name.
    pub fn auxiliary(&self, name: &str) -> Option<&AuxiliaryStream> {
        self.auxiliary.iter().find(|s| s.name == name)
    }
}

/// Acknowledgement of an update request.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UpdateReport {
    /// `component.property` paths that were applied.
    pub applied: Vec<String>,
    /// `component` or `component.property` paths that were skipped.
    pub skipped: Vec<String>,
}
