use crate::foundation::core::{OutputKind, Vec3};

/// Channels per pixel in a packed depth+normals buffer.
pub const DEPTH_NORMALS_CHANNELS: usize = 4;

/// Wire and surface pixel formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// Packed 8-bit RGB.
    Rgb8,
    /// Packed 8-bit RGBA.
    Rgba8,
    /// Four little-endian `f32` per pixel: absolute depth, then normal xyz remapped to `[0, 1]`.
    DepthNormalsF32,
    /// One byte category id per pixel.
    SegmentationU8,
}

impl PixelFormat {
    /// Bytes used by one pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
            PixelFormat::DepthNormalsF32 => DEPTH_NORMALS_CHANNELS * 4,
            PixelFormat::SegmentationU8 => 1,
        }
    }

    /// Byte length of a `width x height` image.
    pub fn byte_len(self, width: u32, height: u32) -> usize {
        (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(self.bytes_per_pixel())
    }

    /// Format delivered to clients for `kind`.
    pub fn wire(kind: OutputKind, alpha: bool) -> Self {
        match kind {
            OutputKind::Color if alpha => PixelFormat::Rgba8,
            OutputKind::Color => PixelFormat::Rgb8,
            OutputKind::DepthNormals => PixelFormat::DepthNormalsF32,
            OutputKind::Segmentation => PixelFormat::SegmentationU8,
        }
    }

    /// Format of the render surface backing `kind`. Colour surfaces always carry alpha; it is
    /// dropped during readback when not requested.
    pub fn surface(kind: OutputKind) -> Self {
        match kind {
            OutputKind::Color => PixelFormat::Rgba8,
            OutputKind::DepthNormals => PixelFormat::DepthNormalsF32,
            OutputKind::Segmentation => PixelFormat::SegmentationU8,
        }
    }
}

/// Pool class: surfaces of one class are interchangeable across cameras.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormatClass {
    /// 8-bit colour with or without alpha.
    Color8,
    /// Packed float32 depth+normals.
    PackedFloat,
    /// Single-byte segmentation id.
    CategoryId,
}

impl FormatClass {
    /// All classes, in pool order.
    pub const ALL: [FormatClass; 3] = [
        FormatClass::Color8,
        FormatClass::PackedFloat,
        FormatClass::CategoryId,
    ];

    /// Class of the surface backing `kind`.
    pub fn of(kind: OutputKind) -> Self {
        match kind {
            OutputKind::Color => FormatClass::Color8,
            OutputKind::DepthNormals => FormatClass::PackedFloat,
            OutputKind::Segmentation => FormatClass::CategoryId,
        }
    }

    /// Surface format shared by every pooled surface of this class.
    pub fn surface_format(self) -> PixelFormat {
        match self {
            FormatClass::Color8 => PixelFormat::Rgba8,
            FormatClass::PackedFloat => PixelFormat::DepthNormalsF32,
            FormatClass::CategoryId => PixelFormat::SegmentationU8,
        }
    }

    /// Index into per-class arrays.
    pub fn index(self) -> usize {
        match self {
            FormatClass::Color8 => 0,
            FormatClass::PackedFloat => 1,
            FormatClass::CategoryId => 2,
        }
    }
}

/// Reconstruct absolute view depth from a normalized `[0, 1]` perspective depth value.
pub fn linearize_depth(normalized: f32, near: f32, far: f32) -> f32 {
    let d = normalized.clamp(0.0, 1.0);
    (near * far) / (far - d * (far - near))
}

/// Inverse of [`linearize_depth`].
pub fn normalize_depth(depth: f32, near: f32, far: f32) -> f32 {
    let z = depth.clamp(near, far);
    (far * (z - near)) / (z * (far - near))
}

/// Pack one depth+normal texel: absolute depth, then the normal remapped from `[-1, 1]` to `[0, 1]`.
pub fn pack_depth_normal(normalized_depth: f32, near: f32, far: f32, normal: Vec3) -> [f32; 4] {
    [
        linearize_depth(normalized_depth, near, far),
        normal.x * 0.5 + 0.5,
        normal.y * 0.5 + 0.5,
        normal.z * 0.5 + 0.5,
    ]
}

/// Write `texel` little-endian into the 16 bytes of `dst`.
pub fn write_texel(dst: &mut [u8], texel: [f32; 4]) {
    for (chunk, v) in dst.chunks_exact_mut(4).zip(texel) {
        chunk.copy_from_slice(&v.to_le_bytes());
    }
}

/// Split a packed depth+normals buffer into `(depth, normals)` by channel offset.
///
/// `depth` holds one value per pixel; `normals` holds three.
pub fn deinterleave_depth_normals(bytes: &[u8]) -> (Vec<f32>, Vec<f32>) {
    let texel_bytes = PixelFormat::DepthNormalsF32.bytes_per_pixel();
    let pixels = bytes.len() / texel_bytes;
    let mut depth = Vec::with_capacity(pixels);
    let mut normals = Vec::with_capacity(pixels * 3);
    for texel in bytes.chunks_exact(texel_bytes) {
        let mut ch = texel
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]));
        depth.extend(ch.next());
        normals.extend(ch);
    }
    (depth, normals)
}

/// Copy `src` (surface format) into `dst` (wire format), resizing `dst` as needed.
pub fn convert_into(src: &[u8], src_format: PixelFormat, dst_format: PixelFormat, dst: &mut Vec<u8>) {
    if src_format == dst_format {
        dst.clear();
        dst.extend_from_slice(src);
        return;
    }
    match (src_format, dst_format) {
        (PixelFormat::Rgba8, PixelFormat::Rgb8) => {
            dst.clear();
            dst.reserve(src.len() / 4 * 3);
            for px in src.chunks_exact(4) {
                dst.extend_from_slice(&px[..3]);
            }
        }
        _ => {
            tracing::error!(?src_format, ?dst_format, "unsupported readback conversion");
            dst.clear();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/format.rs"]
mod tests;
