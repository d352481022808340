use std::ops::{Add, Mul, Sub};

/// Generalized joint/position vector driving the scene's kinematic state for one frame.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Pose(pub Vec<f32>);

impl Pose {
    /// Build a pose with `len` zeroed joints.
    pub fn zeros(len: usize) -> Self {
        Self(vec![0.0; len])
    }

    /// Number of joint values.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return `true` when the pose carries no joint values.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the joint values.
    pub fn values(&self) -> &[f32] {
        &self.0
    }
}

impl From<Vec<f32>> for Pose {
    fn from(v: Vec<f32>) -> Self {
        Self(v)
    }
}

/// Which auxiliary image products a batch requests besides colour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OutputFlags {
    /// Keep the alpha channel in colour output (RGBA8 instead of RGB8).
    pub alpha: bool,
    /// Produce absolute depth (packed with normals).
    pub depth: bool,
    /// Produce view-space normals (packed with depth).
    pub normals: bool,
    /// Produce per-pixel category ids.
    pub segmentation: bool,
}

impl OutputFlags {
    /// Colour output only, without alpha.
    pub fn color_only() -> Self {
        Self::default()
    }

    /// Every product enabled.
    pub fn all() -> Self {
        Self {
            alpha: true,
            depth: true,
            normals: true,
            segmentation: true,
        }
    }

    /// Output kinds captured per camera, in stable order. Colour is always present.
    pub fn kinds(self) -> Vec<OutputKind> {
        let mut out = vec![OutputKind::Color];
        if self.depth || self.normals {
            out.push(OutputKind::DepthNormals);
        }
        if self.segmentation {
            out.push(OutputKind::Segmentation);
        }
        out
    }
}

/// One captured product of a camera. Each kind maps to one pixel-format class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OutputKind {
    /// 8-bit colour, with or without alpha.
    Color,
    /// Packed float32 absolute depth plus remapped view-space normal.
    DepthNormals,
    /// One byte category id per pixel.
    Segmentation,
}

impl OutputKind {
    /// All kinds, in capture order.
    pub const ALL: [OutputKind; 3] = [
        OutputKind::Color,
        OutputKind::DepthNormals,
        OutputKind::Segmentation,
    ];

    /// Stable short label used in logs.
    pub fn label(self) -> &'static str {
        match self {
            OutputKind::Color => "color",
            OutputKind::DepthNormals => "depth_normals",
            OutputKind::Segmentation => "segmentation",
        }
    }
}

/// Small 3-component vector used by cameras and the reference renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Vec3 {
    /// All-zero vector.
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    /// Build a vector from components.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Dot product.
    pub fn dot(self, o: Vec3) -> f32 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    /// Cross product.
    pub fn cross(self, o: Vec3) -> Vec3 {
        Vec3::new(
            self.y * o.z - self.z * o.y,
            self.z * o.x - self.x * o.z,
            self.x * o.y - self.y * o.x,
        )
    }

    /// Euclidean length.
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction, or zero for a zero-length input.
    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if len <= f32::EPSILON {
            return Vec3::ZERO;
        }
        self * (1.0 / len)
    }

    /// Components as an array.
    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, s: f32) -> Vec3 {
        Vec3::new(self.x * s, self.y * s, self.z * s)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
