use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::{
    foundation::{
        core::Vec3,
        error::{OrrbError, OrrbResult},
    },
    scene::component::PropertyValue,
};

/// A named pinhole camera.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Camera {
    /// Unique camera name, as referenced by render requests.
    pub name: String,
    /// World-space eye position.
    #[serde(default = "default_position")]
    pub position: Vec3,
    /// World-space point the camera looks at.
    #[serde(default)]
    pub look_at: Vec3,
    /// Vertical field of view in degrees.
    #[serde(default = "default_fov")]
    pub fov_deg: f32,
    /// Near clip plane distance.
    #[serde(default = "default_near")]
    pub near: f32,
    /// Far clip plane distance.
    #[serde(default = "default_far")]
    pub far: f32,
}

fn default_position() -> Vec3 {
    Vec3::new(0.0, 1.0, 3.0)
}

fn default_fov() -> f32 {
    45.0
}

fn default_near() -> f32 {
    0.1
}

fn default_far() -> f32 {
    20.0
}

impl Camera {
    /// Camera with default placement looking at the origin.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: default_position(),
            look_at: Vec3::ZERO,
            fov_deg: default_fov(),
            near: default_near(),
            far: default_far(),
        }
    }

    /// Builder-style position override.
    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    fn validate(&self) -> OrrbResult<()> {
        if self.name.is_empty() {
            return Err(OrrbError::validation("camera name must be non-empty"));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(OrrbError::validation(format!(
                "camera '{}' requires 0 < near < far",
                self.name
            )));
        }
        if !(self.fov_deg > 0.0 && self.fov_deg < 180.0) {
            return Err(OrrbError::validation(format!(
                "camera '{}' fov_deg must be within (0, 180)",
                self.name
            )));
        }
        if (self.look_at - self.position).length() <= f32::EPSILON {
            return Err(OrrbError::validation(format!(
                "camera '{}' look_at must differ from position",
                self.name
            )));
        }
        Ok(())
    }
}

/// One scene component instance: a registered type plus initial property values.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ComponentConfig {
    /// Instance name, addressed by update requests.
    pub name: String,
    /// Registered component type.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Initial property values, applied through the type's schema.
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

/// Scene description loaded at startup.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneConfig {
    /// Cameras available to render requests.
    pub cameras: Vec<Camera>,
    /// Number of kinematic joints. `0` accepts poses of any length.
    #[serde(default)]
    pub joints: usize,
    /// Scene modifiers run once per frame, in order.
    #[serde(default)]
    pub components: Vec<ComponentConfig>,
}

impl SceneConfig {
    /// Parse a scene description from JSON text.
    pub fn from_json_str(s: &str) -> OrrbResult<Self> {
        let cfg: Self =
            serde_json::from_str(s).map_err(|e| OrrbError::config(format!("scene json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load a scene description from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> OrrbResult<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| OrrbError::config(format!("read '{}': {e}", path.display())))?;
        Self::from_json_str(&s)
    }

    /// Check camera and component naming invariants.
    pub fn validate(&self) -> OrrbResult<()> {
        if self.cameras.is_empty() {
            return Err(OrrbError::validation("scene must define at least one camera"));
        }
        let mut names = BTreeSet::new();
        for cam in &self.cameras {
            cam.validate()?;
            if !names.insert(cam.name.as_str()) {
                return Err(OrrbError::validation(format!(
                    "duplicate camera name '{}'",
                    cam.name
                )));
            }
        }
        let mut names = BTreeSet::new();
        for c in &self.components {
            if !names.insert(c.name.as_str()) {
                return Err(OrrbError::validation(format!(
                    "duplicate component name '{}'",
                    c.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
