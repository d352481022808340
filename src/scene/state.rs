use crate::foundation::core::Vec3;

/// Mutable per-frame scene state shared by the kinematic model, scene components and renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneState {
    /// Joint values for the current frame: the last applied pose plus any component perturbation.
    pub joints: Vec<f32>,
    /// Key light intensity multiplier.
    pub light_intensity: f32,
    /// Per-channel material tint in `[0, 1]`.
    pub tint: [f32; 3],
    /// World-space offset added to every camera position.
    pub camera_offset: Vec3,
}

impl Default for SceneState {
    fn default() -> Self {
        Self {
            joints: Vec::new(),
            light_intensity: 1.0,
            tint: [1.0, 1.0, 1.0],
            camera_offset: Vec3::ZERO,
        }
    }
}

impl SceneState {
    /// Restore every randomizable property to its neutral value and the joints to `base`.
    ///
    /// Run before each frame's component pass so an entry never depends on earlier entries,
    /// including when the entry's own pose was rejected.
    pub fn reset_randomized(&mut self, base: &[f32]) {
        let mut joints = std::mem::take(&mut self.joints);
        joints.clear();
        joints.extend_from_slice(base);
        *self = Self {
            joints,
            ..Self::default()
        };
    }
}
