use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use rand::rngs::StdRng;

use crate::{
    foundation::{
        core::Pose,
        error::{OrrbError, OrrbResult},
    },
    output::context::BatchOutputContext,
    scene::{
        component::{Component, FrameContext, PropertyValue},
        model::{Camera, SceneConfig},
        registry::ComponentRegistry,
        state::SceneState,
    },
    service::{request::UpdateRequest, response::UpdateReport},
};

/// A scene component that failed during a frame.
#[derive(Debug)]
pub struct ComponentFailure {
    /// Component instance name.
    pub component: String,
    /// Error returned by the component.
    pub error: OrrbError,
}

/// The scene collaborator driven by the simulation loop.
///
/// Both per-tick calls (`apply_pose`, `run_frame_update`) complete synchronously on the
/// simulation thread.
pub trait SceneRuntime: Send {
    /// Look up a camera by name.
    fn camera(&self, name: &str) -> Option<&Camera>;

    /// Return `true` when `name` is a camera of this scene.
    fn has_camera(&self, name: &str) -> bool {
        self.camera(name).is_some()
    }

    /// Set the kinematic state for the next frame.
    fn apply_pose(&mut self, pose: &Pose) -> OrrbResult<()>;

    /// Run every component once for batch entry `entry`.
    ///
    /// A failing component does not stop the pass; its error is returned so the caller can log
    /// it and continue.
    fn run_frame_update(
        &mut self,
        entry: usize,
        rng: &mut StdRng,
        outputs: &mut BatchOutputContext,
    ) -> Vec<ComponentFailure>;

    /// Apply property updates. Unknown components and properties are skipped.
    fn update_components(&mut self, request: &UpdateRequest) -> UpdateReport;

    /// Read-only view handed to the renderer.
    fn view(&self) -> &SceneState;
}

struct Instance {
    name: String,
    component: Box<dyn Component>,
}

/// Reference scene built from a [`SceneConfig`] and a [`ComponentRegistry`].
pub struct Scene {
    cameras: Vec<Camera>,
    joints: usize,
    components: Vec<Instance>,
    /// Joint values of the last accepted pose. Components perturb a copy each frame.
    base_joints: Vec<f32>,
    state: SceneState,
}

impl Scene {
    /// Validate `config` and instantiate its components in declaration order.
    pub fn from_config(config: &SceneConfig, registry: &ComponentRegistry) -> OrrbResult<Self> {
        config.validate()?;
        let components = config
            .components
            .iter()
            .map(|c| {
                Ok(Instance {
                    name: c.name.clone(),
                    component: registry.build(c)?,
                })
            })
            .collect::<OrrbResult<Vec<_>>>()?;
        tracing::debug!(
            cameras = config.cameras.len(),
            components = components.len(),
            "scene built"
        );
        Ok(Self {
            cameras: config.cameras.clone(),
            joints: config.joints,
            components,
            base_joints: vec![0.0; config.joints],
            state: SceneState {
                joints: vec![0.0; config.joints],
                ..SceneState::default()
            },
        })
    }

    /// Component instance names, in run order.
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|c| c.name.as_str())
    }

    /// Current value of `component.property`.
    pub fn component_property(&self, component: &str, property: &str) -> Option<PropertyValue> {
        self.components
            .iter()
            .find(|c| c.name == component)
            .and_then(|c| c.component.get_property(property))
    }
}

impl SceneRuntime for Scene {
    fn camera(&self, name: &str) -> Option<&Camera> {
        self.cameras.iter().find(|c| c.name == name)
    }

    fn apply_pose(&mut self, pose: &Pose) -> OrrbResult<()> {
        if self.joints != 0 && pose.len() != self.joints {
            return Err(OrrbError::validation(format!(
                "pose has {} values, scene has {} joints",
                pose.len(),
                self.joints
            )));
        }
        self.base_joints.clear();
        self.base_joints.extend_from_slice(pose.values());
        self.state.joints.clone_from(&self.base_joints);
        Ok(())
    }

    fn run_frame_update(
        &mut self,
        entry: usize,
        rng: &mut StdRng,
        outputs: &mut BatchOutputContext,
    ) -> Vec<ComponentFailure> {
        self.state.reset_randomized(&self.base_joints);
        let mut failures = Vec::new();
        for inst in &mut self.components {
            let mut frame = FrameContext {
                entry,
                rng: &mut *rng,
                state: &mut self.state,
                outputs: &mut *outputs,
            };
            let run = AssertUnwindSafe(|| inst.component.run(&mut frame));
            let outcome = panic::catch_unwind(run).unwrap_or_else(|payload| {
                Err(OrrbError::component(format!(
                    "panicked: {}",
                    panic_message(payload.as_ref())
                )))
            });
            if let Err(error) = outcome {
                failures.push(ComponentFailure {
                    component: inst.name.clone(),
                    error,
                });
            }
        }
        failures
    }

    fn update_components(&mut self, request: &UpdateRequest) -> UpdateReport {
        let mut report = UpdateReport::default();
        for (name, properties) in &request.components {
            let Some(inst) = self.components.iter_mut().find(|c| &c.name == name) else {
                tracing::warn!(component = %name, "update skipped: unknown component");
                report.skipped.push(name.clone());
                continue;
            };
            for (property, value) in properties {
                let path = format!("{name}.{property}");
                match inst.component.set_property(property, value) {
                    Ok(()) => report.applied.push(path),
                    Err(e) => {
                        tracing::warn!(%path, error = %e, "update skipped");
                        report.skipped.push(path);
                    }
                }
            }
        }
        report
    }

    fn view(&self) -> &SceneState {
        &self.state
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string payload")
}

#[cfg(test)]
#[path = "../../tests/unit/scene/runtime.rs"]
mod tests;
