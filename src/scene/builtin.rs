//! Built-in scene modifiers.
//!
//! Each modifier randomizes one aspect of the scene from the entry's seeded generator and
//! reports what it chose through the batch's auxiliary streams.

use rand::Rng;

use crate::{
    foundation::{
        core::Vec3,
        error::{OrrbError, OrrbResult},
    },
    scene::component::{
        Component, Field, FieldType, FrameContext, PropertyValue, schema_get, schema_set,
    },
};

macro_rules! schema_component {
    ($name:literal, $fields:expr) => {
        fn type_name(&self) -> &'static str {
            $name
        }

        fn property_names(&self) -> Vec<&'static str> {
            $fields.iter().map(|f| f.name).collect()
        }

        fn get_property(&self, name: &str) -> Option<PropertyValue> {
            schema_get($fields, self, name)
        }

        fn set_property(&mut self, name: &str, value: &PropertyValue) -> OrrbResult<()> {
            schema_set($fields, self, name, value)
        }
    };
}

fn non_negative(v: &PropertyValue) -> OrrbResult<f32> {
    let v = v.as_f32()?;
    if !(v >= 0.0 && v.is_finite()) {
        return Err(OrrbError::validation("must be finite and >= 0"));
    }
    Ok(v)
}

fn unit_interval(v: &PropertyValue) -> OrrbResult<f32> {
    let v = v.as_f32()?;
    if !(0.0..=1.0).contains(&v) {
        return Err(OrrbError::validation("must be within [0, 1]"));
    }
    Ok(v)
}

/// Randomizes the key light intensity within `[min, max]`.
///
/// Stream: `light_intensity` (float, width 1).
#[derive(Clone, Debug)]
pub struct LightJitter {
    min: f32,
    max: f32,
    enabled: bool,
}

impl Default for LightJitter {
    fn default() -> Self {
        Self {
            min: 0.6,
            max: 1.4,
            enabled: true,
        }
    }
}

const LIGHT_JITTER_FIELDS: &[Field<LightJitter>] = &[
    Field {
        name: "min",
        ty: FieldType::Float,
        get: |c| PropertyValue::Float(f64::from(c.min)),
        set: |c, v| {
            c.min = non_negative(v)?;
            Ok(())
        },
    },
    Field {
        name: "max",
        ty: FieldType::Float,
        get: |c| PropertyValue::Float(f64::from(c.max)),
        set: |c, v| {
            c.max = non_negative(v)?;
            Ok(())
        },
    },
    Field {
        name: "enabled",
        ty: FieldType::Bool,
        get: |c| PropertyValue::Bool(c.enabled),
        set: |c, v| {
            c.enabled = v.as_bool()?;
            Ok(())
        },
    },
];

impl Component for LightJitter {
    schema_component!("light_jitter", LIGHT_JITTER_FIELDS);

    fn run(&mut self, frame: &mut FrameContext<'_>) -> OrrbResult<()> {
        if !self.enabled {
            return Ok(());
        }
        // Bounds are set independently, so an inverted range can only be caught here.
        if self.min > self.max {
            return Err(OrrbError::component(format!(
                "light_jitter min {} exceeds max {}",
                self.min, self.max
            )));
        }
        let v = frame.rng.random_range(self.min..=self.max);
        frame.state.light_intensity = v;
        frame.outputs.output_value("light_intensity", v);
        Ok(())
    }
}

/// Offsets every camera by a uniform random vector in `[-magnitude, magnitude]^3`.
///
/// Stream: `camera_offset` (float, width 3).
#[derive(Clone, Debug)]
pub struct CameraJitter {
    magnitude: f32,
}

impl Default for CameraJitter {
    fn default() -> Self {
        Self { magnitude: 0.05 }
    }
}

const CAMERA_JITTER_FIELDS: &[Field<CameraJitter>] = &[Field {
    name: "magnitude",
    ty: FieldType::Float,
    get: |c| PropertyValue::Float(f64::from(c.magnitude)),
    set: |c, v| {
        c.magnitude = non_negative(v)?;
        Ok(())
    },
}];

impl Component for CameraJitter {
    schema_component!("camera_jitter", CAMERA_JITTER_FIELDS);

    fn run(&mut self, frame: &mut FrameContext<'_>) -> OrrbResult<()> {
        let m = self.magnitude;
        let mut axis = || {
            if m == 0.0 {
                0.0
            } else {
                frame.rng.random_range(-m..=m)
            }
        };
        let offset = Vec3::new(axis(), axis(), axis());
        frame.state.camera_offset = offset;
        frame
            .outputs
            .output_vector("camera_offset", &offset.to_array());
        Ok(())
    }
}

/// Darkens each colour channel by up to `strength`, or applies a fixed `color` when set.
///
/// Stream: `tint` (float, width 3).
#[derive(Clone, Debug)]
pub struct MaterialTint {
    strength: f32,
    color: Option<Vec3>,
}

impl Default for MaterialTint {
    fn default() -> Self {
        Self {
            strength: 0.5,
            color: None,
        }
    }
}

const MATERIAL_TINT_FIELDS: &[Field<MaterialTint>] = &[
    Field {
        name: "strength",
        ty: FieldType::Float,
        get: |c| PropertyValue::Float(f64::from(c.strength)),
        set: |c, v| {
            c.strength = unit_interval(v)?;
            Ok(())
        },
    },
    Field {
        name: "color",
        ty: FieldType::Vec3,
        get: |c| match c.color {
            Some(v) => PropertyValue::List(v.to_array().map(f64::from).to_vec()),
            None => PropertyValue::List(Vec::new()),
        },
        set: |c, v| {
            c.color = match v {
                PropertyValue::List(l) if l.is_empty() => None,
                other => Some(other.as_vec3()?),
            };
            Ok(())
        },
    },
];

impl Component for MaterialTint {
    schema_component!("material_tint", MATERIAL_TINT_FIELDS);

    fn run(&mut self, frame: &mut FrameContext<'_>) -> OrrbResult<()> {
        let tint = match self.color {
            Some(c) => [c.x, c.y, c.z].map(|v| v.clamp(0.0, 1.0)),
            None => {
                let s = self.strength;
                [(); 3].map(|_| 1.0 - s * frame.rng.random::<f32>())
            }
        };
        frame.state.tint = tint;
        frame.outputs.output_vector("tint", &tint);
        Ok(())
    }
}

/// Perturbs each joint with probability `probability` by up to `amplitude` radians.
///
/// Streams: `perturbed_joints` (int, width 1), `joints_perturbed` (bool, width 1).
#[derive(Clone, Debug)]
pub struct JointNoise {
    amplitude: f32,
    probability: f32,
}

impl Default for JointNoise {
    fn default() -> Self {
        Self {
            amplitude: 0.05,
            probability: 0.5,
        }
    }
}

const JOINT_NOISE_FIELDS: &[Field<JointNoise>] = &[
    Field {
        name: "amplitude",
        ty: FieldType::Float,
        get: |c| PropertyValue::Float(f64::from(c.amplitude)),
        set: |c, v| {
            c.amplitude = non_negative(v)?;
            Ok(())
        },
    },
    Field {
        name: "probability",
        ty: FieldType::Float,
        get: |c| PropertyValue::Float(f64::from(c.probability)),
        set: |c, v| {
            c.probability = unit_interval(v)?;
            Ok(())
        },
    },
];

impl Component for JointNoise {
    schema_component!("joint_noise", JOINT_NOISE_FIELDS);

    fn run(&mut self, frame: &mut FrameContext<'_>) -> OrrbResult<()> {
        let mut perturbed = 0i32;
        for q in frame.state.joints.iter_mut() {
            if frame.rng.random_bool(f64::from(self.probability)) {
                if self.amplitude > 0.0 {
                    *q += frame.rng.random_range(-self.amplitude..=self.amplitude);
                }
                perturbed += 1;
            }
        }
        frame.outputs.output_value("perturbed_joints", perturbed);
        frame.outputs.output_value("joints_perturbed", perturbed > 0);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/builtin.rs"]
mod tests;
