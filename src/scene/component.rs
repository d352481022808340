use rand::rngs::StdRng;

use crate::{
    foundation::{
        core::Vec3,
        error::{OrrbError, OrrbResult},
    },
    output::context::BatchOutputContext,
    scene::state::SceneState,
};

/// A property value carried by configs and update requests.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Free-form text.
    Text(String),
    /// Numeric list (vectors, colours).
    List(Vec<f64>),
}

impl PropertyValue {
    /// Numeric value as `f32`; integers are widened.
    pub fn as_f32(&self) -> OrrbResult<f32> {
        match *self {
            PropertyValue::Float(v) => Ok(v as f32),
            PropertyValue::Int(v) => Ok(v as f32),
            _ => Err(self.type_error("number")),
        }
    }

    /// Integer value.
    pub fn as_i64(&self) -> OrrbResult<i64> {
        match *self {
            PropertyValue::Int(v) => Ok(v),
            _ => Err(self.type_error("integer")),
        }
    }

    /// Boolean value.
    pub fn as_bool(&self) -> OrrbResult<bool> {
        match *self {
            PropertyValue::Bool(v) => Ok(v),
            _ => Err(self.type_error("bool")),
        }
    }

    /// Three-element list as a vector.
    pub fn as_vec3(&self) -> OrrbResult<Vec3> {
        match self {
            PropertyValue::List(v) if v.len() == 3 => {
                Ok(Vec3::new(v[0] as f32, v[1] as f32, v[2] as f32))
            }
            _ => Err(self.type_error("3-element list")),
        }
    }

    fn type_error(&self, expected: &str) -> OrrbError {
        OrrbError::validation(format!("expected {expected}, got {self:?}"))
    }
}

/// Declared type of a schema field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    /// [`PropertyValue::Bool`].
    Bool,
    /// [`PropertyValue::Int`].
    Int,
    /// [`PropertyValue::Float`] (integers accepted).
    Float,
    /// [`PropertyValue::List`] of three numbers.
    Vec3,
}

/// One typed accessor in a component schema.
pub struct Field<C: 'static> {
    /// Property name.
    pub name: &'static str,
    /// Declared value type.
    pub ty: FieldType,
    /// Read the current value.
    pub get: fn(&C) -> PropertyValue,
    /// Validate and store a new value.
    pub set: fn(&mut C, &PropertyValue) -> OrrbResult<()>,
}

/// Read `name` through `fields`.
pub fn schema_get<C>(fields: &'static [Field<C>], c: &C, name: &str) -> Option<PropertyValue> {
    fields.iter().find(|f| f.name == name).map(|f| (f.get)(c))
}

/// Write `name` through `fields`. Unknown names are an error; values are type-checked by the
/// field's setter.
pub fn schema_set<C>(
    fields: &'static [Field<C>],
    c: &mut C,
    name: &str,
    value: &PropertyValue,
) -> OrrbResult<()> {
    let field = fields
        .iter()
        .find(|f| f.name == name)
        .ok_or_else(|| OrrbError::validation(format!("unknown property '{name}'")))?;
    (field.set)(c, value).map_err(|e| match e {
        OrrbError::Validation(msg) => {
            OrrbError::validation(format!("property '{name}' ({:?}): {msg}", field.ty))
        }
        other => other,
    })
}

/// Everything a component may read or write while running for one entry.
pub struct FrameContext<'a> {
    /// Batch entry being produced.
    pub entry: usize,
    /// Generator seeded for this entry.
    pub rng: &'a mut StdRng,
    /// Scene state the renderer will consume.
    pub state: &'a mut SceneState,
    /// Auxiliary output streams for the batch.
    pub outputs: &'a mut BatchOutputContext,
}

/// A per-frame scene modifier with an explicitly declared property schema.
pub trait Component: Send {
    /// Registered type name.
    fn type_name(&self) -> &'static str;

    /// Names of the properties declared by the schema.
    fn property_names(&self) -> Vec<&'static str>;

    /// Read one property.
    fn get_property(&self, name: &str) -> Option<PropertyValue>;

    /// Update one property.
    fn set_property(&mut self, name: &str, value: &PropertyValue) -> OrrbResult<()>;

    /// Run for one frame.
    fn run(&mut self, frame: &mut FrameContext<'_>) -> OrrbResult<()>;
}

impl std::fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("type_name", &self.type_name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/component.rs"]
mod tests;
