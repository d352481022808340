use std::collections::BTreeMap;

use crate::{
    foundation::error::{OrrbError, OrrbResult},
    scene::{
        builtin::{CameraJitter, JointNoise, LightJitter, MaterialTint},
        component::Component,
        model::ComponentConfig,
    },
};

/// Constructor for one component type.
pub type ComponentFactory = fn() -> Box<dyn Component>;

/// Static factory table from component type name to constructor, built once at startup.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    factories: BTreeMap<&'static str, ComponentFactory>,
}

impl ComponentRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in modifiers.
    pub fn with_builtins() -> Self {
        let mut r = Self::new();
        for (name, f) in [
            ("light_jitter", (|| Box::new(LightJitter::default())) as ComponentFactory),
            ("camera_jitter", || Box::new(CameraJitter::default())),
            ("material_tint", || Box::new(MaterialTint::default())),
            ("joint_noise", || Box::new(JointNoise::default())),
        ] {
            r.factories.insert(name, f);
        }
        r
    }

    /// Add a component type. Registering a name twice is an error.
    pub fn register(&mut self, type_name: &'static str, factory: ComponentFactory) -> OrrbResult<()> {
        if self.factories.contains_key(type_name) {
            return Err(OrrbError::config(format!(
                "component type '{type_name}' registered twice"
            )));
        }
        self.factories.insert(type_name, factory);
        Ok(())
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    /// Construct a component from its config, applying every initial property.
    pub fn build(&self, config: &ComponentConfig) -> OrrbResult<Box<dyn Component>> {
        let factory = self.factories.get(config.type_name.as_str()).ok_or_else(|| {
            OrrbError::config(format!(
                "component '{}' has unknown type '{}'",
                config.name, config.type_name
            ))
        })?;
        let mut component = factory();
        for (field, value) in &config.properties {
            component.set_property(field, value).map_err(|e| {
                OrrbError::config(format!("component '{}': {e}", config.name))
            })?;
        }
        Ok(component)
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/registry.rs"]
mod tests;
