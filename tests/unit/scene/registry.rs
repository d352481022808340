use super::*;
use crate::scene::component::PropertyValue;

fn config(name: &str, ty: &str, props: &[(&str, PropertyValue)]) -> ComponentConfig {
    ComponentConfig {
        name: name.to_owned(),
        type_name: ty.to_owned(),
        properties: props
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect(),
    }
}

#[test]
fn builtins_are_registered() {
    let r = ComponentRegistry::with_builtins();
    let names: Vec<_> = r.type_names().collect();
    assert_eq!(
        names,
        vec!["camera_jitter", "joint_noise", "light_jitter", "material_tint"]
    );
}

#[test]
fn build_applies_initial_properties() {
    let r = ComponentRegistry::with_builtins();
    let c = r
        .build(&config(
            "light",
            "light_jitter",
            &[("max", PropertyValue::Float(3.0))],
        ))
        .unwrap();
    assert_eq!(c.get_property("max"), Some(PropertyValue::Float(3.0)));
}

#[test]
fn build_rejects_unknown_types_and_properties() {
    let r = ComponentRegistry::with_builtins();
    let err = r.build(&config("x", "teleporter", &[])).unwrap_err();
    assert!(err.to_string().contains("unknown type 'teleporter'"));

    let err = r
        .build(&config(
            "light",
            "light_jitter",
            &[("warp", PropertyValue::Bool(true))],
        ))
        .unwrap_err();
    assert!(err.to_string().contains("unknown property 'warp'"));
}

#[test]
fn duplicate_registration_is_rejected() {
    let mut r = ComponentRegistry::with_builtins();
    let err = r
        .register("light_jitter", || Box::new(LightJitter::default()))
        .unwrap_err();
    assert!(matches!(err, OrrbError::Config(_)));
}
