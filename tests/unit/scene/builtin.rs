use super::*;
use crate::{output::context::BatchOutputContext, scene::state::SceneState};
use rand::{SeedableRng, rngs::StdRng};

fn run_once(c: &mut dyn Component, seed: u64, state: &mut SceneState) -> OrrbResult<BatchOutputContext> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut outputs = BatchOutputContext::new();
    let mut frame = FrameContext {
        entry: 0,
        rng: &mut rng,
        state,
        outputs: &mut outputs,
    };
    c.run(&mut frame)?;
    Ok(outputs)
}

#[test]
fn light_jitter_stays_in_range_and_reports_stream() {
    let mut c = LightJitter::default();
    c.set_property("min", &PropertyValue::Float(0.9)).unwrap();
    c.set_property("max", &PropertyValue::Float(1.1)).unwrap();
    let mut state = SceneState::default();
    let outputs = run_once(&mut c, 7, &mut state).unwrap();
    assert!((0.9..=1.1).contains(&state.light_intensity));
    assert_eq!(outputs.stream_width("light_intensity"), Some(1));
}

#[test]
fn light_jitter_inverted_range_fails_the_call() {
    let mut c = LightJitter::default();
    c.set_property("min", &PropertyValue::Float(2.0)).unwrap();
    c.set_property("max", &PropertyValue::Float(1.0)).unwrap();
    let err = run_once(&mut c, 0, &mut SceneState::default()).unwrap_err();
    assert!(matches!(err, OrrbError::Component(_)));
}

#[test]
fn camera_jitter_is_deterministic_per_seed() {
    let mut c = CameraJitter::default();
    let mut a = SceneState::default();
    let mut b = SceneState::default();
    run_once(&mut c, 42, &mut a).unwrap();
    run_once(&mut c, 42, &mut b).unwrap();
    assert_eq!(a.camera_offset, b.camera_offset);

    let mut other = SceneState::default();
    run_once(&mut c, 43, &mut other).unwrap();
    assert_ne!(a.camera_offset, other.camera_offset);
}

#[test]
fn material_tint_fixed_color_overrides_randomization() {
    let mut c = MaterialTint::default();
    c.set_property("color", &PropertyValue::List(vec![0.25, 0.5, 2.0]))
        .unwrap();
    let mut state = SceneState::default();
    run_once(&mut c, 1, &mut state).unwrap();
    assert_eq!(state.tint, [0.25, 0.5, 1.0]);

    let err = c
        .set_property("strength", &PropertyValue::Float(1.5))
        .unwrap_err();
    assert!(err.to_string().contains("[0, 1]"));
}

#[test]
fn joint_noise_counts_perturbed_joints() {
    let mut c = JointNoise::default();
    c.set_property("probability", &PropertyValue::Float(1.0))
        .unwrap();
    let mut state = SceneState {
        joints: vec![0.0; 5],
        ..SceneState::default()
    };
    let outputs = run_once(&mut c, 3, &mut state).unwrap();
    let streams = outputs.finalize(1);
    let count = streams
        .iter()
        .find(|s| s.name == "perturbed_joints")
        .unwrap();
    assert_eq!(
        count.data,
        crate::output::context::StreamData::Int(vec![5])
    );
}

#[test]
fn property_names_follow_schema_order() {
    assert_eq!(
        LightJitter::default().property_names(),
        vec!["min", "max", "enabled"]
    );
    assert_eq!(JointNoise::default().type_name(), "joint_noise");
}
