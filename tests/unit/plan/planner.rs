use super::*;

fn adaptive(tolerance: f64, min: u32, max: u32, shutter: f64) -> SamplingConfig {
    SamplingConfig {
        mode: SamplingMode::Adaptive,
        pixel_tolerance: tolerance,
        min_samples: min,
        max_samples: max,
        shutter,
        ..SamplingConfig::default()
    }
}

fn fixed(samples: f64, shutter: f64) -> SamplingConfig {
    SamplingConfig {
        mode: SamplingMode::Static,
        static_samples: samples,
        shutter,
        ..SamplingConfig::default()
    }
}

#[test]
fn static_rounds_sample_count_up() {
    let plan = plan_samples(&fixed(3.2, 0.5), 0.0).unwrap();
    assert_eq!(plan.sample_count, 4);
    assert_eq!(plan.subframe_multiplier, 8);
    assert_eq!(plan.time_step, 0.125);
}

#[test]
fn static_ignores_velocity() {
    let a = plan_samples(&fixed(4.0, 0.5), 0.0).unwrap();
    let b = plan_samples(&fixed(4.0, 0.5), 1.0e6).unwrap();
    assert_eq!(a, b);
}

#[test]
fn adaptive_scenario_matches_hand_computation() {
    // ceil(55 * 0.5 / 10) = 3 -> 6 slots of 1/6
    let plan = plan_samples(&adaptive(10.0, 1, 20, 0.5), 55.0).unwrap();
    assert_eq!(plan.sample_count, 3);
    assert_eq!(plan.subframe_multiplier, 6);
    assert!((plan.time_step - 1.0 / 6.0).abs() < 1e-15);
    let offsets: Vec<f64> = plan.nodes().map(|n| n.offset).collect();
    assert_eq!(offsets[0], 0.0);
    assert!((offsets[1] - 1.0 / 6.0).abs() < 1e-15);
    assert!((offsets[2] - 2.0 / 6.0).abs() < 1e-15);
}

#[test]
fn zero_velocity_still_renders_one_sample() {
    let plan = plan_samples(&adaptive(10.0, 1, 20, 0.5), 0.0).unwrap();
    assert_eq!(plan.sample_count, 1);
    assert_eq!(plan.subframe_multiplier, 2);

    let plan = plan_samples(&adaptive(10.0, 0, 20, 0.5), 0.0).unwrap();
    assert_eq!(plan.sample_count, 1);
}

#[test]
fn adaptive_clamps_to_bounds() {
    let plan = plan_samples(&adaptive(1.0, 2, 5, 1.0), 1000.0).unwrap();
    assert_eq!(plan.sample_count, 5);
    let plan = plan_samples(&adaptive(100.0, 3, 5, 1.0), 1.0).unwrap();
    assert_eq!(plan.sample_count, 3);
}

#[test]
fn inverted_bounds_use_min_as_max() {
    let plan = plan_samples(&adaptive(1.0, 7, 2, 1.0), 1000.0).unwrap();
    assert_eq!(plan.sample_count, 7);
    let plan = plan_samples(&adaptive(1.0, 7, 2, 1.0), 0.0).unwrap();
    assert_eq!(plan.sample_count, 7);
}

#[test]
fn shutter_above_one_never_widens_exposure() {
    let plan = plan_samples(&fixed(4.0, 2.5), 0.0).unwrap();
    assert_eq!(plan.shutter, 1.0);
    assert_eq!(plan.subframe_multiplier, 4);
    assert!(plan.nodes().all(|n| n.offset < 1.0));
}

#[test]
fn float_noise_does_not_add_a_slot() {
    // 3 / 0.6 evaluates to 5.000000000000001
    let plan = plan_samples(&fixed(3.0, 0.6), 0.0).unwrap();
    assert_eq!(plan.subframe_multiplier, 5);
    assert!(plan.nodes().all(|n| n.offset < 0.6));
}

#[test]
fn properties_hold_over_a_grid() {
    let shutters = [0.05, 0.1, 0.25, 0.3, 1.0 / 3.0, 0.5, 0.6, 0.7, 0.9, 1.0];
    let velocities = [0.0, 0.4, 3.0, 17.5, 55.0, 240.0, 10_000.0];
    for &shutter in &shutters {
        for &v in &velocities {
            for (min, max) in [(1, 20), (4, 4), (6, 2), (0, 64)] {
                let cfg = adaptive(2.5, min, max, shutter);
                let plan = plan_samples(&cfg, v).unwrap();
                let eff_max = max.max(min);
                assert!(plan.sample_count >= 1);
                assert!(plan.sample_count >= min && plan.sample_count <= eff_max);
                assert!(
                    (f64::from(plan.subframe_multiplier) * plan.time_step - 1.0).abs() < 1e-12
                );
                for node in plan.nodes() {
                    assert!(
                        node.offset < plan.shutter,
                        "offset {} >= shutter {} (n={}, m={})",
                        node.offset,
                        plan.shutter,
                        plan.sample_count,
                        plan.subframe_multiplier
                    );
                }
            }
        }
    }
}

#[test]
fn invalid_inputs_are_rejected() {
    assert!(matches!(
        plan_samples(&fixed(0.0, 0.5), 0.0),
        Err(BlurError::InvalidConfiguration(_))
    ));
    assert!(plan_samples(&fixed(-3.0, 0.5), 0.0).is_err());
    assert!(plan_samples(&fixed(4.0, 0.0), 0.0).is_err());
    assert!(plan_samples(&fixed(4.0, -0.5), 0.0).is_err());
    assert!(plan_samples(&adaptive(0.0, 1, 4, 0.5), 1.0).is_err());
    assert!(plan_samples(&adaptive(1.0, 1, 4, 0.5), -1.0).is_err());
    assert!(plan_samples(&adaptive(1.0, 1, 4, 0.5), f64::NAN).is_err());
    assert!(plan_samples(&fixed(4.0, 1e-12), 0.0).is_err());
}

#[test]
fn subframe_addressing() {
    let plan = plan_samples(&fixed(3.0, 0.5), 0.0).unwrap();
    let t = plan.subframe_time(FrameIndex(10), 2);
    assert_eq!(t.frame, FrameIndex(10));
    assert!((t.fraction - 2.0 / 6.0).abs() < 1e-15);
    assert_eq!(plan.expanded_frame(FrameIndex(10), 2), FrameIndex(62));
    assert!((plan.weight() - 1.0 / 3.0).abs() < 1e-7);
}

#[test]
fn frame_request_clamps_shutter() {
    let req = FrameRequest::new(FrameIndex(3), &fixed(2.0, 1.5));
    assert_eq!(req.shutter, 1.0);
    assert_eq!(req.mode, SamplingMode::Static);
}
