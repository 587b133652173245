//! End-to-end tests: synthetic faces through a tracking session

mod test_helpers;

use glasses_tracker::{
    config::Config,
    distance::DistanceCategory,
    geometry::Vec3,
    pipeline::TickOutcome,
    pose_estimation::{AnchorIndices, PoseEstimator},
    strategies::StrategyKind,
    transform::ModelParams,
};
use std::f64::consts::FRAC_PI_2;
use test_helpers::{assert_vec3_finite, SyntheticHead, EYE_HALF_SPAN, FRAME};

fn config_with(strategy: StrategyKind) -> Config {
    let mut config = Config::default();
    config.tracking.strategy = strategy;
    config
}

#[test]
fn test_frontal_face_transform() {
    let config = Config::default();
    let projector = config.projector();
    let mut session = config.build_session().unwrap();

    let face = SyntheticHead::frontal().face(&projector);
    let transform = *session.update(Some(&face), Some(FRAME)).unwrap();

    assert!(transform.quaternion.angle() < 1e-6);
    assert!(transform.position.norm() < 1e-9, "position {:?}", transform.position);
    assert!((transform.scale - 2.0 * EYE_HALF_SPAN).abs() < 1e-9);

    let info = transform.distance_info;
    assert!((info.raw - 2.0 * EYE_HALF_SPAN).abs() < 1e-9);
    assert!((info.ratio - 1.0).abs() < 1e-12);
    let range = info.range_m.unwrap();
    assert!((0.2..=3.5).contains(&range));
}

#[test]
fn test_turned_face_eases_yaw() {
    let config = Config::default();
    let projector = config.projector();
    let mut session = config.build_session().unwrap();

    let yaw = 30f64.to_radians();
    let face = SyntheticHead::turned(yaw).face(&projector);
    let transform = *session.update(Some(&face), Some(FRAME)).unwrap();

    // Default yaw curve maps t = 1/3 to 0.2 + 0.23 * (0.18333 / 0.2)
    let expected = (0.2 + 0.23 * ((1.0 / 3.0 - 0.15) / 0.2)) * FRAC_PI_2;
    let (axis, angle) = transform.quaternion.axis_angle().unwrap();
    assert!((angle - expected).abs() < 1e-6, "angle {angle} vs {expected}");
    assert!((axis.into_inner() - Vec3::y()).norm() < 1e-6);

    // Lateral and forward shifts both push a left turn toward +x
    assert!(transform.position.x > 0.0);
    assert!(transform.position.y.abs() < 1e-9);
    assert!((transform.distance_info.yaw_abs - yaw).abs() < 1e-9);
}

#[test]
fn test_estimator_recovers_raw_angles() {
    let config = Config::default();
    let projector = config.projector();
    let head = SyntheticHead {
        yaw: 0.3,
        pitch: -0.2,
        roll: 0.1,
        ..SyntheticHead::default()
    };
    let face = head.face(&projector);

    let estimate = PoseEstimator::default()
        .estimate_face(&face, &AnchorIndices::default(), &projector)
        .unwrap();
    assert!((estimate.raw.yaw - 0.3).abs() < 1e-9);
    assert!((estimate.raw.pitch + 0.2).abs() < 1e-9);
    assert!((estimate.raw.roll - 0.1).abs() < 1e-9);
    assert!(estimate.basis.is_orthonormal(1e-9));
}

#[test]
fn test_pitch_moves_glasses_vertically() {
    let config = Config::default();
    let projector = config.projector();
    let mut session = config.build_session().unwrap();

    let down = SyntheticHead {
        pitch: 0.25,
        ..SyntheticHead::default()
    };
    let transform = *session.update(Some(&down.face(&projector)), Some(FRAME)).unwrap();
    // Half of max pitch, eased with the pitch exponent, scaled by the intensity
    assert!(transform.position.y < 0.0);
    assert!(transform.position.y > -0.02);
}

#[test]
fn test_basic_strategy_amplifies_yaw() {
    let config = config_with(StrategyKind::BasicEuler);
    let projector = config.projector();
    let mut session = config.build_session().unwrap();
    assert_eq!(session.strategy_name(), "basic-euler");

    let face = SyntheticHead::turned(0.2).face(&projector);
    let first = session.update(Some(&face), Some(FRAME)).unwrap().quaternion.angle();
    // Half way from zero toward twice the raw yaw
    assert!((first - 0.2).abs() < 1e-9);

    for _ in 0..60 {
        session.update(Some(&face), Some(FRAME));
    }
    let settled = session.last_transform().unwrap().quaternion.angle();
    assert!((settled - 0.4).abs() < 1e-9);
}

#[test]
fn test_kalman_strategy_settles_on_steady_face() {
    let config = config_with(StrategyKind::KalmanFiltered);
    let projector = config.projector();
    let mut session = config.build_session().unwrap();

    let face = SyntheticHead::turned(0.4).face(&projector);
    let mut eased = config_with(StrategyKind::EasedQuaternion).build_session().unwrap();
    let target = *eased.update(Some(&face), Some(FRAME)).unwrap();

    for _ in 0..30 {
        session.update(Some(&face), Some(FRAME));
    }
    let transform = session.last_transform().unwrap();
    assert!(transform.quaternion.angle_to(&target.quaternion) < 1e-9);
    assert!((transform.position - target.position).norm() < 1e-9);
}

#[test]
fn test_all_strategies_produce_finite_transforms() {
    for kind in StrategyKind::ALL {
        let config = config_with(kind);
        let projector = config.projector();
        let mut session = config.build_session().unwrap();

        for step in 0..20 {
            let head = SyntheticHead {
                yaw: 0.05 * f64::from(step) - 0.5,
                pitch: 0.02 * f64::from(step) - 0.2,
                ..SyntheticHead::default()
            };
            let outcome = session.tick(Some(&head.face(&projector)), Some(FRAME));
            assert_eq!(outcome, TickOutcome::Updated, "{kind}");
        }
        let transform = session.last_transform().unwrap();
        assert_vec3_finite(&transform.position);
        assert!(transform.scale.is_finite() && transform.scale > 0.0);
    }
}

#[test]
fn test_model_params_apply_next_tick() {
    let config = Config::default();
    let projector = config.projector();
    let mut session = config.build_session().unwrap();
    let face = SyntheticHead::frontal().face(&projector);

    let before = *session.update(Some(&face), Some(FRAME)).unwrap();
    session
        .set_model_params(ModelParams::new(1.5, Vec3::new(0.0, 0.01, -0.02)))
        .unwrap();
    let after = *session.update(Some(&face), Some(FRAME)).unwrap();

    assert!((after.scale - before.scale * 1.5).abs() < 1e-12);
    assert!((after.position - before.position - Vec3::new(0.0, 0.01, -0.02)).norm() < 1e-12);

    // Invalid params are rejected and the old ones stay
    assert!(session.set_model_params(ModelParams::new(-1.0, Vec3::zeros())).is_err());
    assert!((session.model_params().scale_multiplier - 1.5).abs() < f64::EPSILON);
}

#[test]
fn test_closer_face_reads_nearer() {
    let config = Config::default();
    let projector = config.projector();
    let mut session = config.build_session().unwrap();

    let far = session
        .update(Some(&SyntheticHead::frontal().face(&projector)), Some(FRAME))
        .unwrap()
        .distance_info;
    let near_head = SyntheticHead {
        size: 3.0,
        ..SyntheticHead::default()
    };
    let near = session
        .update(Some(&near_head.face(&projector)), Some(FRAME))
        .unwrap()
        .distance_info;

    assert!(near.range_m.unwrap() < far.range_m.unwrap());
    assert_ne!(near.category, DistanceCategory::VeryFar);
    // Gain moves toward the bigger span, at most one step per tick
    assert!(near.ratio > far.ratio);
    assert!(near.ratio - far.ratio <= config.distance.gain_max_step + 1e-12);
}
