use crate::BridgeError;
use crate::bridge::solver::{DRIFT_TOLERANCE, check_drift, heading_velocity, pre_position, re_aim};
use crate::mobility::Vector;

const EPS: f64 = 1e-9;

fn assert_close(a: Vector, b: Vector) {
    assert!(
        (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS,
        "expected {b}, got {a}"
    );
}

#[test]
fn heading_follows_sumo_convention() {
    assert_close(heading_velocity(10.0, 0.0), Vector::xy(0.0, 10.0));
    assert_close(heading_velocity(10.0, 90.0), Vector::xy(10.0, 0.0));
    assert_close(heading_velocity(10.0, 180.0), Vector::xy(0.0, -10.0));
    assert_close(heading_velocity(10.0, 270.0), Vector::xy(-10.0, 0.0));
}

#[test]
fn pre_position_round_trips_to_target() {
    let cases = [
        (Vector::xy(100.0, 0.0), 10.0, 90.0, 1.0),
        (Vector::xy(-42.5, 17.25), 13.9, 33.0, 0.5),
        (Vector::xy(5.0, 5.0), 0.0, 200.0, 2.0),
        (Vector::xy(1e4, -3e3), 27.7, 359.9, 0.1),
    ];
    for (target, speed, heading, tta) in cases {
        let (initial, velocity) = pre_position(target, speed, heading, tta).expect("pre_position");
        assert_close(initial + velocity * tta, target);
        assert!((velocity.planar_norm() - speed).abs() < EPS);
    }
}

#[test]
fn pre_position_rejects_non_positive_interval() {
    for tta in [0.0, -1.0, f64::NAN] {
        let err = pre_position(Vector::xy(1.0, 1.0), 5.0, 0.0, tta).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidInterval { .. }), "{err:?}");
    }
}

#[test]
fn re_aim_without_drift_lands_on_target() {
    let p = Vector::xy(12.0, -4.0);
    let target = Vector::xy(20.5, 3.0);
    let elapsed = 0.5;

    let v = re_aim(p, p, target, elapsed, 99.0).expect("re_aim");
    assert_close(v, Vector::xy(17.0, 14.0));
    assert_close(p + v * elapsed, target);
}

#[test]
fn re_aim_uses_actual_position_not_reference() {
    let reference = Vector::xy(100.0, 0.0);
    let actual = Vector::xy(100.05, -0.05);
    let v = re_aim(reference, actual, Vector::xy(110.05, -0.05), 1.0, 10.0).expect("re_aim");
    assert_close(v, Vector::xy(10.0, 0.0));
}

#[test]
fn drift_tolerance_boundary() {
    let reference = Vector::xy(100.0, 50.0);
    let just_inside = DRIFT_TOLERANCE - 1e-6;

    check_drift(reference, Vector::xy(100.0 + just_inside, 50.0)).expect("x inside tolerance");
    check_drift(reference, Vector::xy(100.0, 50.0 - just_inside)).expect("y inside tolerance");

    let err = check_drift(reference, Vector::xy(100.0 + DRIFT_TOLERANCE + 1e-6, 50.0)).unwrap_err();
    assert!(matches!(err, BridgeError::DriftExceeded { .. }), "{err:?}");
    let err = check_drift(reference, Vector::xy(100.0, 50.0 - 0.5)).unwrap_err();
    assert!(matches!(err, BridgeError::DriftExceeded { .. }), "{err:?}");
}

#[test]
fn re_aim_reports_drift_before_interval() {
    let err = re_aim(Vector::xy(0.0, 0.0), Vector::xy(1.0, 0.0), Vector::xy(2.0, 0.0), 0.0, 1.0).unwrap_err();
    match err {
        BridgeError::DriftExceeded { expected, actual } => {
            assert_eq!(expected, Vector::xy(0.0, 0.0));
            assert_eq!(actual, Vector::xy(1.0, 0.0));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let p = Vector::xy(3.0, 3.0);
    let err = re_aim(p, p, Vector::xy(4.0, 3.0), -0.5, 1.0).unwrap_err();
    assert!(matches!(err, BridgeError::InvalidInterval { .. }), "{err:?}");
}

#[test]
fn car1_pre_position_then_re_aim() {
    // t=0: observed at (100, 0), speed 10, heading 90°, arriving in 1s
    let (initial, velocity) = pre_position(Vector::xy(100.0, 0.0), 10.0, 90.0, 1.0).expect("pre_position");
    assert_close(velocity, Vector::xy(10.0, 0.0));
    assert_close(initial, Vector::xy(90.0, 0.0));

    // t=1: the node sits on the reference; next observation at (110, 0)
    let arrived = initial + velocity * 1.0;
    let v = re_aim(Vector::xy(100.0, 0.0), arrived, Vector::xy(110.0, 0.0), 1.0, 10.0).expect("re_aim");
    assert_close(v, Vector::xy(10.0, 0.0));
}
