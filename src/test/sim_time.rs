use crate::sim::SimTime;

#[test]
fn sim_time_unit_conversions() {
    assert_eq!(SimTime::from_micros(1), SimTime(1_000));
    assert_eq!(SimTime::from_millis(1), SimTime(1_000_000));
    assert_eq!(SimTime::from_secs(1), SimTime(1_000_000_000));
}

#[test]
fn sim_time_unit_conversions_saturate_on_overflow() {
    assert_eq!(SimTime::from_micros(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime::from_millis(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime::from_secs(u64::MAX), SimTime(u64::MAX));
}

#[test]
fn sim_time_converts_fractional_seconds() {
    assert_eq!(SimTime::from_secs_f64(1.5), SimTime(1_500_000_000));
    assert_eq!(SimTime::from_secs_f64(0.1), SimTime(100_000_000));
    assert_eq!(SimTime::from_secs_f64(-3.0), SimTime::ZERO);
    assert_eq!(SimTime::from_secs_f64(f64::NAN), SimTime::ZERO);
    assert!((SimTime(2_250_000_000).as_secs_f64() - 2.25).abs() < 1e-12);
}
