use approx::assert_abs_diff_eq;
use nalgebra::Vector3;
use oem::compare::ephemeris_compare::EphemerisCompare;
use oem::compare::segment_compare::SegmentCompare;
use oem::oem_errors::OemError;

mod common;
use common::{load, mean_motion, utc, RADIUS};

/// The target file is the origin orbit shifted half a second ahead in phase.
fn phase_shift() -> f64 {
    0.5 * mean_motion()
}

#[test]
fn test_phase_shifted_orbit() {
    let origin = load("compare_origin.oem");
    let target = load("compare_target.oem");
    let compare = EphemerisCompare::new(&origin, &target);
    assert!(!compare.is_empty());
    assert_eq!(compare.segments().len(), 1);

    let shift = phase_shift();
    let expected_ric = Vector3::new(RADIUS * (shift.cos() - 1.0), RADIUS * shift.sin(), 0.0);

    for epoch in ["2020-01-01T00:00:00", "2020-01-01T00:12:34.5", "2020-01-01T01:00:00"] {
        let state_compare = compare.evaluate(utc(epoch)).unwrap();
        assert!(state_compare.is_inertial());
        assert_abs_diff_eq!(
            state_compare.range(),
            2.0 * RADIUS * (shift / 2.0).sin(),
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(
            state_compare.position_ric().unwrap(),
            expected_ric,
            epsilon = 1e-6
        );
        // relative motion is frozen in the rotating RIC frame
        assert_abs_diff_eq!(
            state_compare.velocity_ric().unwrap(),
            Vector3::zeros(),
            epsilon = 1e-8
        );
        assert_abs_diff_eq!(
            state_compare.range_rate().unwrap(),
            RADIUS * mean_motion() * shift,
            epsilon = 1e-6
        );
    }
}

#[test]
fn test_self_compare() {
    let origin = load("compare_origin.oem");
    let compare = EphemerisCompare::new(&origin, &origin);
    let results = compare
        .steps(600.0)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(results.len(), 7);
    for result in results {
        assert_eq!(result.range(), 0.0);
        assert_eq!(result.range_rate().unwrap(), 0.0);
    }
}

#[test]
fn test_compare_window_is_overlap() {
    let origin = load("circular_v2.oem");
    let target = load("compare_origin.oem");
    let compare = EphemerisCompare::new(&origin, &target);
    assert_eq!(compare.segments().len(), 2);

    let segment = SegmentCompare::new(&origin.segments()[1], &target.segments()[0]).unwrap();
    assert_eq!(
        segment.span(),
        Some((utc("2020-01-01T01:00:00"), utc("2020-01-01T01:00:00")))
    );

    assert!(compare.contains(utc("2020-01-01T00:30:00")));
    assert!(!compare.contains(utc("2020-01-01T01:30:00")));
    assert!(matches!(
        compare.evaluate(utc("2020-01-01T01:30:00")),
        Err(OemError::OutOfRange(_))
    ));

    // same orbit sampled differently
    let state_compare = compare.evaluate(utc("2020-01-01T00:30:30")).unwrap();
    assert_abs_diff_eq!(state_compare.range(), 0.0, epsilon = 1e-6);
}

#[test]
fn test_incompatible_frames() {
    let origin = load("compare_origin.oem");
    let other = load("linear_v1.oem");
    assert!(matches!(
        SegmentCompare::new(&origin.segments()[0], &other.segments()[0]),
        Err(OemError::IncompatibleCompare(_))
    ));
    assert!(EphemerisCompare::new(&origin, &other).is_empty());
}
