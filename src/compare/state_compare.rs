use nalgebra::{Matrix3, Vector3};

use crate::compare::FrameClass;
use crate::components::state::State;
use crate::oem_errors::OemError;
use crate::time::OemEpoch;

/// Difference between two states sharing epoch, frame and center.
///
/// All quantities are `target - origin`; the RIC frame is built on the origin state.
#[derive(Debug, Clone)]
pub struct StateCompare {
    origin: State,
    target: State,
    inertial: bool,
}

impl StateCompare {
    /// Compare `target` against `origin`.
    ///
    /// Return
    /// ----------
    /// * The compare, or [`OemError::IncompatibleCompare`] when epoch, frame or center differ.
    pub fn new(origin: State, target: State) -> Result<Self, OemError> {
        if origin.epoch != target.epoch
            || origin.frame != target.frame
            || origin.center != target.center
        {
            return Err(OemError::IncompatibleCompare(
                "Incompatible states: epoch, frame, or central body mismatch.".into(),
            ));
        }

        let inertial = match FrameClass::classify(&origin.frame) {
            FrameClass::Inertial => true,
            FrameClass::Rotating => false,
            FrameClass::Nonstandard => {
                tracing::warn!(frame = %origin.frame, "Nonstandard frame, assuming inertial");
                true
            }
        };

        Ok(StateCompare {
            origin,
            target,
            inertial,
        })
    }

    /// Treat the frame as inertial whatever its classification.
    pub fn assume_inertial(mut self) -> Self {
        self.inertial = true;
        self
    }

    pub fn is_inertial(&self) -> bool {
        self.inertial
    }

    pub fn epoch(&self) -> OemEpoch {
        self.origin.epoch
    }

    pub fn origin(&self) -> &State {
        &self.origin
    }

    pub fn target(&self) -> &State {
        &self.target
    }

    fn require_inertial(&self) -> Result<(), OemError> {
        if self.inertial {
            Ok(())
        } else {
            Err(OemError::UnsupportedFrameOperation(format!(
                "Velocity compares not supported for non-inertial frame '{}'",
                self.origin.frame
            )))
        }
    }

    /// Distance between the two positions.
    pub fn range(&self) -> f64 {
        self.position().norm()
    }

    /// Norm of the velocity difference.
    pub fn range_rate(&self) -> Result<f64, OemError> {
        Ok(self.velocity()?.norm())
    }

    /// Position difference in the input frame.
    pub fn position(&self) -> Vector3<f64> {
        self.target.position - self.origin.position
    }

    /// Velocity difference in the input frame.
    pub fn velocity(&self) -> Result<Vector3<f64>, OemError> {
        self.require_inertial()?;
        Ok(self.target.velocity - self.origin.velocity)
    }

    /// Rotation from the input frame to the RIC frame of the origin state.
    fn ric_rotation(&self) -> Result<Matrix3<f64>, OemError> {
        self.require_inertial()?;
        let r = self.origin.position;
        let cross_track = r.cross(&self.origin.velocity);
        let in_track = cross_track.cross(&r);
        Ok(Matrix3::from_rows(&[
            r.normalize().transpose(),
            in_track.normalize().transpose(),
            cross_track.normalize().transpose(),
        ]))
    }

    /// Position difference in the RIC frame.
    pub fn position_ric(&self) -> Result<Vector3<f64>, OemError> {
        Ok(self.ric_rotation()? * self.position())
    }

    /// Velocity difference in the rotating RIC frame.
    pub fn velocity_ric(&self) -> Result<Vector3<f64>, OemError> {
        let rotation = self.ric_rotation()?;
        let r = self.origin.position;
        let w = rotation * (r.cross(&self.origin.velocity) / r.norm_squared());
        let position_ric = rotation * self.position();
        Ok(rotation * self.velocity()? - w.cross(&position_ric))
    }
}

#[cfg(test)]
mod state_compare_test {
    use super::*;
    use crate::time::Calendar;
    use crate::version::OemVersion;
    use approx::assert_abs_diff_eq;

    fn state(frame: &str, position: [f64; 3], velocity: [f64; 3]) -> State {
        let epoch = OemEpoch::parse("2020-01-01T00:00:00", Calendar::Utc).unwrap();
        State::new(epoch, frame, "EARTH", &position, &velocity, None, OemVersion::V2_0).unwrap()
    }

    #[test]
    fn test_self_compare_is_zero() {
        let s = state("EME2000", [7000.0, 100.0, -50.0], [0.1, 7.5, 0.3]);
        let cmp = StateCompare::new(s.clone(), s).unwrap();
        assert_eq!(cmp.range(), 0.0);
        assert_eq!(cmp.range_rate().unwrap(), 0.0);
        assert_abs_diff_eq!(cmp.position_ric().unwrap(), Vector3::zeros(), epsilon = 1e-15);
        assert_abs_diff_eq!(cmp.velocity_ric().unwrap(), Vector3::zeros(), epsilon = 1e-15);
    }

    #[test]
    fn test_ric_axes() {
        let origin = state("EME2000", [7000.0, 0.0, 0.0], [0.0, 7.5, 0.0]);
        let target = state("EME2000", [7001.0, 2.0, 3.0], [0.0, 7.5, 0.0]);
        let cmp = StateCompare::new(origin, target).unwrap();
        assert_abs_diff_eq!(
            cmp.position_ric().unwrap(),
            Vector3::new(1.0, 2.0, 3.0),
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(cmp.range(), 14f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_rotating_frame_refused() {
        let origin = state("ITRF2008", [7000.0, 0.0, 0.0], [0.0, 7.5, 0.0]);
        let target = state("ITRF2008", [7001.0, 0.0, 0.0], [0.0, 7.5, 0.0]);
        let cmp = StateCompare::new(origin, target).unwrap();
        assert_eq!(cmp.range(), 1.0);
        assert!(matches!(
            cmp.range_rate(),
            Err(OemError::UnsupportedFrameOperation(_))
        ));
        assert!(cmp.position_ric().is_err());

        let forced = cmp.assume_inertial();
        assert!(forced.velocity_ric().is_ok());
    }

    #[test]
    fn test_incompatible_states() {
        let a = state("EME2000", [7000.0, 0.0, 0.0], [0.0, 7.5, 0.0]);
        let b = state("GCRF", [7000.0, 0.0, 0.0], [0.0, 7.5, 0.0]);
        assert!(matches!(
            StateCompare::new(a, b),
            Err(OemError::IncompatibleCompare(_))
        ));
    }
}
