use std::sync::Arc;

use nalgebra::{DVector, Vector3};

use crate::constraints::{require, Constraint, ConstraintSpec, Versioned};
use crate::oem_errors::OemError;
use crate::time::OemEpoch;
use crate::version::OemVersion;

/// Cartesian state of the object at one epoch.
///
/// Frame and center names are shared across every state of a segment.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub epoch: OemEpoch,
    pub frame: Arc<str>,
    pub center: Arc<str>,
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub acceleration: Option<Vector3<f64>>,
    pub version: OemVersion,
}

static STATE_CONSTRAINTS: ConstraintSpec<State> = ConstraintSpec(&[Constraint::only(
    "no_acceleration",
    &[OemVersion::V1_0],
    check_no_acceleration,
)]);

fn check_no_acceleration(state: &State) -> Result<(), OemError> {
    require(state.acceleration.is_none(), || {
        "Acceleration not supported in OEM v1.0".into()
    })
}

impl Versioned for State {
    fn version(&self) -> OemVersion {
        self.version
    }
}

fn vector3(values: &[f64], name: &str) -> Result<Vector3<f64>, OemError> {
    if values.len() != 3 {
        return Err(OemError::Dimension(format!(
            "{name} must have exactly 3 components, got {}",
            values.len()
        )));
    }
    Ok(Vector3::from_column_slice(values))
}

impl State {
    /// Build a state from component slices.
    ///
    /// Arguments
    /// -----------------
    /// * `epoch`, `frame`, `center`: labels of the state
    /// * `position`, `velocity`: 3 components each (km, km/s)
    /// * `acceleration`: optional 3 components (km/s²)
    /// * `version`: OEM version of the owning message
    ///
    /// Return
    /// ----------
    /// * The state, [`OemError::Dimension`] when a slice is not 3 long, or
    ///   [`OemError::Validation`] when acceleration is given for v1.0.
    pub fn new(
        epoch: OemEpoch,
        frame: impl Into<Arc<str>>,
        center: impl Into<Arc<str>>,
        position: &[f64],
        velocity: &[f64],
        acceleration: Option<&[f64]>,
        version: OemVersion,
    ) -> Result<Self, OemError> {
        let acceleration = acceleration
            .map(|values| vector3(values, "Acceleration"))
            .transpose()?;
        Self::from_vectors(
            epoch,
            frame,
            center,
            vector3(position, "Position")?,
            vector3(velocity, "Velocity")?,
            acceleration,
            version,
        )
    }

    pub fn from_vectors(
        epoch: OemEpoch,
        frame: impl Into<Arc<str>>,
        center: impl Into<Arc<str>>,
        position: Vector3<f64>,
        velocity: Vector3<f64>,
        acceleration: Option<Vector3<f64>>,
        version: OemVersion,
    ) -> Result<Self, OemError> {
        let state = State {
            epoch,
            frame: frame.into(),
            center: center.into(),
            position,
            velocity,
            acceleration,
            version,
        };
        STATE_CONSTRAINTS.apply(&state)?;
        Ok(state)
    }

    /// Build from a flat 6 or 9 component row (position, velocity, acceleration).
    pub(crate) fn from_row(
        epoch: OemEpoch,
        frame: &Arc<str>,
        center: &Arc<str>,
        values: &[f64],
        version: OemVersion,
    ) -> Result<Self, OemError> {
        match values.len() {
            6 => Self::new(
                epoch,
                frame.clone(),
                center.clone(),
                &values[0..3],
                &values[3..6],
                None,
                version,
            ),
            9 => Self::new(
                epoch,
                frame.clone(),
                center.clone(),
                &values[0..3],
                &values[3..6],
                Some(&values[6..9]),
                version,
            ),
            n => Err(OemError::Dimension(format!(
                "State vector must have 6 or 9 components, got {n}"
            ))),
        }
    }

    pub fn has_accel(&self) -> bool {
        self.acceleration.is_some()
    }

    /// Position, velocity and (when present) acceleration as one vector.
    pub fn vector(&self) -> DVector<f64> {
        let mut values: Vec<f64> = self
            .position
            .iter()
            .chain(self.velocity.iter())
            .copied()
            .collect();
        if let Some(acceleration) = &self.acceleration {
            values.extend(acceleration.iter());
        }
        DVector::from_vec(values)
    }
}
