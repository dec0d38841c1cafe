use itertools::Itertools;

use crate::components::state::State;
use crate::constraints::{require, Constraint, ConstraintSpec, Versioned};
use crate::oem_errors::OemError;
use crate::version::OemVersion;

/// Ordered state samples of one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSection {
    states: Vec<State>,
    version: OemVersion,
}

static DATA_CONSTRAINTS: ConstraintSpec<DataSection> = ConstraintSpec(&[
    Constraint::all("not_empty", check_not_empty),
    Constraint::all("uniform_acceleration", check_uniform_acceleration),
    Constraint::all("increasing_epochs", check_increasing_epochs),
]);

fn check_not_empty(data: &DataSection) -> Result<(), OemError> {
    require(!data.states.is_empty(), || {
        "Data section contains no states".into()
    })
}

fn check_uniform_acceleration(data: &DataSection) -> Result<(), OemError> {
    let has_accel = data.has_accel();
    require(
        data.states.iter().all(|state| state.has_accel() == has_accel),
        || "Inconsistent use of acceleration in data section".into(),
    )
}

fn check_increasing_epochs(data: &DataSection) -> Result<(), OemError> {
    match data
        .states
        .iter()
        .tuple_windows()
        .find(|(a, b)| a.epoch >= b.epoch)
    {
        Some((_, b)) => Err(OemError::Validation(format!(
            "States are not strictly increasing in time at {}",
            b.epoch
        ))),
        None => Ok(()),
    }
}

impl Versioned for DataSection {
    fn version(&self) -> OemVersion {
        self.version
    }
}

impl DataSection {
    pub fn new(states: Vec<State>, version: OemVersion) -> Result<Self, OemError> {
        let section = DataSection { states, version };
        DATA_CONSTRAINTS.apply(&section)?;
        Ok(section)
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// Acceleration presence, as given by the first state.
    pub fn has_accel(&self) -> bool {
        self.states.first().is_some_and(State::has_accel)
    }

    pub(crate) fn states_mut(&mut self) -> &mut [State] {
        &mut self.states
    }
}
