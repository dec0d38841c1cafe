use itertools::Itertools;

use crate::components::covariance::Covariance;
use crate::constraints::{Constraint, ConstraintSpec, Versioned};
use crate::oem_errors::OemError;
use crate::version::OemVersion;

/// Ordered covariance entries of one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct CovarianceSection {
    covariances: Vec<Covariance>,
    version: OemVersion,
}

// v3.0 lifts the ordering requirement on covariance entries.
static COVARIANCE_CONSTRAINTS: ConstraintSpec<CovarianceSection> =
    ConstraintSpec(&[Constraint::only(
        "increasing_epochs",
        &[OemVersion::V1_0, OemVersion::V2_0],
        check_increasing_epochs,
    )]);

fn check_increasing_epochs(section: &CovarianceSection) -> Result<(), OemError> {
    match section
        .covariances
        .iter()
        .tuple_windows()
        .find(|(a, b)| a.epoch >= b.epoch)
    {
        Some((_, b)) => Err(OemError::Validation(format!(
            "Covariance entries are not strictly increasing in time at {}",
            b.epoch
        ))),
        None => Ok(()),
    }
}

impl Versioned for CovarianceSection {
    fn version(&self) -> OemVersion {
        self.version
    }
}

impl CovarianceSection {
    pub fn new(covariances: Vec<Covariance>, version: OemVersion) -> Result<Self, OemError> {
        let section = CovarianceSection {
            covariances,
            version,
        };
        COVARIANCE_CONSTRAINTS.apply(&section)?;
        Ok(section)
    }

    pub fn covariances(&self) -> &[Covariance] {
        &self.covariances
    }

    pub fn is_empty(&self) -> bool {
        self.covariances.is_empty()
    }
}
