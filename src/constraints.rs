//! Declarative, version-scoped validation rules.
//!
//! Every validated entity (metadata, data section, covariance section, segment,
//! message) exposes a static table of [`Constraint`]s. Each rule names the OEM
//! versions it applies to; [`ConstraintSpec::apply`] runs the applicable rules in
//! declaration order and stops at the first failure.
//!
//! ```rust,ignore
//! static RULES: ConstraintSpec<MetaData> = ConstraintSpec(&[
//!     Constraint::all("start_before_stop", check_start_stop),
//!     Constraint::only("no_ref_frame_epoch", &[OemVersion::V1_0], check_ref_frame_epoch),
//! ]);
//! RULES.apply(&metadata)?;
//! ```
use crate::oem_errors::OemError;
use crate::version::OemVersion;

/// Entities that carry the OEM version they were built for.
pub trait Versioned {
    fn version(&self) -> OemVersion;
}

/// Versions a rule applies to.
#[derive(Debug, Clone, Copy)]
pub enum Versions {
    All,
    Only(&'static [OemVersion]),
}

impl Versions {
    pub fn contains(&self, version: OemVersion) -> bool {
        match self {
            Versions::All => true,
            Versions::Only(list) => list.contains(&version),
        }
    }
}

/// A single named rule over `T`.
pub struct Constraint<T: 'static> {
    pub name: &'static str,
    pub versions: Versions,
    pub check: fn(&T) -> Result<(), OemError>,
}

impl<T> Constraint<T> {
    pub const fn all(name: &'static str, check: fn(&T) -> Result<(), OemError>) -> Self {
        Constraint {
            name,
            versions: Versions::All,
            check,
        }
    }

    pub const fn only(
        name: &'static str,
        versions: &'static [OemVersion],
        check: fn(&T) -> Result<(), OemError>,
    ) -> Self {
        Constraint {
            name,
            versions: Versions::Only(versions),
            check,
        }
    }
}

/// Ordered rule table for `T`.
pub struct ConstraintSpec<T: 'static>(pub &'static [Constraint<T>]);

impl<T: Versioned> ConstraintSpec<T> {
    /// Run every rule applicable to `target.version()`.
    pub fn apply(&self, target: &T) -> Result<(), OemError> {
        let version = target.version();
        for constraint in self.0.iter().filter(|c| c.versions.contains(version)) {
            (constraint.check)(target).inspect_err(|err| {
                tracing::debug!(rule = constraint.name, %version, error = %err, "Constraint failed");
            })?;
        }
        Ok(())
    }
}

/// Shorthand used by rule bodies.
pub(crate) fn require(condition: bool, message: impl FnOnce() -> String) -> Result<(), OemError> {
    if condition {
        Ok(())
    } else {
        Err(OemError::Validation(message()))
    }
}
