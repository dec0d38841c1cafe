//! Format revisions of the Orbit Ephemeris Message.
//!
//! Each entity records the version it was built for; the schema registry and
//! the constraint engine use it to select fields and rules.
//!
//! ```rust
//! use std::str::FromStr;
//! use oem::version::OemVersion;
//!
//! let v = OemVersion::from_str("2.0").unwrap();
//! assert_eq!(v, OemVersion::V2_0);
//! assert_eq!(v.to_string(), "2.0");
//! ```
use std::fmt;
use std::str::FromStr;

use crate::oem_errors::OemError;

/// Supported `CCSDS_OEM_VERS` values, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OemVersion {
    V1_0,
    V2_0,
    V3_0,
}

impl OemVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            OemVersion::V1_0 => "1.0",
            OemVersion::V2_0 => "2.0",
            OemVersion::V3_0 => "3.0",
        }
    }
}

impl FromStr for OemVersion {
    type Err = OemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1.0" => Ok(OemVersion::V1_0),
            "2.0" => Ok(OemVersion::V2_0),
            "3.0" => Ok(OemVersion::V3_0),
            other => Err(OemError::Validation(format!(
                "Unsupported OEM version: '{other}'"
            ))),
        }
    }
}

impl fmt::Display for OemVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod version_test {
    use super::*;

    #[test]
    fn test_parse_versions() {
        assert_eq!("1.0".parse::<OemVersion>().unwrap(), OemVersion::V1_0);
        assert_eq!(" 3.0 ".parse::<OemVersion>().unwrap(), OemVersion::V3_0);
        assert!("2.1".parse::<OemVersion>().is_err());
        assert!(OemVersion::V1_0 < OemVersion::V2_0);
    }
}
