//! # Constants and defaults for the OEM library
//!
//! This module centralizes the **format constants**, **interpolation defaults** and
//! **reference-frame tables** used throughout the crate.
//!
//! ## Overview
//!
//! - Output precision of floating values and epochs
//! - Default interpolation settings applied when a segment declares none
//! - KVN section keywords
//! - Inertial / rotating frame allow-lists used by the compare engine
//! - Covariance element names and their (row, col) positions

// -------------------------------------------------------------------------------------------------
// Format defaults
// -------------------------------------------------------------------------------------------------

/// Number of fractional digits written for floating values (`+d.dddddddddddddde+XX`)
pub const FLOAT_FRACTION_DIGITS: usize = 14;

/// Number of fractional-second digits written for epochs
pub const EPOCH_FRACTION_DIGITS: usize = 6;

// -------------------------------------------------------------------------------------------------
// Interpolation defaults
// -------------------------------------------------------------------------------------------------

/// Interpolation method used when the metadata has no `INTERPOLATION` keyword
pub const DEFAULT_INTERPOLATION: &str = "LAGRANGE";

/// Interpolation degree used when the metadata has no `INTERPOLATION` keyword
pub const DEFAULT_INTERPOLATION_DEGREE: u32 = 5;

// -------------------------------------------------------------------------------------------------
// KVN keywords
// -------------------------------------------------------------------------------------------------

pub const VERSION_KEY: &str = "CCSDS_OEM_VERS";
pub const META_START: &str = "META_START";
pub const META_STOP: &str = "META_STOP";
pub const COVARIANCE_START: &str = "COVARIANCE_START";
pub const COVARIANCE_STOP: &str = "COVARIANCE_STOP";
pub const COMMENT: &str = "COMMENT";

// -------------------------------------------------------------------------------------------------
// Reference frames
// -------------------------------------------------------------------------------------------------

/// Frames treated as inertial by the compare engine
pub const INERTIAL_FRAMES: [&str; 6] = ["EME2000", "GCRF", "ICRF", "MCI", "TEME", "TOD"];

/// Frames treated as rotating; velocity and RIC compares are refused for these
pub const ROTATING_FRAMES: [&str; 9] = [
    "GRC", "ITRF2000", "ITRF-93", "ITRF-97", "ITRF2005", "ITRF2008", "ITRF2014", "ITRF2020", "TDR",
];

// -------------------------------------------------------------------------------------------------
// Covariance layout
// -------------------------------------------------------------------------------------------------

/// Number of elements of the lower triangle of a 6x6 covariance
pub const COVARIANCE_TRIANGLE_LEN: usize = 21;

/// XML element names of the covariance lower triangle, in row-major order.
///
/// The position of an entry in this table is also its index in the KVN
/// lower-triangular sequence (row 1 has one value, row 6 has six).
pub const COVARIANCE_KEYS: [(&str, usize, usize); COVARIANCE_TRIANGLE_LEN] = [
    ("CX_X", 0, 0),
    ("CY_X", 1, 0),
    ("CY_Y", 1, 1),
    ("CZ_X", 2, 0),
    ("CZ_Y", 2, 1),
    ("CZ_Z", 2, 2),
    ("CX_DOT_X", 3, 0),
    ("CX_DOT_Y", 3, 1),
    ("CX_DOT_Z", 3, 2),
    ("CX_DOT_X_DOT", 3, 3),
    ("CY_DOT_X", 4, 0),
    ("CY_DOT_Y", 4, 1),
    ("CY_DOT_Z", 4, 2),
    ("CY_DOT_X_DOT", 4, 3),
    ("CY_DOT_Y_DOT", 4, 4),
    ("CZ_DOT_X", 5, 0),
    ("CZ_DOT_Y", 5, 1),
    ("CZ_DOT_Z", 5, 2),
    ("CZ_DOT_X_DOT", 5, 3),
    ("CZ_DOT_Y_DOT", 5, 4),
    ("CZ_DOT_Z_DOT", 5, 5),
];

/// XML element names of a state vector, position and velocity first
pub const STATE_VECTOR_KEYS: [&str; 6] = ["X", "Y", "Z", "X_DOT", "Y_DOT", "Z_DOT"];

/// XML element names of the optional acceleration components
pub const ACCELERATION_KEYS: [&str; 3] = ["X_DDOT", "Y_DDOT", "Z_DDOT"];
