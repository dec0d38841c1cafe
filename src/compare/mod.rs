//! # Ephemeris comparison
//!
//! Differences between two ephemerides, expressed in the frame of the inputs or in
//! the radial / in-track / cross-track (RIC) frame of the origin state.
//!
//! Overview
//! -----------------
//! * [`state_compare::StateCompare`]: two states at the same epoch, frame and center.
//! * [`segment_compare::SegmentCompare`]: two segments over their common useable span.
//! * [`ephemeris_compare::EphemerisCompare`]: every overlapping segment pair of two messages.
//!
//! Velocity and RIC quantities are only meaningful in inertial frames. Frames are
//! classified from fixed allow-lists; an unknown frame is treated as inertial and a
//! warning is logged.
pub mod ephemeris_compare;
pub mod segment_compare;
pub mod state_compare;

use crate::constants::{INERTIAL_FRAMES, ROTATING_FRAMES};

/// Kind of a reference frame, as far as the compare engine is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameClass {
    Inertial,
    Rotating,
    /// Not in either allow-list; handled as inertial.
    Nonstandard,
}

impl FrameClass {
    pub fn classify(frame: &str) -> FrameClass {
        let frame = frame.trim().to_ascii_uppercase();
        if INERTIAL_FRAMES.contains(&frame.as_str()) {
            FrameClass::Inertial
        } else if ROTATING_FRAMES.contains(&frame.as_str()) {
            FrameClass::Rotating
        } else {
            FrameClass::Nonstandard
        }
    }

    pub fn is_inertial(&self) -> bool {
        !matches!(self, FrameClass::Rotating)
    }
}
