//! Typed OEM entities below the message level.
//!
//! A [`segment::EphemerisSegment`] owns its metadata, a [`data_section::DataSection`]
//! of [`state::State`] samples and an optional
//! [`covariance_section::CovarianceSection`]. Every entity validates itself on
//! construction against the rules of its OEM version.
pub mod covariance;
pub mod covariance_section;
pub mod data_section;
pub mod segment;
pub mod state;
