pub mod compare;
pub mod components;
pub mod constants;
pub mod constraints;
mod conversion;
pub mod interpolation;
pub mod message;
pub mod oem_errors;
pub mod parser;
pub mod schema;
pub mod sections;
pub mod serializer;
pub mod time;
pub mod version;

pub use compare::ephemeris_compare::EphemerisCompare;
pub use compare::segment_compare::SegmentCompare;
pub use compare::state_compare::StateCompare;
pub use components::covariance::Covariance;
pub use components::segment::EphemerisSegment;
pub use components::state::State;
pub use message::EphemerisMessage;
pub use oem_errors::OemError;
pub use parser::FileFormat;
pub use time::{OemEpoch, TimeSystem};
pub use version::OemVersion;
