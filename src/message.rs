//! # Orbit Ephemeris Message
//!
//! [`EphemerisMessage`] is the entry point of the crate: it is read from KVN or XML
//! text (or a file), validated as a whole, sampled at arbitrary epochs and written
//! back in either encoding.
//!
//! ## Example
//! ```rust,no_run
//! use camino::Utf8Path;
//! use oem::message::EphemerisMessage;
//! use oem::parser::FileFormat;
//!
//! let message = EphemerisMessage::open(Utf8Path::new("ephemeris.oem")).unwrap();
//! let (start, stop) = message.span();
//! let state = message.evaluate(start.add_seconds(0.5 * (stop - start))).unwrap();
//! println!("{} {}", state.epoch, state.position);
//!
//! message.save_as(Utf8Path::new("ephemeris.xml"), FileFormat::Xml).unwrap();
//! ```
use std::str::FromStr;

use camino::Utf8Path;
use itertools::Itertools;

use crate::components::covariance::Covariance;
use crate::components::segment::EphemerisSegment;
use crate::components::state::State;
use crate::constraints::{require, Constraint, ConstraintSpec, Versioned};
use crate::oem_errors::OemError;
use crate::parser::kvn::KvnReader;
use crate::parser::xml::XmlReader;
use crate::parser::{FileFormat, OemReader, RawOem};
use crate::sections::header::HeaderSection;
use crate::serializer;
use crate::time::OemEpoch;
use crate::version::OemVersion;

/// A complete OEM: one header and an ordered, non-empty list of segments.
#[derive(Debug, Clone, PartialEq)]
pub struct EphemerisMessage {
    header: HeaderSection,
    segments: Vec<EphemerisSegment>,
    version: OemVersion,
}

static MESSAGE_CONSTRAINTS: ConstraintSpec<EphemerisMessage> = ConstraintSpec(&[
    Constraint::all("has_segments", check_has_segments),
    Constraint::all("segment_versions", check_segment_versions),
    Constraint::all("fixed_time_system", check_time_system),
    Constraint::only(
        "fixed_object",
        &[OemVersion::V2_0, OemVersion::V3_0],
        check_object,
    ),
    Constraint::all("segments_ordered", check_segment_order),
]);

fn check_has_segments(message: &EphemerisMessage) -> Result<(), OemError> {
    require(!message.segments.is_empty(), || {
        "OEM contains no segments".into()
    })
}

fn check_segment_versions(message: &EphemerisMessage) -> Result<(), OemError> {
    require(
        message
            .segments
            .iter()
            .all(|segment| segment.version() == message.version),
        || format!("Segment version differs from header version {}", message.version),
    )
}

fn check_time_system(message: &EphemerisMessage) -> Result<(), OemError> {
    require(
        message
            .segments
            .iter()
            .map(|segment| segment.metadata().time_system())
            .all_equal(),
        || "TIME_SYSTEM not fixed in OEM".into(),
    )
}

fn check_object(message: &EphemerisMessage) -> Result<(), OemError> {
    let metadata = || message.segments.iter().map(EphemerisSegment::metadata);
    require(metadata().map(|m| m.object_name()).all_equal(), || {
        "OBJECT_NAME not fixed in OEM".into()
    })?;
    require(metadata().map(|m| m.object_id()).all_equal(), || {
        "OBJECT_ID not fixed in OEM".into()
    })
}

/// Segments follow each other without overlap.
///
/// Version 1.0 compares `STOP_TIME`/`START_TIME`, later versions the useable span.
fn check_segment_order(message: &EphemerisMessage) -> Result<(), OemError> {
    let ordered = message.segments.iter().tuple_windows().all(|(a, b)| {
        if message.version == OemVersion::V1_0 {
            a.metadata().stop_time() <= b.metadata().start_time()
        } else {
            a.useable_stop_time() <= b.useable_start_time()
        }
    });
    require(ordered, || "Data section state epochs overlap".into())
}

impl Versioned for EphemerisMessage {
    fn version(&self) -> OemVersion {
        self.version
    }
}

impl EphemerisMessage {
    /// Assemble and validate a message. The header version applies to the whole message.
    pub fn new(header: HeaderSection, segments: Vec<EphemerisSegment>) -> Result<Self, OemError> {
        let message = EphemerisMessage {
            version: header.version(),
            header,
            segments,
        };
        MESSAGE_CONSTRAINTS.apply(&message)?;
        Ok(message)
    }

    /// Build the typed message from the output of a reader, running every rule.
    pub fn from_raw(raw: RawOem) -> Result<Self, OemError> {
        let header = HeaderSection::from_raw(&raw.header)?;
        let version = header.version();
        let segments = raw
            .segments
            .iter()
            .map(|segment| EphemerisSegment::from_raw(segment, version))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(header, segments)
    }

    pub fn from_kvn_str(content: &str) -> Result<Self, OemError> {
        Self::from_raw(KvnReader.read(content)?)
    }

    pub fn from_xml_str(content: &str) -> Result<Self, OemError> {
        Self::from_raw(XmlReader.read(content)?)
    }

    /// Parse `content` in the encoding detected from its first non-blank character.
    pub fn from_str_auto(content: &str) -> Result<Self, OemError> {
        let format = FileFormat::detect(content);
        tracing::debug!(%format, "OEM format detected");
        Self::from_raw(format.reader().read(content)?)
    }

    /// Read and validate an OEM file, KVN or XML.
    pub fn open(path: &Utf8Path) -> Result<Self, OemError> {
        let content = std::fs::read_to_string(path)?;
        let message = Self::from_str_auto(&content)?;
        tracing::info!(
            %path,
            version = %message.version,
            segments = message.segments.len(),
            "OEM loaded"
        );
        Ok(message)
    }

    pub fn to_kvn_string(&self) -> String {
        serializer::kvn::to_kvn(self)
    }

    pub fn to_xml_string(&self) -> Result<String, OemError> {
        serializer::xml::to_xml(self)
    }

    pub fn to_string_as(&self, format: FileFormat) -> Result<String, OemError> {
        serializer::write(self, format)
    }

    /// Write the message to `path` in `format`.
    pub fn save_as(&self, path: &Utf8Path, format: FileFormat) -> Result<(), OemError> {
        std::fs::write(path, self.to_string_as(format)?)?;
        tracing::info!(%path, %format, "OEM saved");
        Ok(())
    }

    /// Re-encode the file at `input` into `output`.
    ///
    /// `format` is the name of the output encoding, `kvn` or `xml`.
    pub fn convert(input: &Utf8Path, output: &Utf8Path, format: &str) -> Result<(), OemError> {
        let format = FileFormat::from_str(format)?;
        Self::open(input)?.save_as(output, format)
    }

    pub fn header(&self) -> &HeaderSection {
        &self.header
    }

    pub fn segments(&self) -> &[EphemerisSegment] {
        &self.segments
    }

    pub fn version(&self) -> OemVersion {
        self.version
    }

    /// States of every segment, in order.
    pub fn states(&self) -> Vec<&State> {
        self.segments
            .iter()
            .flat_map(EphemerisSegment::states)
            .collect()
    }

    /// Covariance entries of every segment, in order.
    pub fn covariances(&self) -> Vec<&Covariance> {
        self.segments
            .iter()
            .flat_map(EphemerisSegment::covariances)
            .collect()
    }

    /// `(earliest useable start, latest useable stop)` over all segments.
    pub fn span(&self) -> (OemEpoch, OemEpoch) {
        let first = &self.segments[0];
        self.segments.iter().skip(1).fold(first.span(), |(start, stop), segment| {
            (
                start.min(segment.useable_start_time()),
                stop.max(segment.useable_stop_time()),
            )
        })
    }

    /// `true` when some segment's useable span contains `epoch`.
    pub fn contains(&self, epoch: OemEpoch) -> bool {
        self.segments.iter().any(|segment| segment.contains(epoch))
    }

    /// Interpolated state at `epoch`, from the first segment covering it.
    pub fn evaluate(&self, epoch: OemEpoch) -> Result<State, OemError> {
        self.segments
            .iter()
            .find(|segment| segment.contains(epoch))
            .ok_or_else(|| OemError::OutOfRange(format!("{epoch} not contained in OEM")))?
            .evaluate(epoch)
    }

    /// Fixed-step samples of every segment, in order.
    pub fn steps(
        &self,
        step: f64,
    ) -> Result<impl Iterator<Item = Result<State, OemError>> + '_, OemError> {
        let iterators = self
            .segments
            .iter()
            .map(|segment| segment.steps(step))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(iterators.into_iter().flatten())
    }

    /// Resample every segment in place at a fixed step.
    ///
    /// On failure the message is left unchanged.
    pub fn resample(&mut self, step: f64) -> Result<(), OemError> {
        *self = self.resampled(step)?;
        Ok(())
    }

    /// Resampled copy of this message; `self` is left untouched.
    pub fn resampled(&self, step: f64) -> Result<Self, OemError> {
        let mut copy = self.clone();
        copy.segments
            .iter_mut()
            .try_for_each(|segment| segment.resample(step))?;
        Ok(copy)
    }
}

impl FromStr for EphemerisMessage {
    type Err = OemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_auto(s)
    }
}
