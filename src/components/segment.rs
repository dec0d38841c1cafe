use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::components::covariance::Covariance;
use crate::components::covariance_section::CovarianceSection;
use crate::components::data_section::DataSection;
use crate::components::state::State;
use crate::constraints::{require, Constraint, ConstraintSpec, Versioned};
use crate::interpolation::EphemerisInterpolator;
use crate::oem_errors::OemError;
use crate::parser::RawSegment;
use crate::sections::metadata::MetaData;
use crate::time::{parse_epoch, OemEpoch, TimeRange};
use crate::version::OemVersion;

/// One metadata block with its states and optional covariance entries.
///
/// The interpolator is built on the first sampling query and kept for the
/// lifetime of the segment; resampling drops it.
pub struct EphemerisSegment {
    metadata: MetaData,
    data: DataSection,
    covariance: Option<CovarianceSection>,
    version: OemVersion,
    interpolator: OnceCell<EphemerisInterpolator>,
}

static SEGMENT_CONSTRAINTS: ConstraintSpec<EphemerisSegment> = ConstraintSpec(&[
    Constraint::all("state_epochs_in_range", check_state_epochs),
    Constraint::only("no_covariance", &[OemVersion::V1_0], check_no_covariance),
    Constraint::all("covariance_epochs_in_range", check_covariance_epochs),
]);

fn check_state_epochs(segment: &EphemerisSegment) -> Result<(), OemError> {
    let (start, stop) = (segment.metadata.start_time(), segment.metadata.stop_time());
    match segment
        .states()
        .iter()
        .find(|state| state.epoch < start || state.epoch > stop)
    {
        Some(state) => Err(OemError::Validation(format!(
            "State epoch not within usable range: {}",
            state.epoch
        ))),
        None => Ok(()),
    }
}

fn check_no_covariance(segment: &EphemerisSegment) -> Result<(), OemError> {
    require(segment.covariance.is_none(), || {
        "Covariance data block not supported in OEM v1.0".into()
    })
}

fn check_covariance_epochs(segment: &EphemerisSegment) -> Result<(), OemError> {
    let (start, stop) = (segment.metadata.start_time(), segment.metadata.stop_time());
    match segment
        .covariances()
        .iter()
        .find(|cov| cov.epoch < start || cov.epoch > stop)
    {
        Some(cov) => Err(OemError::Validation(format!(
            "Covariance epoch not within range: {}",
            cov.epoch
        ))),
        None => Ok(()),
    }
}

impl Versioned for EphemerisSegment {
    fn version(&self) -> OemVersion {
        self.version
    }
}

impl EphemerisSegment {
    /// Assemble and validate a segment.
    pub fn new(
        metadata: MetaData,
        data: DataSection,
        covariance: Option<CovarianceSection>,
    ) -> Result<Self, OemError> {
        let segment = EphemerisSegment {
            version: metadata.version(),
            metadata,
            data,
            covariance,
            interpolator: OnceCell::new(),
        };
        SEGMENT_CONSTRAINTS.apply(&segment)?;
        Ok(segment)
    }

    /// Build a segment from the raw reader output.
    ///
    /// Epochs are read in the calendar of the segment `TIME_SYSTEM`; covariance
    /// entries without a frame take the metadata `REF_FRAME`.
    pub fn from_raw(raw: &RawSegment, version: OemVersion) -> Result<Self, OemError> {
        let metadata = MetaData::from_raw(&raw.metadata, version)?;
        let time_system = metadata.time_system().clone();
        let frame: Arc<str> = Arc::from(metadata.ref_frame());
        let center: Arc<str> = Arc::from(metadata.center_name());

        let states = raw
            .states
            .iter()
            .map(|row| {
                let epoch = parse_epoch(&row.epoch, &time_system)?;
                State::from_row(epoch, &frame, &center, &row.values, version)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let data = DataSection::new(states, version)?;

        let covariance = if raw.covariances.is_empty() {
            None
        } else {
            let entries = raw
                .covariances
                .iter()
                .map(|entry| {
                    let epoch = parse_epoch(&entry.epoch, &time_system)?;
                    let frame = entry
                        .frame
                        .clone()
                        .unwrap_or_else(|| metadata.ref_frame().to_string());
                    Covariance::from_lower_triangle(
                        epoch,
                        Some(frame),
                        &entry.lower_triangle,
                        version,
                    )
                })
                .collect::<Result<Vec<_>, _>>()?;
            Some(CovarianceSection::new(entries, version)?)
        };

        Self::new(metadata, data, covariance)
    }

    pub fn version(&self) -> OemVersion {
        self.version
    }

    pub fn metadata(&self) -> &MetaData {
        &self.metadata
    }

    pub fn data(&self) -> &DataSection {
        &self.data
    }

    pub fn states(&self) -> &[State] {
        self.data.states()
    }

    pub fn covariance_section(&self) -> Option<&CovarianceSection> {
        self.covariance.as_ref()
    }

    pub fn covariances(&self) -> &[Covariance] {
        self.covariance
            .as_ref()
            .map(CovarianceSection::covariances)
            .unwrap_or_default()
    }

    pub fn has_accel(&self) -> bool {
        self.data.has_accel()
    }

    pub fn has_covariance(&self) -> bool {
        self.covariance.is_some()
    }

    pub fn useable_start_time(&self) -> OemEpoch {
        self.metadata.useable_start_time()
    }

    pub fn useable_stop_time(&self) -> OemEpoch {
        self.metadata.useable_stop_time()
    }

    /// Useable span `(start, stop)`.
    pub fn span(&self) -> (OemEpoch, OemEpoch) {
        (self.useable_start_time(), self.useable_stop_time())
    }

    /// `true` when `epoch` lies in the useable span (bounds included).
    pub fn contains(&self, epoch: OemEpoch) -> bool {
        self.useable_start_time() <= epoch && epoch <= self.useable_stop_time()
    }

    /// Interpolator of this segment, built on first use and cached in an internal [`OnceCell`].
    pub fn interpolator(&self) -> Result<&EphemerisInterpolator, OemError> {
        self.interpolator.get_or_try_init(|| {
            EphemerisInterpolator::new(
                self.states(),
                self.metadata.interpolation(),
                self.metadata.interpolation_degree(),
            )
        })
    }

    /// Interpolated state at `epoch`.
    ///
    /// Return
    /// ----------
    /// * The state, labelled with the segment frame and center, or
    ///   [`OemError::OutOfRange`] when `epoch` is outside the useable span.
    pub fn evaluate(&self, epoch: OemEpoch) -> Result<State, OemError> {
        if !self.contains(epoch) {
            return Err(OemError::OutOfRange(format!(
                "{epoch} is outside the useable span [{}, {}]",
                self.useable_start_time(),
                self.useable_stop_time()
            )));
        }
        let sample = self.interpolator()?.evaluate(epoch)?;
        let reference = &self.states()[0];
        State::from_vectors(
            epoch,
            reference.frame.clone(),
            reference.center.clone(),
            sample.position,
            sample.velocity,
            sample.acceleration,
            self.version,
        )
    }

    /// States sampled every `step` seconds over the useable span, stop epoch included.
    pub fn steps(
        &self,
        step: f64,
    ) -> Result<impl Iterator<Item = Result<State, OemError>> + '_, OemError> {
        let (start, stop) = self.span();
        Ok(TimeRange::new(start, stop, step)?.map(move |epoch| self.evaluate(epoch)))
    }

    /// Replace the states by samples taken every `step` seconds over the useable span.
    pub fn resample(&mut self, step: f64) -> Result<(), OemError> {
        let states = self.steps(step)?.collect::<Result<Vec<_>, _>>()?;
        self.data = DataSection::new(states, self.version)?;
        self.interpolator = OnceCell::new();
        tracing::debug!(
            object = self.metadata.object_name(),
            step,
            states = self.states().len(),
            "Segment resampled"
        );
        Ok(())
    }

    /// Update one metadata keyword.
    ///
    /// The segment is re-validated as a whole; on failure it is left unchanged.
    /// Changing `REF_FRAME` or `CENTER_NAME` re-labels every state.
    pub fn set_metadata_value(&mut self, key: &str, raw: &str) -> Result<(), OemError> {
        if key == "TIME_SYSTEM" {
            return Err(OemError::Validation(
                "TIME_SYSTEM cannot be changed on an existing segment".into(),
            ));
        }
        let metadata = self.metadata.with_value(key, raw)?;
        let frame: Arc<str> = Arc::from(metadata.ref_frame());
        let center: Arc<str> = Arc::from(metadata.center_name());

        let mut data = self.data.clone();
        for state in data.states_mut() {
            state.frame = frame.clone();
            state.center = center.clone();
        }

        *self = Self::new(metadata, data, self.covariance.clone())?;
        Ok(())
    }
}

impl Clone for EphemerisSegment {
    fn clone(&self) -> Self {
        EphemerisSegment {
            metadata: self.metadata.clone(),
            data: self.data.clone(),
            covariance: self.covariance.clone(),
            version: self.version,
            interpolator: OnceCell::new(),
        }
    }
}

impl PartialEq for EphemerisSegment {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.metadata == other.metadata
            && self.data == other.data
            && self.covariance == other.covariance
    }
}

impl fmt::Debug for EphemerisSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemerisSegment")
            .field("object", &self.metadata.object_name())
            .field("start", &self.useable_start_time())
            .field("stop", &self.useable_stop_time())
            .field("states", &self.states().len())
            .field("covariances", &self.covariances().len())
            .finish()
    }
}
