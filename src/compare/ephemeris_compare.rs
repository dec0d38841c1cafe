use itertools::Itertools;

use crate::compare::segment_compare::SegmentCompare;
use crate::compare::state_compare::StateCompare;
use crate::message::EphemerisMessage;
use crate::oem_errors::OemError;
use crate::time::OemEpoch;

/// Comparison of two messages: every compatible segment pair with a non-empty overlap.
#[derive(Debug, Clone)]
pub struct EphemerisCompare<'a> {
    segments: Vec<SegmentCompare<'a>>,
}

impl<'a> EphemerisCompare<'a> {
    pub fn new(origin: &'a EphemerisMessage, target: &'a EphemerisMessage) -> Self {
        let segments = origin
            .segments()
            .iter()
            .cartesian_product(target.segments())
            .filter_map(|(o, t)| SegmentCompare::new(o, t).ok())
            .filter(|compare| !compare.is_empty())
            .collect();
        EphemerisCompare { segments }
    }

    pub fn segments(&self) -> &[SegmentCompare<'a>] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn contains(&self, epoch: OemEpoch) -> bool {
        self.segments.iter().any(|segment| segment.contains(epoch))
    }

    /// Compare at `epoch`, taken from the first segment pair covering it.
    pub fn evaluate(&self, epoch: OemEpoch) -> Result<StateCompare, OemError> {
        self.segments
            .iter()
            .find(|segment| segment.contains(epoch))
            .ok_or_else(|| {
                OemError::OutOfRange(format!("{epoch} not contained in ephemeris compare"))
            })?
            .evaluate(epoch)
    }

    /// Fixed-step compares of every segment pair, in order.
    pub fn steps(
        &self,
        step: f64,
    ) -> Result<impl Iterator<Item = Result<StateCompare, OemError>> + '_, OemError> {
        let iterators = self
            .segments
            .iter()
            .map(|segment| segment.steps(step))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(iterators.into_iter().flatten())
    }
}
