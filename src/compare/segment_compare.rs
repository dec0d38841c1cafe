use crate::compare::state_compare::StateCompare;
use crate::components::segment::EphemerisSegment;
use crate::oem_errors::OemError;
use crate::time::{OemEpoch, TimeRange};

/// Comparison of two segments over their common useable span.
///
/// Both segments must share `REF_FRAME` and `CENTER_NAME`. Disjoint spans give an
/// empty compare.
#[derive(Debug, Clone)]
pub struct SegmentCompare<'a> {
    origin: &'a EphemerisSegment,
    target: &'a EphemerisSegment,
    span: Option<(OemEpoch, OemEpoch)>,
}

impl<'a> SegmentCompare<'a> {
    pub fn new(
        origin: &'a EphemerisSegment,
        target: &'a EphemerisSegment,
    ) -> Result<Self, OemError> {
        let (om, tm) = (origin.metadata(), target.metadata());
        if om.ref_frame() != tm.ref_frame() || om.center_name() != tm.center_name() {
            return Err(OemError::IncompatibleCompare(
                "Incompatible segments: frame or central body mismatch.".into(),
            ));
        }

        let (origin_start, origin_stop) = origin.span();
        let (target_start, target_stop) = target.span();
        let start = origin_start.max(target_start);
        let stop = origin_stop.min(target_stop);
        let span = (start <= stop).then_some((start, stop));

        Ok(SegmentCompare {
            origin,
            target,
            span,
        })
    }

    pub fn span(&self) -> Option<(OemEpoch, OemEpoch)> {
        self.span
    }

    pub fn is_empty(&self) -> bool {
        self.span.is_none()
    }

    pub fn contains(&self, epoch: OemEpoch) -> bool {
        self.span
            .is_some_and(|(start, stop)| start <= epoch && epoch <= stop)
    }

    /// Compare of the two interpolated states at `epoch`.
    pub fn evaluate(&self, epoch: OemEpoch) -> Result<StateCompare, OemError> {
        if !self.contains(epoch) {
            return Err(OemError::OutOfRange(format!(
                "{epoch} not contained in segment compare"
            )));
        }
        StateCompare::new(self.origin.evaluate(epoch)?, self.target.evaluate(epoch)?)
    }

    /// Compares every `step` seconds over the common span, stop epoch included.
    pub fn steps(
        &self,
        step: f64,
    ) -> Result<impl Iterator<Item = Result<StateCompare, OemError>> + '_, OemError> {
        let epochs = match self.span {
            Some((start, stop)) => Some(TimeRange::new(start, stop, step)?),
            None => None,
        };
        Ok(epochs
            .into_iter()
            .flatten()
            .map(move |epoch| self.evaluate(epoch)))
    }
}
