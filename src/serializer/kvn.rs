use itertools::Itertools;

use crate::components::covariance::Covariance;
use crate::components::segment::EphemerisSegment;
use crate::components::state::State;
use crate::constants::{COVARIANCE_START, COVARIANCE_STOP, META_START, META_STOP, VERSION_KEY};
use crate::conversion::format_float;
use crate::message::EphemerisMessage;

fn state_line(state: &State) -> String {
    let values = state.vector().iter().map(|v| format_float(*v)).join(" ");
    format!("{} {values}", state.epoch)
}

/// `EPOCH`, optional `COV_REF_FRAME`, then the six lower-triangle rows.
fn covariance_lines(covariance: &Covariance) -> Vec<String> {
    let mut lines = vec![format!("EPOCH = {}", covariance.epoch)];
    if let Some(frame) = &covariance.frame {
        lines.push(format!("COV_REF_FRAME = {frame}"));
    }
    lines.extend((0..6).map(|row| {
        (0..=row)
            .map(|col| format_float(covariance.matrix[(row, col)]))
            .join(" ")
    }));
    lines
}

fn segment_lines(segment: &EphemerisSegment) -> Vec<String> {
    let mut lines = vec![META_START.to_string()];
    lines.extend(
        segment
            .metadata()
            .formatted_fields()
            .into_iter()
            .map(|(key, value)| format!("{key} = {value}")),
    );
    lines.push(META_STOP.to_string());
    lines.push(String::new());

    lines.extend(segment.states().iter().map(state_line));
    lines.push(String::new());

    if let Some(section) = segment.covariance_section() {
        lines.push(COVARIANCE_START.to_string());
        lines.extend(section.covariances().iter().flat_map(covariance_lines));
        lines.push(COVARIANCE_STOP.to_string());
        lines.push(String::new());
    }
    lines
}

/// Encode a message in KVN.
pub fn to_kvn(message: &EphemerisMessage) -> String {
    let header = message.header();
    let mut lines = vec![format!("{VERSION_KEY} = {}", header.version())];
    lines.extend(
        header
            .formatted_fields()
            .into_iter()
            .map(|(key, value)| format!("{key} = {value}")),
    );
    lines.push(String::new());
    lines.extend(message.segments().iter().flat_map(segment_lines));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
