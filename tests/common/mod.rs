#![allow(dead_code)]

use camino::{Utf8Path, Utf8PathBuf};
use nalgebra::Vector3;
use oem::message::EphemerisMessage;
use oem::time::{Calendar, OemEpoch};

/// Gravitational parameter and radius of the circular orbit in `tests/data/circular_v2.*`
pub const MU: f64 = 398600.4418;
pub const RADIUS: f64 = 7000.0;
pub const INCLINATION_DEG: f64 = 51.6;

pub fn data_path(name: &str) -> Utf8PathBuf {
    Utf8Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

pub fn load(name: &str) -> EphemerisMessage {
    EphemerisMessage::open(&data_path(name)).unwrap()
}

pub fn utc(text: &str) -> OemEpoch {
    OemEpoch::parse(text, Calendar::Utc).unwrap()
}

/// Epoch labelled in the uniform calendar used by TAI, TT, GPS and unsupported time systems.
pub fn uniform(text: &str) -> OemEpoch {
    OemEpoch::parse(text, Calendar::Uniform).unwrap()
}

pub fn mean_motion() -> f64 {
    (MU / RADIUS.powi(3)).sqrt()
}

/// Analytic position and velocity on the sample orbit, `t` seconds after 2020-01-01T00:00:00 UTC.
pub fn circular_state(t: f64, phase: f64) -> (Vector3<f64>, Vector3<f64>) {
    let n = mean_motion();
    let (si, ci) = INCLINATION_DEG.to_radians().sin_cos();
    let (s, c) = (n * t + phase).sin_cos();
    (
        RADIUS * Vector3::new(c, s * ci, s * si),
        RADIUS * n * Vector3::new(-s, c * ci, c * si),
    )
}
