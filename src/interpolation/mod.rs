//! # Piecewise polynomial interpolation of ephemeris samples
//!
//! An [`EphemerisInterpolator`] answers "state at epoch" queries over the ordered
//! states of one segment.
//!
//! Overview
//! -----------------
//! * The method and degree come from the segment metadata (`INTERPOLATION`,
//!   `INTERPOLATION_DEGREE`), defaulting to Lagrange of degree 5.
//! * Each query fits a local polynomial on a window of consecutive samples. The
//!   candidate windows are summarized by their *node*, the mean elapsed time of
//!   their samples; the window whose node is nearest the query is used.
//! * Lagrange windows hold `degree + 1` samples, Hermite windows `(degree + 1) / 2`.
//!   `LINEAR` is a Lagrange fit on two samples.
//!
//! Range checks are the caller's job: the interpolator extrapolates from the
//! outermost window if asked for an epoch outside the samples.
pub mod hermite;
pub mod lagrange;
pub mod polynomial;

use std::fmt;
use std::str::FromStr;

use nalgebra::Vector3;

use crate::components::state::State;
use crate::constants::{DEFAULT_INTERPOLATION, DEFAULT_INTERPOLATION_DEGREE};
use crate::oem_errors::OemError;
use crate::time::OemEpoch;
use polynomial::{Window, WindowFit};

/// Interpolation scheme declared by `INTERPOLATION`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterpolationMethod {
    Lagrange,
    Hermite,
    Linear,
}

impl InterpolationMethod {
    /// Number of consecutive samples a window needs for `degree`.
    pub fn samples_required(&self, degree: u32) -> Result<usize, OemError> {
        match self {
            InterpolationMethod::Lagrange => Ok(lagrange::samples_required(degree)),
            InterpolationMethod::Hermite => hermite::samples_required(degree),
            InterpolationMethod::Linear => Ok(lagrange::samples_required(1)),
        }
    }
}

impl FromStr for InterpolationMethod {
    type Err = OemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LAGRANGE" => Ok(InterpolationMethod::Lagrange),
            "HERMITE" => Ok(InterpolationMethod::Hermite),
            "LINEAR" => Ok(InterpolationMethod::Linear),
            other => Err(OemError::Interpolation(format!(
                "Unsupported interpolation method: '{other}'"
            ))),
        }
    }
}

impl fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InterpolationMethod::Lagrange => "LAGRANGE",
            InterpolationMethod::Hermite => "HERMITE",
            InterpolationMethod::Linear => "LINEAR",
        };
        f.write_str(name)
    }
}

/// Result of an interpolation query.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatedState {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub acceleration: Option<Vector3<f64>>,
}

/// Interpolator over the states of one segment.
#[derive(Debug, Clone)]
pub struct EphemerisInterpolator {
    method: InterpolationMethod,
    degree: u32,
    samples: usize,
    reference: OemEpoch,
    states: Vec<State>,
    elapsed: Vec<f64>,
    nodes: Vec<f64>,
}

impl EphemerisInterpolator {
    /// Prepare an interpolator.
    ///
    /// Arguments
    /// -----------------
    /// * `states`: strictly increasing samples
    /// * `method`: `INTERPOLATION` value, `None` for the default method
    /// * `degree`: `INTERPOLATION_DEGREE` value, `None` for the default degree
    ///
    /// Return
    /// ----------
    /// * The interpolator, or [`OemError::Interpolation`] for an unknown method, an
    ///   unachievable degree, or fewer samples than one window needs.
    pub fn new(
        states: &[State],
        method: Option<&str>,
        degree: Option<u32>,
    ) -> Result<Self, OemError> {
        let method: InterpolationMethod = method.unwrap_or(DEFAULT_INTERPOLATION).parse()?;
        let degree = match method {
            InterpolationMethod::Linear => 1,
            _ => degree.unwrap_or(DEFAULT_INTERPOLATION_DEGREE),
        };
        let samples = method.samples_required(degree)?;

        let reference = states
            .first()
            .map(|s| s.epoch)
            .ok_or_else(|| OemError::Interpolation("No states to interpolate".into()))?;
        if states.len() < samples {
            return Err(OemError::Interpolation(format!(
                "{method} interpolation of degree {degree} needs {samples} samples, segment has {}",
                states.len()
            )));
        }

        let elapsed: Vec<f64> = states.iter().map(|s| s.epoch - reference).collect();
        let nodes = elapsed
            .windows(samples)
            .map(|window| window.iter().sum::<f64>() / samples as f64)
            .collect();

        tracing::debug!(%method, degree, samples, states = states.len(), "Interpolator ready");

        Ok(EphemerisInterpolator {
            method,
            degree,
            samples,
            reference,
            states: states.to_vec(),
            elapsed,
            nodes,
        })
    }

    pub fn method(&self) -> InterpolationMethod {
        self.method
    }

    pub fn degree(&self) -> u32 {
        self.degree
    }

    /// Index of the window whose node is nearest `elapsed`; the earlier window wins ties.
    fn best_window(&self, elapsed: f64) -> usize {
        let upper = self.nodes.partition_point(|node| *node < elapsed);
        if upper == 0 {
            return 0;
        }
        if upper == self.nodes.len() {
            return upper - 1;
        }
        let below = elapsed - self.nodes[upper - 1];
        let above = self.nodes[upper] - elapsed;
        if above < below {
            upper
        } else {
            upper - 1
        }
    }

    fn fit(&self, start: usize) -> Result<WindowFit, OemError> {
        let end = start + self.samples;
        let window = Window::new(&self.states[start..end], &self.elapsed[start..end]);
        match self.method {
            InterpolationMethod::Hermite => hermite::fit_window(&window),
            InterpolationMethod::Lagrange | InterpolationMethod::Linear => {
                lagrange::fit_window(&window)
            }
        }
    }

    /// Interpolated state at `epoch`.
    pub fn evaluate(&self, epoch: OemEpoch) -> Result<InterpolatedState, OemError> {
        let elapsed = epoch - self.reference;
        let fit = self.fit(self.best_window(elapsed))?;
        Ok(fit.evaluate(elapsed))
    }
}

#[cfg(test)]
mod interpolation_test {
    use super::*;
    use crate::time::Calendar;
    use crate::version::OemVersion;
    use approx::assert_relative_eq;

    fn t0() -> OemEpoch {
        OemEpoch::parse("2020-01-01T00:00:00", Calendar::Utc).unwrap()
    }

    /// Samples of a cubic trajectory, exact derivatives included.
    fn cubic_states(count: usize, step: f64, accel: bool) -> Vec<State> {
        (0..count)
            .map(|i| {
                let t = i as f64 * step;
                let p = |a: f64, b: f64, c: f64, d: f64| a + b * t + c * t * t + d * t * t * t;
                let v = |b: f64, c: f64, d: f64| b + 2.0 * c * t + 3.0 * d * t * t;
                let a = |c: f64, d: f64| 2.0 * c + 6.0 * d * t;
                let acceleration = [a(1e-4, 1e-7), a(-2e-4, 0.0), a(0.0, 3e-8)];
                State::new(
                    t0().add_seconds(t),
                    "EME2000",
                    "EARTH",
                    &[
                        p(7000.0, 1.0, 1e-4, 1e-7),
                        p(-300.0, 7.5, -2e-4, 0.0),
                        p(10.0, 0.0, 0.0, 3e-8),
                    ],
                    &[v(1.0, 1e-4, 1e-7), v(7.5, -2e-4, 0.0), v(0.0, 0.0, 3e-8)],
                    accel.then_some(&acceleration[..]),
                    OemVersion::V2_0,
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("hermite".parse::<InterpolationMethod>().unwrap(), InterpolationMethod::Hermite);
        assert!("SPLINE".parse::<InterpolationMethod>().is_err());
    }

    #[test]
    fn test_exact_at_samples() {
        let states = cubic_states(10, 60.0, false);
        for method in ["LAGRANGE", "HERMITE", "LINEAR"] {
            let interp = EphemerisInterpolator::new(&states, Some(method), Some(5)).unwrap();
            for state in &states {
                let result = interp.evaluate(state.epoch).unwrap();
                assert_relative_eq!(result.position, state.position, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn test_polynomial_reproduction() {
        let states = cubic_states(12, 120.0, false);
        let query = t0().add_seconds(317.25);
        let expected = &cubic_states(1, 317.25, false)[0];
        let t = 317.25;
        let expected_position = expected.position
            + Vector3::new(
                1.0 * t + 1e-4 * t * t + 1e-7 * t * t * t,
                7.5 * t - 2e-4 * t * t,
                3e-8 * t * t * t,
            );

        for method in ["LAGRANGE", "HERMITE"] {
            let interp = EphemerisInterpolator::new(&states, Some(method), Some(5)).unwrap();
            let result = interp.evaluate(query).unwrap();
            assert_relative_eq!(result.position, expected_position, max_relative = 1e-10);
            assert_relative_eq!(
                result.velocity,
                Vector3::new(
                    1.0 + 2e-4 * t + 3e-7 * t * t,
                    7.5 - 4e-4 * t,
                    9e-8 * t * t
                ),
                epsilon = 1e-10,
                max_relative = 1e-8
            );
            assert!(result.acceleration.is_none());
        }
    }

    #[test]
    fn test_hermite_with_acceleration() {
        let states = cubic_states(8, 60.0, true);
        let interp = EphemerisInterpolator::new(&states, Some("HERMITE"), Some(3)).unwrap();
        let t = 95.0;
        let result = interp.evaluate(t0().add_seconds(t)).unwrap();
        let acceleration = result.acceleration.unwrap();
        assert_relative_eq!(
            acceleration,
            Vector3::new(2e-4 + 6e-7 * t, -4e-4, 1.8e-7 * t),
            epsilon = 1e-12,
            max_relative = 1e-8
        );
    }

    #[test]
    fn test_setup_errors() {
        let states = cubic_states(4, 60.0, false);
        assert!(matches!(
            EphemerisInterpolator::new(&states, Some("LAGRANGE"), Some(5)),
            Err(OemError::Interpolation(_))
        ));
        assert!(matches!(
            EphemerisInterpolator::new(&states, Some("HERMITE"), Some(4)),
            Err(OemError::Interpolation(_))
        ));
        assert!(EphemerisInterpolator::new(&states, None, Some(3)).is_ok());
    }

    #[test]
    fn test_best_window_prefers_nearest_node() {
        let states = cubic_states(10, 60.0, false);
        let interp = EphemerisInterpolator::new(&states, Some("LAGRANGE"), Some(3)).unwrap();
        // nodes: 90, 150, 210, ...
        assert_eq!(interp.best_window(0.0), 0);
        assert_eq!(interp.best_window(120.0), 0);
        assert_eq!(interp.best_window(121.0), 1);
        assert_eq!(interp.best_window(10_000.0), 6);
    }
}
