use nalgebra::{DMatrix, Vector3};

use crate::components::state::State;
use crate::interpolation::InterpolatedState;
use crate::oem_errors::OemError;

/// Polynomial with coefficients in increasing power order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    pub(crate) fn new(coefficients: Vec<f64>) -> Self {
        Polynomial { coefficients }
    }

    /// Horner evaluation.
    pub(crate) fn evaluate(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, coefficient| acc * x + coefficient)
    }

    pub(crate) fn derivative(&self) -> Polynomial {
        Polynomial {
            coefficients: self
                .coefficients
                .iter()
                .enumerate()
                .skip(1)
                .map(|(power, coefficient)| power as f64 * coefficient)
                .collect(),
        }
    }

    pub(crate) fn scaled(mut self, factor: f64) -> Polynomial {
        self.coefficients.iter_mut().for_each(|c| *c *= factor);
        self
    }
}

/// Solve `A · C = B` for every column of `B` and return one polynomial per column.
pub(crate) fn solve_coefficients(
    system: DMatrix<f64>,
    rhs: DMatrix<f64>,
) -> Result<Vec<Polynomial>, OemError> {
    let solution = system
        .lu()
        .solve(&rhs)
        .ok_or_else(|| OemError::Interpolation("Singular interpolation system".into()))?;
    Ok(solution
        .column_iter()
        .map(|column| Polynomial::new(column.iter().copied().collect()))
        .collect())
}

/// Contiguous run of samples used for one local fit.
///
/// Sample times are normalized as `τ = (t - origin) / scale`, where `origin` is the
/// first sample and `scale` the window span, which keeps the linear systems well
/// conditioned whatever the sampling step.
pub(crate) struct Window<'a> {
    pub states: &'a [State],
    pub tau: Vec<f64>,
    pub origin: f64,
    pub scale: f64,
}

impl<'a> Window<'a> {
    pub(crate) fn new(states: &'a [State], elapsed: &[f64]) -> Self {
        let origin = elapsed.first().copied().unwrap_or(0.0);
        let span = elapsed.last().copied().unwrap_or(origin) - origin;
        let scale = if span > 0.0 { span } else { 1.0 };
        let tau = elapsed.iter().map(|t| (t - origin) / scale).collect();
        Window {
            states,
            tau,
            origin,
            scale,
        }
    }

    /// `rows x 3` matrix of the selected vector of every state.
    pub(crate) fn column_block(&self, pick: impl Fn(&State) -> Vector3<f64>) -> DMatrix<f64> {
        DMatrix::from_fn(self.states.len(), 3, |row, col| pick(&self.states[row])[col])
    }
}

/// Local polynomial fit of one window, expressed in normalized time.
///
/// Every polynomial already returns physical units: derivatives taken in `τ` have
/// been divided by the window scale.
#[derive(Debug, Clone)]
pub(crate) struct WindowFit {
    pub origin: f64,
    pub scale: f64,
    pub position: Vec<Polynomial>,
    pub velocity: Vec<Polynomial>,
    pub acceleration: Option<Vec<Polynomial>>,
}

impl WindowFit {
    pub(crate) fn evaluate(&self, elapsed: f64) -> InterpolatedState {
        let tau = (elapsed - self.origin) / self.scale;
        let sample = |polys: &[Polynomial]| {
            Vector3::new(
                polys[0].evaluate(tau),
                polys[1].evaluate(tau),
                polys[2].evaluate(tau),
            )
        };
        InterpolatedState {
            position: sample(&self.position),
            velocity: sample(&self.velocity),
            acceleration: self.acceleration.as_deref().map(sample),
        }
    }
}

#[cfg(test)]
mod polynomial_test {
    use super::*;

    #[test]
    fn test_evaluate_and_derivative() {
        // 1 + 2x + 3x²
        let p = Polynomial::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(p.evaluate(2.0), 17.0);
        assert_eq!(p.derivative(), Polynomial::new(vec![2.0, 6.0]));
        assert_eq!(p.derivative().scaled(0.5).evaluate(1.0), 4.0);
    }

    #[test]
    fn test_solve_coefficients() {
        // x = 0, 1, 2 ; y = x² and y = 1 - x
        let system = DMatrix::from_row_slice(3, 3, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 2.0, 4.0]);
        let rhs = DMatrix::from_row_slice(3, 2, &[0.0, 1.0, 1.0, 0.0, 4.0, -1.0]);
        let polys = solve_coefficients(system, rhs).unwrap();
        approx::assert_abs_diff_eq!(polys[0].evaluate(3.0), 9.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(polys[1].evaluate(3.0), -2.0, epsilon = 1e-12);

        let singular = DMatrix::from_element(2, 2, 1.0);
        assert!(solve_coefficients(singular, DMatrix::zeros(2, 1)).is_err());
    }
}
