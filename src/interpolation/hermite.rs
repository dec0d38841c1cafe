//! Hermite window fit: `N` samples with value and derivative give a degree `2N - 1`
//! polynomial per component.
//!
//! Without acceleration, the position is fitted from (position, velocity) pairs and
//! the velocity is the derivative of the position fit. With acceleration, position
//! and velocity are both fitted as Hermite pairs, (position, velocity) and
//! (velocity, acceleration), and the acceleration is the derivative of the
//! velocity fit.
use nalgebra::{DMatrix, Vector3};

use crate::components::state::State;
use crate::interpolation::polynomial::{solve_coefficients, Polynomial, Window, WindowFit};
use crate::oem_errors::OemError;

pub(crate) fn samples_required(degree: u32) -> Result<usize, OemError> {
    let count = degree as usize + 1;
    if count % 2 != 0 {
        return Err(OemError::Interpolation(format!(
            "Unachievable order for Hermite interpolation: {degree}"
        )));
    }
    Ok(count / 2)
}

/// `2N x 2N` confluent Vandermonde matrix: value rows `τᵢᵏ` then derivative rows `k τᵢᵏ⁻¹`.
fn confluent_vandermonde(tau: &[f64]) -> DMatrix<f64> {
    let n = tau.len();
    DMatrix::from_fn(2 * n, 2 * n, |row, power| {
        if row < n {
            tau[row].powi(power as i32)
        } else if power == 0 {
            0.0
        } else {
            power as f64 * tau[row - n].powi(power as i32 - 1)
        }
    })
}

/// Fit the three components of `value` with derivative `slope` (per second).
fn fit_pair(
    window: &Window,
    system: &DMatrix<f64>,
    value: impl Fn(&State) -> Vector3<f64>,
    slope: impl Fn(&State) -> Vector3<f64>,
) -> Result<Vec<Polynomial>, OemError> {
    let n = window.states.len();
    let mut rhs = DMatrix::zeros(2 * n, 3);
    rhs.rows_mut(0, n).copy_from(&window.column_block(value));
    // d/dτ = scale · d/dt
    rhs.rows_mut(n, n)
        .copy_from(&(window.column_block(slope) * window.scale));
    solve_coefficients(system.clone(), rhs)
}

pub(crate) fn fit_window(window: &Window) -> Result<WindowFit, OemError> {
    let has_accel = window.states.first().is_some_and(|s| s.has_accel());
    let system = confluent_vandermonde(&window.tau);
    let per_second = 1.0 / window.scale;

    let position = fit_pair(window, &system, |s| s.position, |s| s.velocity)?;

    let (velocity, acceleration) = if has_accel {
        let velocity = fit_pair(
            window,
            &system,
            |s| s.velocity,
            |s| s.acceleration.unwrap_or_else(Vector3::zeros),
        )?;
        let acceleration = velocity
            .iter()
            .map(|p| p.derivative().scaled(per_second))
            .collect();
        (velocity, Some(acceleration))
    } else {
        let velocity = position
            .iter()
            .map(|p| p.derivative().scaled(per_second))
            .collect();
        (velocity, None)
    };

    Ok(WindowFit {
        origin: window.origin,
        scale: window.scale,
        position,
        velocity,
        acceleration,
    })
}
