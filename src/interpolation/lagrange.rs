//! Lagrange window fit: `N` samples give the unique degree `N - 1` polynomial through
//! every component of the state.
use nalgebra::{DMatrix, Vector3};

use crate::interpolation::polynomial::{solve_coefficients, Window, WindowFit};
use crate::oem_errors::OemError;

pub(crate) fn samples_required(degree: u32) -> usize {
    degree as usize + 1
}

/// Vandermonde matrix `A[i][k] = τᵢᵏ`.
fn vandermonde(tau: &[f64]) -> DMatrix<f64> {
    let n = tau.len();
    DMatrix::from_fn(n, n, |row, power| tau[row].powi(power as i32))
}

pub(crate) fn fit_window(window: &Window) -> Result<WindowFit, OemError> {
    let has_accel = window.states.first().is_some_and(|s| s.has_accel());

    let mut rhs = DMatrix::zeros(window.states.len(), if has_accel { 9 } else { 6 });
    rhs.columns_mut(0, 3)
        .copy_from(&window.column_block(|s| s.position));
    rhs.columns_mut(3, 3)
        .copy_from(&window.column_block(|s| s.velocity));
    if has_accel {
        rhs.columns_mut(6, 3)
            .copy_from(&window.column_block(|s| s.acceleration.unwrap_or_else(Vector3::zeros)));
    }

    let mut polys = solve_coefficients(vandermonde(&window.tau), rhs)?;
    let acceleration = has_accel.then(|| polys.split_off(6));
    let velocity = polys.split_off(3);

    Ok(WindowFit {
        origin: window.origin,
        scale: window.scale,
        position: polys,
        velocity,
        acceleration,
    })
}
