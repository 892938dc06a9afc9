//! Trapezoidal averages over monotone grids
//!
//! These are pure math: no dependency on the disease model or on [`Grid`](crate::Grid)
//! validation. Callers guarantee that every grid is non-empty and strictly
//! increasing, so the span of a multi-point grid is positive.
//!
//! The integrands of the disease model are often non-smooth in age and time,
//! which is why a low order rule is used.
//!
//! # Example
//!
//! ```rust
//! use avgint::quadrature::{average_1d, average_2d};
//!
//! let avg = average_1d(|x| x * x, &[0.0, 1.0, 2.0]);
//! assert_eq!(avg, 1.5);
//!
//! let avg = average_2d(|a, t| a + t, &[0.0, 10.0], &[2000.0]);
//! assert_eq!(avg, 2005.0);
//! ```

use std::convert::Infallible;

/// Linear trapezoidal area of a single segment
#[inline]
fn trapezoid(f0: f64, f1: f64, dx: f64) -> f64 {
    (f0 + f1) * dx / 2.0
}

/// Trapezoidal average of `f` over `grid`.
///
/// A single-point grid returns `f(grid[0])` exactly.
pub fn average_1d<F>(mut f: F, grid: &[f64]) -> f64
where
    F: FnMut(f64) -> f64,
{
    let result: Result<f64, Infallible> = try_average_1d(|x| Ok(f(x)), grid);
    match result {
        Ok(avg) => avg,
        Err(never) => match never {},
    }
}

/// Trapezoidal average of `f(age, time)` over the tensor grid
/// `age_grid × time_grid`.
///
/// The average over age is taken first, for each time node, and the result is
/// then averaged over time.
pub fn average_2d<F>(mut f: F, age_grid: &[f64], time_grid: &[f64]) -> f64
where
    F: FnMut(f64, f64) -> f64,
{
    let result: Result<f64, Infallible> =
        try_average_2d(|age, time| Ok(f(age, time)), age_grid, time_grid);
    match result {
        Ok(avg) => avg,
        Err(never) => match never {},
    }
}

/// Fallible form of [`average_1d`]; stops at the first error returned by `f`.
pub fn try_average_1d<F, E>(mut f: F, grid: &[f64]) -> Result<f64, E>
where
    F: FnMut(f64) -> Result<f64, E>,
{
    debug_assert!(!grid.is_empty(), "quadrature grid has no points");
    if grid.len() == 1 {
        return f(grid[0]);
    }
    let span = grid[grid.len() - 1] - grid[0];
    debug_assert!(span > 0.0, "quadrature grid span must be positive");

    let mut integral = 0.0;
    let mut f_previous = f(grid[0])?;
    for w in grid.windows(2) {
        let f_next = f(w[1])?;
        integral += trapezoid(f_previous, f_next, w[1] - w[0]);
        f_previous = f_next;
    }
    Ok(integral / span)
}

/// Fallible form of [`average_2d`]; stops at the first error returned by `f`.
pub fn try_average_2d<F, E>(mut f: F, age_grid: &[f64], time_grid: &[f64]) -> Result<f64, E>
where
    F: FnMut(f64, f64) -> Result<f64, E>,
{
    try_average_1d(
        |time| try_average_1d(|age| f(age, time), age_grid),
        time_grid,
    )
}
