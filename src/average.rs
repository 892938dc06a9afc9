//! Average of an integrand over an age-time rectangle
//!
//! [`average_integrand`] is the entry point: it wraps
//! [`integrand_value`](crate::integrand::integrand_value) as a function of
//! `(age, time)` and averages it with the trapezoidal rule on the grid.
//!
//! A single average is evaluated sequentially. Independent averages, such as
//! the rows of a data table during a fit, are evaluated in parallel by
//! [`average_integrand_batch`].

use std::sync::Arc;

use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    grid::Grid,
    integrand::{integrand_value_with, IntegrandKind},
    ode::{check_tolerance, SolverOptions},
    quadrature::try_average_2d,
    rates::{Rate, RateSet},
};

/// Average of `kind` over `grid` with the default [`SolverOptions`].
///
/// # Example
///
/// ```rust
/// use avgint::prelude::*;
///
/// let rates = RateSet::builder()
///     .rate(RateKind::Iota, Constant(0.01))
///     .build();
/// let grid = Grid::uniform(10.0, 90.0, 2000.0, 2020.0, 5.0).unwrap();
///
/// let avg = average_integrand(&rates, IntegrandKind::SIncidence, &grid, 1e-6).unwrap();
/// assert!((avg - 0.01).abs() < 1e-15);
/// ```
pub fn average_integrand(
    rates: &RateSet,
    kind: IntegrandKind,
    grid: &Grid,
    abs_tol: f64,
) -> Result<f64> {
    average_integrand_with(rates, kind, grid, abs_tol, &SolverOptions::default())
}

/// Average of `kind` over `grid`.
///
/// Solver errors at any node are returned unchanged; no node is skipped.
pub fn average_integrand_with(
    rates: &RateSet,
    kind: IntegrandKind,
    grid: &Grid,
    abs_tol: f64,
    options: &SolverOptions,
) -> Result<f64> {
    check_tolerance(abs_tol)?;
    try_average_2d(
        |age, time| integrand_value_with(age, time, rates, kind, abs_tol, options),
        grid.age(),
        grid.time(),
    )
}

/// Average of the integrand called `integrand_name`, with rates keyed by name.
///
/// Rate names other than `pini`, `iota`, `rho`, `chi`, `omega` and integrand
/// names outside [`IntegrandKind`] are configuration errors. Rates not in
/// `rates` are zero.
pub fn average_integrand_by_name<I, K>(
    rates: I,
    integrand_name: &str,
    grid: &Grid,
    abs_tol: f64,
) -> Result<f64>
where
    I: IntoIterator<Item = (K, Arc<dyn Rate>)>,
    K: AsRef<str>,
{
    let kind = integrand_name.parse::<IntegrandKind>()?;
    let rates = RateSet::from_named(rates)?;
    average_integrand(&rates, kind, grid, abs_tol)
}

/// One requested average: an integrand and the rectangle it is averaged over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvgIntRow {
    pub integrand: IntegrandKind,
    pub grid: Grid,
}

impl AvgIntRow {
    pub fn new(integrand: IntegrandKind, grid: Grid) -> Self {
        AvgIntRow { integrand, grid }
    }
}

/// Averages for many rows sharing one rate set, computed in parallel.
///
/// The result for each row is independent: a failing row does not stop the
/// others.
pub fn average_integrand_batch(
    rates: &RateSet,
    rows: &[AvgIntRow],
    abs_tol: f64,
) -> Vec<Result<f64>> {
    average_integrand_batch_with(rates, rows, abs_tol, &SolverOptions::default())
}

pub fn average_integrand_batch_with(
    rates: &RateSet,
    rows: &[AvgIntRow],
    abs_tol: f64,
    options: &SolverOptions,
) -> Vec<Result<f64>> {
    tracing::debug!(rows = rows.len(), abs_tol, "evaluating average integrands");
    let results: Vec<Result<f64>> = rows
        .par_iter()
        .map(|row| average_integrand_with(rates, row.integrand, &row.grid, abs_tol, options))
        .collect();
    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        tracing::debug!(failed, "some average integrands failed");
    }
    results
}

/// Value of `kind` at every node of `grid`; rows follow age, columns follow
/// time. Nodes are evaluated in parallel.
///
/// Averaging the columns over age and then the result over time, as
/// [`average_2d`](crate::quadrature::average_2d) does, gives
/// [`average_integrand`].
pub fn integrand_surface(
    rates: &RateSet,
    kind: IntegrandKind,
    grid: &Grid,
    abs_tol: f64,
) -> Result<Array2<f64>> {
    integrand_surface_with(rates, kind, grid, abs_tol, &SolverOptions::default())
}

/// [`integrand_surface`] with explicit solver settings.
pub fn integrand_surface_with(
    rates: &RateSet,
    kind: IntegrandKind,
    grid: &Grid,
    abs_tol: f64,
    options: &SolverOptions,
) -> Result<Array2<f64>> {
    check_tolerance(abs_tol)?;
    let (ages, times) = (grid.age(), grid.time());
    let n_time = times.len();
    let values = (0..grid.len())
        .into_par_iter()
        .map(|k| {
            let (i, j) = (k / n_time, k % n_time);
            integrand_value_with(ages[i], times[j], rates, kind, abs_tol, options)
        })
        .collect::<Result<Vec<f64>>>()?;
    Ok(Array2::from_shape_vec((ages.len(), n_time), values)?)
}
