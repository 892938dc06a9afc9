//! Susceptible / with-condition compartments along a birth cohort
//!
//! For a query point `(age, time)` the cohort born at `time - age` is followed
//! along the diagonal of the age-time plane. With `s ∈ [-age, 0]` and every
//! rate evaluated at `(age + s, time + s)`:
//!
//! ```text
//! S'(s) = -(iota + omega) S(s) + rho C(s)
//! C'(s) =  iota S(s) - (rho + omega + chi) C(s)
//! C(-age) = pini(0, time - age),  S(-age) = 1 - C(-age)
//! ```
//!
//! and the compartments at the query point are `(S(0), C(0))`.

mod solver;

pub use solver::SolverOptions;

use nalgebra::{Matrix2, Vector2};

use crate::{
    error::{AvgIntError, Result},
    rates::{RateSet, RateValues},
};

/// Fractions of the birth cohort in each compartment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompartmentState {
    /// Susceptible
    pub s: f64,
    /// With condition
    pub c: f64,
}

impl CompartmentState {
    /// State at birth for a cohort with initial prevalence `pini`
    pub fn at_birth(pini: f64) -> Self {
        CompartmentState {
            s: 1.0 - pini,
            c: pini,
        }
    }

    /// Fraction of the surviving cohort with the condition, `C / (S + C)`
    #[inline]
    pub fn prevalence(&self) -> f64 {
        self.c / (self.s + self.c)
    }

    /// Surviving fraction of the cohort, `S + C`
    #[inline]
    pub fn alive(&self) -> f64 {
        self.s + self.c
    }
}

/// Jacobian of the compartment right-hand side with respect to `(S, C)`.
#[inline]
pub fn jacobian(r: &RateValues) -> Matrix2<f64> {
    Matrix2::new(
        -(r.iota + r.omega),
        r.rho,
        r.iota,
        -(r.rho + r.omega + r.chi),
    )
}

/// The compartment ODE on the cohort diagonal through `(age, time)`.
pub struct CohortSystem<'a> {
    rates: &'a RateSet,
    age: f64,
    time: f64,
}

impl<'a> CohortSystem<'a> {
    pub fn new(rates: &'a RateSet, age: f64, time: f64) -> Self {
        CohortSystem { rates, age, time }
    }

    pub fn age(&self) -> f64 {
        self.age
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Jacobian at `s`, with the rates taken at `(age + s, time + s)`
    #[inline]
    pub fn jacobian(&self, s: f64) -> Matrix2<f64> {
        jacobian(&self.rates.at(self.age + s, self.time + s))
    }

    /// `(S', C')` at `s`; the system is linear, so this is `J(s) y`
    #[inline]
    pub fn rhs(&self, s: f64, y: &Vector2<f64>) -> Vector2<f64> {
        self.jacobian(s) * y
    }
}

/// Compartment values at `(age, time)` with the default [`SolverOptions`].
pub fn compartment_state(
    age: f64,
    time: f64,
    rates: &RateSet,
    abs_tol: f64,
) -> Result<CompartmentState> {
    compartment_state_with(age, time, rates, abs_tol, &SolverOptions::default())
}

/// Compartment values at `(age, time)`.
///
/// When `|10 · max(iota, rho, chi, omega)(age, time) · age| < abs_tol` the
/// interval is too short to step over and the state at birth is returned.
/// NaN rates never take that shortcut. Solver failures are returned as errors
/// and never retried.
pub fn compartment_state_with(
    age: f64,
    time: f64,
    rates: &RateSet,
    abs_tol: f64,
    options: &SolverOptions,
) -> Result<CompartmentState> {
    check_tolerance(abs_tol)?;
    if !(age >= 0.0) {
        return Err(AvgIntError::InvalidGrid {
            axis: "age".to_string(),
            reason: format!("ages must not be negative, found {}", age),
        });
    }
    let initial = CompartmentState::at_birth(rates.pini(time - age));

    let at = rates.at(age, time);
    if age == 0.0 || (!at.has_nan() && (10.0 * at.max() * age).abs() < abs_tol) {
        tracing::trace!(age, time, "age below tolerance, using state at birth");
        return Ok(initial);
    }

    solver::solve(&CohortSystem::new(rates, age, time), initial, abs_tol, options)
}

pub(crate) fn check_tolerance(abs_tol: f64) -> Result<()> {
    if abs_tol.is_finite() && abs_tol > 0.0 {
        Ok(())
    } else {
        Err(AvgIntError::InvalidTolerance { abs_tol })
    }
}
