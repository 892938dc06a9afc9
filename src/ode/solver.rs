//! BDF integration of the cohort system with diffsol
//!
//! The right-hand side and its Jacobian action are handed to diffsol as
//! closures over [`CohortSystem`]. Error control is absolute only.

use diffsol::{
    error::{DiffsolError, OdeSolverError},
    NalgebraLU, NalgebraMat, OdeBuilder, OdeSolverMethod, OdeSolverStopReason,
};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::{CohortSystem, CompartmentState};
use crate::error::{AvgIntError, Result};

type M = NalgebraMat<f64>;
type LS = NalgebraLU<f64>;

// no relative tolerance: abs_tol is the only error target
const RTOL: f64 = 0.0;
const H0: f64 = 1e-3;

/// Settings passed to the BDF solver. The error target itself is the
/// `abs_tol` given with each solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// First trial step; `1e-3` (or the whole interval if shorter) when `None`
    pub initial_step: Option<f64>,
    /// Solver steps allowed per solve
    pub max_steps: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            initial_step: None,
            max_steps: 100_000,
        }
    }
}

/// Integrate `system` from `s = -age` to `s = 0` starting at `initial`.
pub(crate) fn solve(
    system: &CohortSystem<'_>,
    initial: CompartmentState,
    abs_tol: f64,
    options: &SolverOptions,
) -> Result<CompartmentState> {
    let s0 = -system.age();
    let h0 = options.initial_step.unwrap_or(H0).min(system.age());

    let problem = OdeBuilder::<M>::new()
        .t0(s0)
        .h0(h0)
        .rtol(RTOL)
        .atol(vec![abs_tol; 2])
        .rhs_implicit(
            |x, _p, s, y| {
                let dy = system.rhs(s, &Vector2::new(x[0], x[1]));
                y[0] = dy[0];
                y[1] = dy[1];
            },
            |_x, _p, s, v, y| {
                let jv = system.jacobian(s) * Vector2::new(v[0], v[1]);
                y[0] = jv[0];
                y[1] = jv[1];
            },
        )
        .init(
            move |_p, _s, y| {
                y[0] = initial.s;
                y[1] = initial.c;
            },
            2,
        )
        .build()
        .map_err(|err| solver_error(s0, err))?;

    let mut solver = problem.bdf::<LS>().map_err(|err| solver_error(s0, err))?;
    solver
        .set_stop_time(0.0)
        .map_err(|err| solver_error(s0, err))?;

    let mut steps = 0;
    loop {
        if steps >= options.max_steps {
            let s = solver.state().t;
            tracing::error!(s, max_steps = options.max_steps, "ODE solver step limit reached");
            return Err(AvgIntError::MaxStepsExceeded {
                s,
                max_steps: options.max_steps,
            });
        }
        steps += 1;

        match solver.step() {
            Ok(OdeSolverStopReason::InternalTimestep) => {}
            Ok(OdeSolverStopReason::TstopReached) => break,
            Ok(reason) => {
                return Err(solver_failure(
                    solver.state().t,
                    format!("unexpected stop reason {:?}", reason),
                ))
            }
            Err(DiffsolError::OdeSolverError(OdeSolverError::StepSizeTooSmall { .. })) => {
                let s = solver.state().t;
                tracing::error!(s, "ODE solver step size went to zero");
                return Err(AvgIntError::StepSizeTooSmall { s });
            }
            Err(err) => return Err(solver_error(solver.state().t, err)),
        }

        let state = solver.state();
        if !(state.y[0].is_finite() && state.y[1].is_finite()) {
            tracing::error!(s = state.t, "ODE solution is not finite");
            return Err(AvgIntError::NonFiniteState { s: state.t });
        }
    }

    let y = solver.state().y;
    tracing::trace!(
        age = system.age(),
        time = system.time(),
        steps,
        "compartments solved"
    );
    Ok(CompartmentState { s: y[0], c: y[1] })
}

fn solver_error(s: f64, err: DiffsolError) -> AvgIntError {
    solver_failure(s, err.to_string())
}

fn solver_failure(s: f64, reason: String) -> AvgIntError {
    tracing::error!(s, reason = %reason, "ODE solver failed");
    AvgIntError::Solver { s, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::{Constant, RateKind, RateSet};
    use approx::assert_abs_diff_eq;

    fn decay(omega: f64) -> RateSet {
        RateSet::builder().rate(RateKind::Omega, Constant(omega)).build()
    }

    #[test]
    fn exponential_decay() {
        let rates = decay(0.3);
        let system = CohortSystem::new(&rates, 10.0, 2000.0);
        let y = solve(
            &system,
            CompartmentState::at_birth(0.0),
            1e-10,
            &SolverOptions::default(),
        )
        .unwrap();
        assert_abs_diff_eq!(y.s, (-3.0_f64).exp(), epsilon = 1e-8);
        assert_eq!(y.c, 0.0);
    }

    #[test]
    fn stiff_remission_settles_on_equilibrium() {
        // relaxation rate 1e4, equilibrium P = iota / (iota + rho)
        let rates = RateSet::builder()
            .rate(RateKind::Iota, Constant(1.0))
            .rate(RateKind::Rho, Constant(9999.0))
            .build();
        let system = CohortSystem::new(&rates, 20.0, 2000.0);
        let y = solve(
            &system,
            CompartmentState::at_birth(0.5),
            1e-9,
            &SolverOptions::default(),
        )
        .unwrap();
        assert_abs_diff_eq!(y.c, 1e-4, epsilon = 1e-8);
        assert_abs_diff_eq!(y.s + y.c, 1.0, epsilon = 1e-8);
    }

    #[test]
    fn rates_follow_the_cohort_diagonal() {
        // omega grows with age: S(a) = exp(-0.0005 a²)
        let rates = RateSet::builder()
            .rate(RateKind::Omega, |age: f64, _t: f64| 0.001 * age)
            .build();
        let system = CohortSystem::new(&rates, 40.0, 2000.0);
        let y = solve(
            &system,
            CompartmentState::at_birth(0.0),
            1e-10,
            &SolverOptions::default(),
        )
        .unwrap();
        assert_abs_diff_eq!(y.s, (-0.0005_f64 * 1600.0).exp(), epsilon = 1e-8);
    }

    #[test]
    fn nan_rates_are_a_hard_failure() {
        let rates = decay(f64::NAN);
        let system = CohortSystem::new(&rates, 25.0, 2000.0);
        let result = solve(
            &system,
            CompartmentState::at_birth(0.0),
            1e-7,
            &SolverOptions::default(),
        );
        assert!(result.is_err(), "got {:?}", result);
    }

    #[test]
    fn step_limit_is_a_hard_failure() {
        let rates = decay(0.1);
        let system = CohortSystem::new(&rates, 50.0, 2000.0);
        let options = SolverOptions {
            initial_step: Some(1e-6),
            max_steps: 3,
        };
        match solve(&system, CompartmentState::at_birth(0.0), 1e-10, &options) {
            Err(AvgIntError::MaxStepsExceeded { max_steps, .. }) => assert_eq!(max_steps, 3),
            other => panic!("expected MaxStepsExceeded, got {:?}", other),
        }
    }
}
