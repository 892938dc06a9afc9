//! Average integrands of the susceptible / with-condition disease model.
//!
//! Given the rates of the model (initial prevalence `pini`, incidence `iota`,
//! remission `rho`, excess mortality `chi` and other-cause mortality `omega`)
//! as functions of age and time, this crate computes the average over an
//! age-time rectangle of a measured quantity such as prevalence or all-cause
//! mortality. Quantities that depend on the compartments are obtained by
//! integrating the compartment ODE along each birth cohort.
//!
//! ```rust
//! use avgint::prelude::*;
//!
//! let rates = RateSet::builder()
//!     .rate(RateKind::Iota, Constant(0.01))
//!     .rate(RateKind::Omega, Constant(0.02))
//!     .build();
//! let grid = Grid::uniform(20.0, 30.0, 2000.0, 2010.0, 2.5).unwrap();
//!
//! let prevalence = average_integrand(&rates, IntegrandKind::Prevalence, &grid, 1e-7).unwrap();
//! assert!(prevalence > 0.0 && prevalence < 1.0);
//! ```

pub mod average;
pub mod config;
pub mod error;
pub mod grid;
pub mod integrand;
pub mod ode;
pub mod quadrature;
pub mod rates;

pub use crate::average::{
    average_integrand, average_integrand_batch, average_integrand_by_name,
    average_integrand_with, integrand_surface, integrand_surface_with, AvgIntRow,
};
pub use crate::config::{AvgIntRequest, RateSpec};
pub use crate::error::AvgIntError;
pub use crate::grid::{uniform_grid, Grid};
pub use crate::integrand::{integrand_value, IntegrandKind};
pub use crate::ode::{compartment_state, CompartmentState, SolverOptions};
pub use crate::rates::{BilinearRate, Constant, Rate, RateKind, RateSet};

pub mod prelude {
    pub use crate::average::{
        average_integrand, average_integrand_batch, average_integrand_by_name,
        average_integrand_with, integrand_surface, integrand_surface_with, AvgIntRow,
    };
    pub use crate::error::AvgIntError;
    pub use crate::grid::{uniform_grid, Grid};
    pub use crate::integrand::{integrand_value, IntegrandKind};
    pub use crate::ode::{compartment_state, CompartmentState, SolverOptions};
    pub use crate::quadrature::{average_1d, average_2d};
    pub use crate::rates::{BilinearRate, Constant, Rate, RateKind, RateSet};
}
