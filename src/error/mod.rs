use thiserror::Error;

/// Errors returned by the average-integrand evaluator.
#[derive(Error, Debug)]
pub enum AvgIntError {
    /// The integrand name is not one of the recognized kinds
    #[error("average_integrand: {name} is not a valid integrand name")]
    UnsupportedIntegrand { name: String },

    /// The rate name is not one of pini, iota, rho, chi, omega
    #[error("{name} is not a valid rate name")]
    UnknownRate { name: String },

    #[error("Invalid {axis} grid: {reason}")]
    InvalidGrid { axis: String, reason: String },

    #[error("Absolute tolerance must be finite and positive, got {abs_tol}")]
    InvalidTolerance { abs_tol: f64 },

    #[error("Invalid rate table: {reason}")]
    InvalidRateTable { reason: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Solver non-convergence
    // ─────────────────────────────────────────────────────────────────────────
    /// The step size collapsed before the error target was met
    #[error("The step size of the ODE solver went to zero at s = {s}, check the rate functions for values close to 0.0 or INFINITE")]
    StepSizeTooSmall { s: f64 },

    #[error("The ODE solver exceeded {max_steps} steps at s = {s}")]
    MaxStepsExceeded { s: f64, max_steps: usize },

    #[error("The ODE solution is not finite at s = {s}")]
    NonFiniteState { s: f64 },

    /// Any other failure reported by diffsol
    #[error("ODE solver failed at s = {s}: {reason}")]
    Solver { s: f64, reason: String },

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}

pub type Result<T> = std::result::Result<T, AvgIntError>;
