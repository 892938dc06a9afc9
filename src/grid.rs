//! Quadrature grids over an age-time rectangle
//!
//! The first and last point of each axis are the limits of the average along
//! that axis; the points in between are the trapezoidal nodes. An axis with a
//! single point means "evaluate at this value" rather than "average".

use serde::{Deserialize, Serialize};

use crate::error::{AvgIntError, Result};

/// Largest number of intervals [`uniform_grid`] will create
pub const MAX_INTERVALS: usize = 10_000_000;

/// Age and time nodes for the two-dimensional average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid")]
pub struct Grid {
    age: Vec<f64>,
    time: Vec<f64>,
}

#[derive(Deserialize)]
struct RawGrid {
    age: Vec<f64>,
    time: Vec<f64>,
}

impl TryFrom<RawGrid> for Grid {
    type Error = AvgIntError;

    fn try_from(raw: RawGrid) -> Result<Self> {
        Grid::new(raw.age, raw.time)
    }
}

impl Grid {
    /// Create a grid, checking that each axis is non-empty, finite and
    /// strictly increasing, and that no age is negative.
    pub fn new(age: Vec<f64>, time: Vec<f64>) -> Result<Self> {
        validate_axis("age", &age)?;
        validate_axis("time", &time)?;
        if age[0] < 0.0 {
            return Err(AvgIntError::InvalidGrid {
                axis: "age".to_string(),
                reason: format!("ages must not be negative, found {}", age[0]),
            });
        }
        Ok(Grid { age, time })
    }

    /// A grid evaluating at one `(age, time)` point
    pub fn point(age: f64, time: f64) -> Result<Self> {
        Grid::new(vec![age], vec![time])
    }

    /// Equally spaced nodes on both axes with spacing at most `max_step`.
    ///
    /// See [`uniform_grid`].
    pub fn uniform(
        age_lower: f64,
        age_upper: f64,
        time_lower: f64,
        time_upper: f64,
        max_step: f64,
    ) -> Result<Self> {
        Grid::new(
            uniform_grid(age_lower, age_upper, max_step)?,
            uniform_grid(time_lower, time_upper, max_step)?,
        )
    }

    pub fn age(&self) -> &[f64] {
        &self.age
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Number of tensor-product nodes
    pub fn len(&self) -> usize {
        self.age.len() * self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Equally spaced points from `lower` to `upper` using the fewest intervals
/// whose length does not exceed `max_step`.
///
/// Returns the single point `[lower]` when `lower == upper`.
pub fn uniform_grid(lower: f64, upper: f64, max_step: f64) -> Result<Vec<f64>> {
    if !(max_step.is_finite() && max_step > 0.0) {
        return Err(AvgIntError::InvalidGrid {
            axis: "uniform".to_string(),
            reason: format!("max_step must be finite and positive, got {}", max_step),
        });
    }
    if !(lower.is_finite() && upper.is_finite()) {
        return Err(AvgIntError::InvalidGrid {
            axis: "uniform".to_string(),
            reason: format!("limits must be finite, got [{}, {}]", lower, upper),
        });
    }
    if lower == upper {
        return Ok(vec![lower]);
    }
    let diff = upper - lower;
    if diff < 0.0 {
        return Err(AvgIntError::InvalidGrid {
            axis: "uniform".to_string(),
            reason: format!("upper limit {} is below lower limit {}", upper, lower),
        });
    }

    let ratio = diff / max_step;
    if !(ratio <= MAX_INTERVALS as f64) {
        return Err(AvgIntError::InvalidGrid {
            axis: "uniform".to_string(),
            reason: format!(
                "[{}, {}] with max_step {} needs more than {} intervals",
                lower, upper, max_step, MAX_INTERVALS
            ),
        });
    }
    let n = ratio.floor() as usize;
    let n_interval = if max_step * (n as f64) < diff { n + 1 } else { n };
    let step = diff / n_interval as f64;

    let mut grid: Vec<f64> = (0..n_interval)
        .map(|i| lower + i as f64 * step)
        .collect();
    grid.push(upper);
    Ok(grid)
}

fn validate_axis(axis: &str, values: &[f64]) -> Result<()> {
    let invalid = |reason: String| AvgIntError::InvalidGrid {
        axis: axis.to_string(),
        reason,
    };
    if values.is_empty() {
        return Err(invalid("no points".to_string()));
    }
    if let Some(x) = values.iter().find(|x| !x.is_finite()) {
        return Err(invalid(format!("non-finite point {}", x)));
    }
    if let Some(w) = values.windows(2).find(|w| w[1] <= w[0]) {
        return Err(invalid(format!(
            "points must be strictly increasing, found {} followed by {}",
            w[0], w[1]
        )));
    }
    Ok(())
}
