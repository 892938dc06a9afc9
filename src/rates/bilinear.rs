use ndarray::Array2;

use super::Rate;
use crate::error::{AvgIntError, Result};

/// A rate defined by its values on an age × time table.
///
/// Between table points the rate is bilinear; outside the table it is held at
/// the value of the nearest edge. An axis with a single point makes the rate
/// constant along that axis.
#[derive(Debug, Clone, PartialEq)]
pub struct BilinearRate {
    age: Vec<f64>,
    time: Vec<f64>,
    /// Rows follow `age`, columns follow `time`
    values: Array2<f64>,
}

impl BilinearRate {
    pub fn new(age: Vec<f64>, time: Vec<f64>, values: Array2<f64>) -> Result<Self> {
        check_axis("age", &age)?;
        check_axis("time", &time)?;
        if values.dim() != (age.len(), time.len()) {
            return Err(AvgIntError::InvalidRateTable {
                reason: format!(
                    "values have shape {:?} but the axes need ({}, {})",
                    values.dim(),
                    age.len(),
                    time.len()
                ),
            });
        }
        Ok(BilinearRate { age, time, values })
    }

    /// Build from row-major nested vectors, one row per age point.
    pub fn from_rows(age: Vec<f64>, time: Vec<f64>, rows: Vec<Vec<f64>>) -> Result<Self> {
        if rows.len() != age.len() || rows.iter().any(|row| row.len() != time.len()) {
            return Err(AvgIntError::InvalidRateTable {
                reason: format!(
                    "expected {} rows of {} values each",
                    age.len(),
                    time.len()
                ),
            });
        }
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let values = Array2::from_shape_vec((age.len(), time.len()), flat)?;
        BilinearRate::new(age, time, values)
    }

    pub fn age(&self) -> &[f64] {
        &self.age
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }
}

impl Rate for BilinearRate {
    fn eval(&self, age: f64, time: f64) -> f64 {
        if age.is_nan() || time.is_nan() {
            return f64::NAN;
        }
        let (a0, a1, wa) = bracket(&self.age, age);
        let (t0, t1, wt) = bracket(&self.time, time);
        let v = &self.values;
        (1.0 - wa) * (1.0 - wt) * v[[a0, t0]]
            + (1.0 - wa) * wt * v[[a0, t1]]
            + wa * (1.0 - wt) * v[[a1, t0]]
            + wa * wt * v[[a1, t1]]
    }
}

/// Locate `x` on `grid`: the bracketing indices and the weight of the upper one.
/// Points outside the grid are clamped to its ends.
#[inline]
fn bracket(grid: &[f64], x: f64) -> (usize, usize, f64) {
    let last = grid.len() - 1;
    if x <= grid[0] {
        return (0, 0, 0.0);
    }
    if x >= grid[last] {
        return (last, last, 0.0);
    }
    let hi = grid.partition_point(|&g| g <= x);
    let lo = hi - 1;
    (lo, hi, (x - grid[lo]) / (grid[hi] - grid[lo]))
}

fn check_axis(axis: &str, grid: &[f64]) -> Result<()> {
    if grid.is_empty() {
        return Err(AvgIntError::InvalidRateTable {
            reason: format!("{} axis is empty", axis),
        });
    }
    if grid.iter().any(|x| !x.is_finite()) {
        return Err(AvgIntError::InvalidRateTable {
            reason: format!("{} axis has a non-finite value", axis),
        });
    }
    if grid.windows(2).any(|w| w[1] <= w[0]) {
        return Err(AvgIntError::InvalidRateTable {
            reason: format!("{} axis is not strictly increasing", axis),
        });
    }
    Ok(())
}
