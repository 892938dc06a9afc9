//! JSON description of an average-integrand evaluation
//!
//! A request names the integrand, the grid, the absolute tolerance and the
//! rates. Rates are either constants or bilinear tables on an age × time grid.
//!
//! ```rust
//! use avgint::config::AvgIntRequest;
//!
//! let request = AvgIntRequest::from_json(r#"{
//!     "integrand": "prevalence",
//!     "abs_tol": 1e-6,
//!     "grid": { "age": [0, 10, 20], "time": [2000] },
//!     "rates": {
//!         "iota": { "constant": 0.01 },
//!         "omega": {
//!             "bilinear": {
//!                 "age": [0, 100],
//!                 "time": [2000],
//!                 "values": [[0.001], [0.1]]
//!             }
//!         }
//!     }
//! }"#).unwrap();
//!
//! let prevalence = request.evaluate().unwrap();
//! assert!(prevalence > 0.0 && prevalence < 1.0);
//! ```

use std::{collections::BTreeMap, io::Read, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    average::average_integrand_with,
    error::Result,
    grid::Grid,
    integrand::IntegrandKind,
    ode::SolverOptions,
    rates::{BilinearRate, Constant, Rate, RateKind, RateSet},
};

/// How a single rate is given in a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSpec {
    Constant(f64),
    Bilinear {
        age: Vec<f64>,
        time: Vec<f64>,
        /// One row per age point, one column per time point
        values: Vec<Vec<f64>>,
    },
}

impl RateSpec {
    pub fn to_rate(&self) -> Result<Arc<dyn Rate>> {
        let rate: Arc<dyn Rate> = match self {
            RateSpec::Constant(value) => Arc::new(Constant(*value)),
            RateSpec::Bilinear { age, time, values } => Arc::new(BilinearRate::from_rows(
                age.clone(),
                time.clone(),
                values.clone(),
            )?),
        };
        Ok(rate)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvgIntRequest {
    pub integrand: String,
    pub grid: Grid,
    pub abs_tol: f64,
    /// Keyed by rate name; rates left out are zero
    #[serde(default)]
    pub rates: BTreeMap<String, RateSpec>,
    #[serde(default)]
    pub solver: SolverOptions,
}

impl AvgIntRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn integrand_kind(&self) -> Result<IntegrandKind> {
        self.integrand.parse()
    }

    pub fn rate_set(&self) -> Result<RateSet> {
        let mut builder = RateSet::builder();
        for (name, spec) in &self.rates {
            let kind = name.parse::<RateKind>()?;
            builder = builder.shared(kind, spec.to_rate()?);
        }
        Ok(builder.build())
    }

    pub fn evaluate(&self) -> Result<f64> {
        let kind = self.integrand_kind()?;
        let rates = self.rate_set()?;
        average_integrand_with(&rates, kind, &self.grid, self.abs_tol, &self.solver)
    }
}
