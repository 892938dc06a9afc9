//! Rate functions of the two-compartment disease model
//!
//! A rate is any function of `(age, time)` returning a non-negative value. The
//! five rates the model knows about are named by [`RateKind`]; a [`RateSet`]
//! always holds all five, with absent rates bound to [`Zero`] when the set is
//! built. The evaluator therefore never has to ask whether a rate exists.
//!
//! # Example
//!
//! ```rust
//! use avgint::rates::{Constant, RateKind, RateSet};
//!
//! let rates = RateSet::builder()
//!     .rate(RateKind::Iota, Constant(0.01))
//!     .rate(RateKind::Omega, |age: f64, _time: f64| 0.001 * age)
//!     .build();
//!
//! let at = rates.at(50.0, 2000.0);
//! assert_eq!(at.iota, 0.01);
//! assert_eq!(at.rho, 0.0);
//! ```

mod bilinear;

pub use bilinear::BilinearRate;

use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::error::{AvgIntError, Result};

/// The five rates of the compartment model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateKind {
    /// Initial prevalence, only ever evaluated at age zero
    Pini,
    /// Incidence
    Iota,
    /// Remission
    Rho,
    /// Excess mortality
    Chi,
    /// Other-cause mortality
    Omega,
}

impl RateKind {
    pub const ALL: [RateKind; 5] = [
        RateKind::Pini,
        RateKind::Iota,
        RateKind::Rho,
        RateKind::Chi,
        RateKind::Omega,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Pini => "pini",
            Self::Iota => "iota",
            Self::Rho => "rho",
            Self::Chi => "chi",
            Self::Omega => "omega",
        }
    }
}

impl fmt::Display for RateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for RateKind {
    type Err = AvgIntError;

    fn from_str(s: &str) -> Result<Self> {
        RateKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| AvgIntError::UnknownRate {
                name: s.to_string(),
            })
    }
}

/// A rate as a function of age and time.
///
/// Implemented for every `Fn(f64, f64) -> f64` closure, so plain closures can
/// be handed to [`RateSetBuilder::rate`].
pub trait Rate: Send + Sync {
    fn eval(&self, age: f64, time: f64) -> f64;
}

impl<F> Rate for F
where
    F: Fn(f64, f64) -> f64 + Send + Sync,
{
    #[inline(always)]
    fn eval(&self, age: f64, time: f64) -> f64 {
        self(age, time)
    }
}

/// A rate that does not depend on age or time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constant(pub f64);

impl Rate for Constant {
    #[inline(always)]
    fn eval(&self, _age: f64, _time: f64) -> f64 {
        self.0
    }
}

/// The identically zero rate, bound to every slot the caller leaves empty
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Zero;

impl Rate for Zero {
    #[inline(always)]
    fn eval(&self, _age: f64, _time: f64) -> f64 {
        0.0
    }
}

/// The four rates that drive the ODE, evaluated at one `(age, time)` point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateValues {
    pub iota: f64,
    pub rho: f64,
    pub chi: f64,
    pub omega: f64,
}

impl RateValues {
    /// Largest of the four rates
    pub fn max(&self) -> f64 {
        self.iota.max(self.rho).max(self.chi).max(self.omega)
    }

    /// True when any of the four rates is NaN. [`RateValues::max`] skips
    /// NaN values, so check this first.
    pub fn has_nan(&self) -> bool {
        [self.iota, self.rho, self.chi, self.omega]
            .iter()
            .any(|x| x.is_nan())
    }
}

/// A complete mapping from [`RateKind`] to rate function.
#[derive(Clone)]
pub struct RateSet {
    slots: [Arc<dyn Rate>; 5],
}

impl RateSet {
    pub fn builder() -> RateSetBuilder {
        RateSetBuilder::default()
    }

    /// Build a rate set from `(name, rate)` pairs.
    ///
    /// Names must be one of `pini`, `iota`, `rho`, `chi`, `omega`; any other
    /// name is rejected with [`AvgIntError::UnknownRate`]. Names that do not
    /// appear are bound to [`Zero`].
    pub fn from_named<I, K>(rates: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Arc<dyn Rate>)>,
        K: AsRef<str>,
    {
        let mut builder = RateSet::builder();
        for (name, rate) in rates {
            let kind = name.as_ref().parse::<RateKind>()?;
            builder = builder.shared(kind, rate);
        }
        Ok(builder.build())
    }

    #[inline(always)]
    pub fn get(&self, kind: RateKind) -> &dyn Rate {
        self.slots[kind as usize].as_ref()
    }

    #[inline(always)]
    pub fn eval(&self, kind: RateKind, age: f64, time: f64) -> f64 {
        self.get(kind).eval(age, time)
    }

    /// Initial prevalence for the cohort born at `time`
    #[inline(always)]
    pub fn pini(&self, time: f64) -> f64 {
        self.eval(RateKind::Pini, 0.0, time)
    }

    /// Evaluate iota, rho, chi and omega once at `(age, time)`.
    #[inline(always)]
    pub fn at(&self, age: f64, time: f64) -> RateValues {
        RateValues {
            iota: self.eval(RateKind::Iota, age, time),
            rho: self.eval(RateKind::Rho, age, time),
            chi: self.eval(RateKind::Chi, age, time),
            omega: self.eval(RateKind::Omega, age, time),
        }
    }
}

impl Default for RateSet {
    fn default() -> Self {
        RateSet::builder().build()
    }
}

impl fmt::Debug for RateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateSet").finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct RateSetBuilder {
    slots: [Option<Arc<dyn Rate>>; 5],
}

impl RateSetBuilder {
    /// Set the rate for `kind`, replacing any earlier one
    pub fn rate<R: Rate + 'static>(self, kind: RateKind, rate: R) -> Self {
        self.shared(kind, Arc::new(rate))
    }

    /// Same as [`rate`](Self::rate) for a rate that is already shared
    pub fn shared(mut self, kind: RateKind, rate: Arc<dyn Rate>) -> Self {
        self.slots[kind as usize] = Some(rate);
        self
    }

    pub fn build(self) -> RateSet {
        RateSet {
            slots: self
                .slots
                .map(|slot| slot.unwrap_or_else(|| Arc::new(Zero) as Arc<dyn Rate>)),
        }
    }
}
