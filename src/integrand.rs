//! Instantaneous value of a measured quantity at one `(age, time)` point

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::{AvgIntError, Result},
    ode::{compartment_state_with, SolverOptions},
    rates::RateSet,
};

/// The measurement kinds that are functions of the rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntegrandKind {
    /// Incidence relative to the susceptible population, `iota`
    #[serde(rename = "Sincidence")]
    SIncidence,
    /// `rho`
    #[serde(rename = "remission")]
    Remission,
    /// `chi`
    #[serde(rename = "mtexcess")]
    MtExcess,
    /// `omega`
    #[serde(rename = "mtother")]
    MtOther,
    /// Mortality of those with the condition, `omega + chi`
    #[serde(rename = "mtwith")]
    MtWith,
    /// Relative risk, `(omega + chi) / omega`
    #[serde(rename = "relrisk")]
    RelRisk,
    /// `S`
    #[serde(rename = "susceptible")]
    Susceptible,
    /// `C`
    #[serde(rename = "withC")]
    WithC,
    /// `P = C / (S + C)`
    #[serde(rename = "prevalence")]
    Prevalence,
    /// Incidence relative to the total population, `iota (1 - P)`
    #[serde(rename = "Tincidence")]
    TIncidence,
    /// Cause-specific mortality, `chi P`
    #[serde(rename = "mtspecific")]
    MtSpecific,
    /// All-cause mortality, `omega + chi P`
    #[serde(rename = "mtall")]
    MtAll,
    /// Standardized mortality ratio, `(omega + chi) / (omega + chi P)`
    #[serde(rename = "mtstandard")]
    MtStandard,
}

impl IntegrandKind {
    pub const ALL: [IntegrandKind; 13] = [
        IntegrandKind::SIncidence,
        IntegrandKind::Remission,
        IntegrandKind::MtExcess,
        IntegrandKind::MtOther,
        IntegrandKind::MtWith,
        IntegrandKind::RelRisk,
        IntegrandKind::Susceptible,
        IntegrandKind::WithC,
        IntegrandKind::Prevalence,
        IntegrandKind::TIncidence,
        IntegrandKind::MtSpecific,
        IntegrandKind::MtAll,
        IntegrandKind::MtStandard,
    ];

    /// Name used by the integrand table of the wider tool
    pub fn name(&self) -> &'static str {
        match self {
            Self::SIncidence => "Sincidence",
            Self::Remission => "remission",
            Self::MtExcess => "mtexcess",
            Self::MtOther => "mtother",
            Self::MtWith => "mtwith",
            Self::RelRisk => "relrisk",
            Self::Susceptible => "susceptible",
            Self::WithC => "withC",
            Self::Prevalence => "prevalence",
            Self::TIncidence => "Tincidence",
            Self::MtSpecific => "mtspecific",
            Self::MtAll => "mtall",
            Self::MtStandard => "mtstandard",
        }
    }

    /// True when the value needs the compartment state
    pub fn requires_ode(&self) -> bool {
        matches!(
            self,
            Self::Susceptible
                | Self::WithC
                | Self::Prevalence
                | Self::TIncidence
                | Self::MtSpecific
                | Self::MtAll
                | Self::MtStandard
        )
    }
}

impl fmt::Display for IntegrandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for IntegrandKind {
    type Err = AvgIntError;

    fn from_str(s: &str) -> Result<Self> {
        IntegrandKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| AvgIntError::UnsupportedIntegrand {
                name: s.to_string(),
            })
    }
}

/// Value of `kind` at `(age, time)` with the default [`SolverOptions`].
pub fn integrand_value(
    age: f64,
    time: f64,
    rates: &RateSet,
    kind: IntegrandKind,
    abs_tol: f64,
) -> Result<f64> {
    integrand_value_with(age, time, rates, kind, abs_tol, &SolverOptions::default())
}

/// Value of `kind` at `(age, time)`.
///
/// The rates are evaluated once at the point. Kinds that only depend on the
/// rates never touch the ODE solver. `relrisk` divides by `omega` without a
/// guard, so a zero `omega` gives an IEEE infinity or NaN.
pub fn integrand_value_with(
    age: f64,
    time: f64,
    rates: &RateSet,
    kind: IntegrandKind,
    abs_tol: f64,
    options: &SolverOptions,
) -> Result<f64> {
    let r = rates.at(age, time);
    let state = || compartment_state_with(age, time, rates, abs_tol, options);
    let prevalence = || state().map(|x| x.prevalence());

    Ok(match kind {
        IntegrandKind::SIncidence => r.iota,
        IntegrandKind::Remission => r.rho,
        IntegrandKind::MtExcess => r.chi,
        IntegrandKind::MtOther => r.omega,
        IntegrandKind::MtWith => r.omega + r.chi,
        IntegrandKind::RelRisk => (r.omega + r.chi) / r.omega,
        IntegrandKind::Susceptible => state()?.s,
        IntegrandKind::WithC => state()?.c,
        IntegrandKind::Prevalence => prevalence()?,
        IntegrandKind::TIncidence => r.iota * (1.0 - prevalence()?),
        IntegrandKind::MtSpecific => r.chi * prevalence()?,
        IntegrandKind::MtAll => r.omega + r.chi * prevalence()?,
        // the denominator stays positive when omega is zero but chi and P are not
        IntegrandKind::MtStandard => (r.omega + r.chi) / (r.omega + r.chi * prevalence()?),
    })
}
