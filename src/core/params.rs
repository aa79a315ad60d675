use crate::core::shock::ShockTarget;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised when model or run parameters are unusable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: Decimal },
    #[error("{field} must be at least 1, got {value}")]
    ZeroCount { field: &'static str, value: u32 },
    #[error("unknown model '{0}', expected 'gbm' or 'ou'")]
    UnknownModel(String),
    #[error("{field} {value} overflows when shifted by {factor}")]
    ShiftOverflow {
        field: &'static str,
        value: Decimal,
        factor: Decimal,
    },
}

/// The stochastic model family a run simulates under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Gbm,
    Ou,
}

impl ModelKind {
    /// Wire name used in the `model` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Gbm => "gbm",
            ModelKind::Ou => "ou",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gbm" => Ok(ModelKind::Gbm),
            "ou" => Ok(ModelKind::Ou),
            other => Err(ParamError::UnknownModel(other.to_string())),
        }
    }
}

/// Parameters of the spot model, one variant per supported model.
///
/// Exactly one variant is active for a run and the value is never mutated
/// once the run starts; shocked copies are produced with [`ModelParameters::shocked`].
///
/// # Examples
///
/// ```
/// use fx_sensitivity::core::params::ModelParameters;
/// use fx_sensitivity::core::shock::ShockTarget;
/// use rust_decimal_macros::dec;
///
/// let base = ModelParameters::Gbm { spot: dec!(1.10), sigma: dec!(0.15), mu: dec!(0.02) };
/// let up = base.shocked(ShockTarget::Spot, dec!(1.2)).unwrap();
/// assert_eq!(up.spot(), dec!(1.32));
/// assert_eq!(up.sigma(), dec!(0.15));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum ModelParameters {
    /// Geometric Brownian motion.
    Gbm {
        spot: Decimal,
        sigma: Decimal,
        /// Drift. Part of the model but not sent to the simulation service.
        mu: Decimal,
    },
    /// Mean-reverting Ornstein-Uhlenbeck.
    Ou {
        spot: Decimal,
        /// Speed of mean reversion.
        kappa: Decimal,
        /// Long-run level.
        theta: Decimal,
        sigma: Decimal,
    },
}

impl ModelParameters {
    pub fn gbm_default() -> Self {
        ModelParameters::Gbm {
            spot: dec!(1.10),
            sigma: dec!(0.15),
            mu: dec!(0.02),
        }
    }

    pub fn ou_default() -> Self {
        ModelParameters::Ou {
            spot: dec!(1.10),
            kappa: dec!(3),
            theta: dec!(1.10),
            sigma: dec!(0.12),
        }
    }

    pub fn default_for(kind: ModelKind) -> Self {
        match kind {
            ModelKind::Gbm => Self::gbm_default(),
            ModelKind::Ou => Self::ou_default(),
        }
    }

    /// Replace the fields set in `overrides`. Fields the active model does
    /// not have are ignored.
    pub fn with_overrides(&self, overrides: &ParameterOverrides) -> Self {
        match *self {
            ModelParameters::Gbm { spot, sigma, mu } => ModelParameters::Gbm {
                spot: overrides.spot.unwrap_or(spot),
                sigma: overrides.sigma.unwrap_or(sigma),
                mu: overrides.mu.unwrap_or(mu),
            },
            ModelParameters::Ou {
                spot,
                kappa,
                theta,
                sigma,
            } => ModelParameters::Ou {
                spot: overrides.spot.unwrap_or(spot),
                kappa: overrides.kappa.unwrap_or(kappa),
                theta: overrides.theta.unwrap_or(theta),
                sigma: overrides.sigma.unwrap_or(sigma),
            },
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            ModelParameters::Gbm { .. } => ModelKind::Gbm,
            ModelParameters::Ou { .. } => ModelKind::Ou,
        }
    }

    pub fn spot(&self) -> Decimal {
        match self {
            ModelParameters::Gbm { spot, .. } | ModelParameters::Ou { spot, .. } => *spot,
        }
    }

    pub fn sigma(&self) -> Decimal {
        match self {
            ModelParameters::Gbm { sigma, .. } | ModelParameters::Ou { sigma, .. } => *sigma,
        }
    }

    /// Return a copy with the `target` scalar multiplied by `factor`.
    ///
    /// Exactly one field moves; every other field is copied bit for bit.
    /// Returns [`ParamError::ShiftOverflow`] when the product leaves `Decimal` range.
    pub fn shocked(&self, target: ShockTarget, factor: Decimal) -> Result<Self, ParamError> {
        let (field, value) = match target {
            ShockTarget::Spot => ("spot", self.spot()),
            ShockTarget::Vol => ("sigma", self.sigma()),
        };
        let shifted = value.checked_mul(factor).ok_or(ParamError::ShiftOverflow {
            field,
            value,
            factor,
        })?;

        let mut out = *self;
        match (&mut out, target) {
            (ModelParameters::Gbm { spot, .. }, ShockTarget::Spot)
            | (ModelParameters::Ou { spot, .. }, ShockTarget::Spot) => *spot = shifted,
            (ModelParameters::Gbm { sigma, .. }, ShockTarget::Vol)
            | (ModelParameters::Ou { sigma, .. }, ShockTarget::Vol) => *sigma = shifted,
        }
        Ok(out)
    }

    /// Reject parameter sets the simulation cannot meaningfully run.
    pub fn validate(&self) -> Result<(), ParamError> {
        positive("spot", self.spot())?;
        positive("sigma", self.sigma())?;
        if let ModelParameters::Ou { kappa, theta, .. } = self {
            positive("kappa", *kappa)?;
            positive("theta", *theta)?;
        }
        Ok(())
    }
}

impl fmt::Display for ModelParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelParameters::Gbm { spot, sigma, mu } => {
                write!(f, "GBM(spot={}, sigma={}, mu={})", spot, sigma, mu)
            }
            ModelParameters::Ou {
                spot,
                kappa,
                theta,
                sigma,
            } => write!(
                f,
                "OU(spot={}, kappa={}, theta={}, sigma={})",
                spot, kappa, theta, sigma
            ),
        }
    }
}

/// Optional user-entered values layered over model defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParameterOverrides {
    pub spot: Option<Decimal>,
    pub sigma: Option<Decimal>,
    pub mu: Option<Decimal>,
    pub kappa: Option<Decimal>,
    pub theta: Option<Decimal>,
}

impl ParameterOverrides {
    /// Names of set fields that `kind` has no use for.
    pub fn unused_for(&self, kind: ModelKind) -> Vec<&'static str> {
        let mut unused = Vec::new();
        match kind {
            ModelKind::Gbm => {
                if self.kappa.is_some() {
                    unused.push("kappa");
                }
                if self.theta.is_some() {
                    unused.push("theta");
                }
            }
            ModelKind::Ou => {
                if self.mu.is_some() {
                    unused.push("mu");
                }
            }
        }
        unused
    }
}

/// Economic and resolution settings shared by all scenarios of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Forward maturity in years.
    pub maturity: Decimal,
    pub domestic_rate: Decimal,
    pub foreign_rate: Decimal,
    pub path_count: u32,
    pub step_count: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            maturity: dec!(1),
            domestic_rate: dec!(0.05),
            foreign_rate: dec!(0.03),
            path_count: 5_000,
            step_count: 252,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ParamError> {
        positive("maturity", self.maturity)?;
        if self.path_count == 0 {
            return Err(ParamError::ZeroCount {
                field: "paths",
                value: self.path_count,
            });
        }
        if self.step_count == 0 {
            return Err(ParamError::ZeroCount {
                field: "steps",
                value: self.step_count,
            });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: Decimal) -> Result<(), ParamError> {
    if value <= Decimal::ZERO {
        return Err(ParamError::NonPositive { field, value });
    }
    Ok(())
}
