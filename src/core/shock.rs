use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which scalar of the model parameters a shock perturbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShockTarget {
    /// The FX spot rate.
    Spot,
    /// The model volatility (`sigma`).
    Vol,
}

impl fmt::Display for ShockTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShockTarget::Spot => write!(f, "spot"),
            ShockTarget::Vol => write!(f, "vol"),
        }
    }
}

impl FromStr for ShockTarget {
    type Err = ShockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spot" => Ok(ShockTarget::Spot),
            "vol" | "volatility" | "sigma" => Ok(ShockTarget::Vol),
            other => Err(ShockError::UnknownTarget(other.to_string())),
        }
    }
}

/// Supported shock magnitudes, in percent.
///
/// The set is closed: only 10%, 20% and 50% symmetric shocks exist.
///
/// # Examples
///
/// ```
/// use fx_sensitivity::core::shock::ShockMagnitude;
///
/// let m = ShockMagnitude::try_from(20).unwrap();
/// assert_eq!(m.percent(), 20);
/// assert!(ShockMagnitude::try_from(15).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ShockMagnitude {
    Ten,
    Twenty,
    Fifty,
}

impl ShockMagnitude {
    pub const ALL: [ShockMagnitude; 3] = [
        ShockMagnitude::Ten,
        ShockMagnitude::Twenty,
        ShockMagnitude::Fifty,
    ];

    pub fn percent(&self) -> u32 {
        match self {
            ShockMagnitude::Ten => 10,
            ShockMagnitude::Twenty => 20,
            ShockMagnitude::Fifty => 50,
        }
    }

    /// The magnitude as an exact fraction (`m / 100`).
    pub fn fraction(&self) -> Decimal {
        Decimal::from(self.percent()) / Decimal::ONE_HUNDRED
    }
}

impl TryFrom<u32> for ShockMagnitude {
    type Error = ShockError;

    fn try_from(pct: u32) -> Result<Self, Self::Error> {
        match pct {
            10 => Ok(ShockMagnitude::Ten),
            20 => Ok(ShockMagnitude::Twenty),
            50 => Ok(ShockMagnitude::Fifty),
            other => Err(ShockError::UnsupportedMagnitude(other)),
        }
    }
}

impl From<ShockMagnitude> for u32 {
    fn from(m: ShockMagnitude) -> Self {
        m.percent()
    }
}

impl fmt::Display for ShockMagnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// Errors arising from shock specification input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShockError {
    #[error("unsupported shock magnitude {0}%, expected one of 10, 20, 50")]
    UnsupportedMagnitude(u32),
    #[error("unknown shock target '{0}', expected 'spot' or 'vol'")]
    UnknownTarget(String),
}

/// A single symmetric shock: which scalar to move and by how much.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShockSpec {
    pub target: ShockTarget,
    pub magnitude: ShockMagnitude,
}

impl ShockSpec {
    pub fn new(target: ShockTarget, magnitude: ShockMagnitude) -> Self {
        Self { target, magnitude }
    }
}

impl fmt::Display for ShockSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ±{}", self.target, self.magnitude)
    }
}
