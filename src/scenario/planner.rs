//! Scenario planning: one shock magnitude in, three comparable legs out.

use crate::core::shock::ShockMagnitude;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a scenario within the symmetric shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScenarioKind {
    Down,
    Base,
    Up,
}

/// One leg of a sensitivity run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub kind: ScenarioKind,
    pub label: String,
    /// Multiplier applied to the shocked scalar.
    pub shift_factor: Decimal,
}

impl Scenario {
    pub fn is_base(&self) -> bool {
        self.kind == ScenarioKind::Base
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (x{})", self.label, self.shift_factor)
    }
}

/// Plan the Down, Base and Up scenarios for a shock magnitude.
///
/// The result does not depend on which scalar is shocked; that is applied
/// when requests are built.
///
/// # Examples
///
/// ```
/// use fx_sensitivity::core::shock::ShockMagnitude;
/// use fx_sensitivity::scenario::planner::plan;
/// use rust_decimal_macros::dec;
///
/// let [down, base, up] = plan(ShockMagnitude::Twenty);
/// assert_eq!(down.label, "Down -20%");
/// assert_eq!(down.shift_factor, dec!(0.8));
/// assert!(base.is_base());
/// assert_eq!(up.shift_factor, dec!(1.2));
/// ```
pub fn plan(magnitude: ShockMagnitude) -> [Scenario; 3] {
    let m = magnitude.percent();
    let fraction = magnitude.fraction();
    [
        Scenario {
            kind: ScenarioKind::Down,
            label: format!("Down -{}%", m),
            shift_factor: Decimal::ONE - fraction,
        },
        Scenario {
            kind: ScenarioKind::Base,
            label: "Base 0%".to_string(),
            shift_factor: Decimal::ONE,
        },
        Scenario {
            kind: ScenarioKind::Up,
            label: format!("Up +{}%", m),
            shift_factor: Decimal::ONE + fraction,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_plan_ten() {
        let scenarios = plan(ShockMagnitude::Ten);
        let labels: Vec<&str> = scenarios.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Down -10%", "Base 0%", "Up +10%"]);
        let factors: Vec<Decimal> = scenarios.iter().map(|s| s.shift_factor).collect();
        assert_eq!(factors, vec![dec!(0.9), dec!(1), dec!(1.1)]);
    }

    #[test]
    fn test_plan_fifty() {
        let [down, base, up] = plan(ShockMagnitude::Fifty);
        assert_eq!(down.shift_factor, dec!(0.5));
        assert_eq!(base.shift_factor, Decimal::ONE);
        assert_eq!(up.shift_factor, dec!(1.5));
        assert_eq!(up.label, "Up +50%");
    }

    #[test]
    fn test_plan_order_and_base_flag() {
        let scenarios = plan(ShockMagnitude::Twenty);
        let kinds: Vec<ScenarioKind> = scenarios.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![ScenarioKind::Down, ScenarioKind::Base, ScenarioKind::Up]
        );
        assert_eq!(scenarios.iter().filter(|s| s.is_base()).count(), 1);
    }

    #[test]
    fn test_plan_is_deterministic() {
        assert_eq!(plan(ShockMagnitude::Twenty), plan(ShockMagnitude::Twenty));
    }
}
