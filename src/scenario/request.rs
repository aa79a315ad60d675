use crate::core::params::{ModelKind, ModelParameters, ParamError, RunConfig};
use crate::core::shock::ShockSpec;
use crate::scenario::planner::{Scenario, ScenarioKind};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Path of the simulation endpoint, relative to the service base URL.
pub const SIMULATION_PATH: &str = "/api/simulation/fx-forward-paths";

/// Render a value with exactly four fractional digits.
///
/// Rounds half away from zero, so `0.13205` becomes `0.1321`. Padding is
/// done on the plain decimal string, so magnitudes near `Decimal::MAX` are
/// rendered too.
///
/// # Examples
///
/// ```
/// use fx_sensitivity::scenario::request::format_fixed4;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_fixed4(dec!(1.1)), "1.1000");
/// assert_eq!(format_fixed4(dec!(0.132)), "0.1320");
/// ```
pub fn format_fixed4(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero);
    let mut text = rounded.to_string();
    let digits = match text.find('.') {
        Some(dot) => text.len() - dot - 1,
        None => {
            text.push('.');
            0
        }
    };
    text.extend(std::iter::repeat('0').take(4usize.saturating_sub(digits)));
    text
}

/// A fully specified call to the simulation service for one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationRequest {
    /// Scenario label. Travels with the request for error reporting; not sent.
    pub label: String,
    pub kind: ScenarioKind,
    pub model: ModelKind,
    /// The parameters actually simulated, after the shock.
    pub effective: ModelParameters,
    query: Vec<(&'static str, String)>,
}

impl SimulationRequest {
    /// Query parameters in wire order.
    pub fn query_pairs(&self) -> &[(&'static str, String)] {
        &self.query
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn query_string(&self) -> String {
        self.query
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Full URL against `base_url` (trailing slashes tolerated).
    pub fn url(&self, base_url: &str) -> String {
        format!(
            "{}{}?{}",
            base_url.trim_end_matches('/'),
            SIMULATION_PATH,
            self.query_string()
        )
    }
}

/// Shapes simulation requests from a scenario and the run's inputs.
pub struct RequestBuilder;

impl RequestBuilder {
    /// Build the request for one scenario.
    ///
    /// The shock target's scalar is multiplied by the scenario's shift
    /// factor; everything else is passed through. Model-specific fields are
    /// chosen by the active parameter variant. Fails only when the shifted
    /// scalar does not fit in a `Decimal`.
    pub fn build(
        scenario: &Scenario,
        base: &ModelParameters,
        shock: &ShockSpec,
        run: &RunConfig,
    ) -> Result<SimulationRequest, ParamError> {
        let effective = base.shocked(shock.target, scenario.shift_factor)?;

        let mut query: Vec<(&'static str, String)> = vec![
            ("model", effective.kind().as_str().to_string()),
            ("paths", run.path_count.to_string()),
            ("steps", run.step_count.to_string()),
            ("maturity", run.maturity.to_string()),
            ("r_dom", run.domestic_rate.to_string()),
            ("r_for", run.foreign_rate.to_string()),
            ("spot", format_fixed4(effective.spot())),
        ];

        match effective {
            ModelParameters::Gbm { sigma, .. } => {
                query.push(("sigma_gbm", format_fixed4(sigma)));
            }
            ModelParameters::Ou {
                kappa,
                theta,
                sigma,
                ..
            } => {
                query.push(("sigma_ou", format_fixed4(sigma)));
                query.push(("kappa", kappa.to_string()));
                query.push(("theta", theta.to_string()));
            }
        }

        Ok(SimulationRequest {
            label: scenario.label.clone(),
            kind: scenario.kind,
            model: effective.kind(),
            effective,
            query,
        })
    }
}
