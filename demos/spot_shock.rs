//! Spot and volatility shock walk-through.
//!
//! Plans the three scenarios for each supported magnitude and prints the
//! requests a run would send, without contacting the simulation service.

use fx_sensitivity::core::params::{ModelParameters, ParamError, RunConfig};
use fx_sensitivity::core::shock::{ShockMagnitude, ShockSpec, ShockTarget};
use fx_sensitivity::orchestration::controller::RunSnapshot;
use fx_sensitivity::scenario::planner::plan;

const BASE_URL: &str = "http://localhost:8080";

fn main() -> Result<(), ParamError> {
    println!("╔══════════════════════════════════════════╗");
    println!("║  fx-sensitivity: Shock Scenario Example  ║");
    println!("╚══════════════════════════════════════════╝\n");

    // --- Scenario 1: planning ---
    println!("━━━ Scenario 1: Planned Shifts ━━━\n");

    for magnitude in ShockMagnitude::ALL {
        let factors: Vec<String> = plan(magnitude)
            .iter()
            .map(|s| format!("{} (x{})", s.label, s.shift_factor))
            .collect();
        println!("{}: {}", magnitude, factors.join("  |  "));
    }
    println!();

    // --- Scenario 2: spot shock under GBM ---
    println!("━━━ Scenario 2: GBM Spot Shock ±20% ━━━\n");

    let snapshot = RunSnapshot::new(
        ModelParameters::gbm_default(),
        ShockSpec::new(ShockTarget::Spot, ShockMagnitude::Twenty),
        RunConfig::default(),
    );
    println!("Base: {}\n", snapshot.params);
    for request in snapshot.requests()? {
        println!(
            "  {:<10} spot={}  sigma_gbm={}",
            request.label,
            request.param("spot").unwrap_or("-"),
            request.param("sigma_gbm").unwrap_or("-"),
        );
    }
    println!();

    // --- Scenario 3: volatility shock under OU ---
    println!("━━━ Scenario 3: OU Volatility Shock ±10% ━━━\n");

    let snapshot = RunSnapshot::new(
        ModelParameters::ou_default(),
        ShockSpec::new(ShockTarget::Vol, ShockMagnitude::Ten),
        RunConfig::default(),
    );
    println!("Base: {}\n", snapshot.params);
    for request in snapshot.requests()? {
        println!("  {:<10} {}", request.label, request.url(BASE_URL));
    }
    Ok(())
}
