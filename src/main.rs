//! fx-sensitivity CLI
//!
//! Run spot or volatility sensitivity scenarios against a simulation service.
//!
//! # Usage
//!
//! ```bash
//! # Show the three scenarios for a 20% shock
//! fx-sensitivity plan --magnitude 20
//!
//! # Print the requests a run would issue, without calling the service
//! fx-sensitivity requests --model ou --shock vol --magnitude 10
//!
//! # Run the batch and print JSON
//! fx-sensitivity run --model gbm --spot 1.10 --shock spot --magnitude 20 --format json
//! ```

use fx_sensitivity::client::http::HttpSimulationClient;
use fx_sensitivity::config::OrchestratorConfig;
use fx_sensitivity::core::params::{ModelKind, ModelParameters, ParameterOverrides, RunConfig};
use fx_sensitivity::core::shock::{ShockMagnitude, ShockSpec, ShockTarget};
use fx_sensitivity::orchestration::controller::{RunController, RunSnapshot};
use fx_sensitivity::scenario::planner::plan;
use rust_decimal::Decimal;
use std::fmt::Display;
use std::path::Path;
use std::process;
use std::str::FromStr;

fn print_usage() {
    eprintln!(
        r#"fx-sensitivity — FX forward spot/volatility sensitivity scenarios

USAGE:
    fx-sensitivity <COMMAND> [OPTIONS]

COMMANDS:
    plan        Show the Down/Base/Up scenarios for a shock magnitude
    requests    Print the simulation requests of a run (no network)
    run         Run the three scenarios and print the combined result
    help        Show this message

MODEL OPTIONS:
    --model <gbm|ou>        Spot model (default: gbm)
    --spot <X>              Spot rate (default: 1.10)
    --sigma <X>             Volatility (default: 0.15 gbm, 0.12 ou)
    --mu <X>                GBM drift (default: 0.02)
    --kappa <X>             OU mean reversion speed (default: 3)
    --theta <X>             OU long-run level (default: 1.10)

SHOCK OPTIONS:
    --shock <spot|vol>      Parameter to shock (default: spot)
    --magnitude <10|20|50>  Shock size in percent (default: 10)

RUN OPTIONS:
    --maturity <YEARS>      Forward maturity (default: 1)
    --r-dom <X>             Domestic rate (default: 0.05)
    --r-for <X>             Foreign rate (default: 0.03)
    --paths <N>             Simulated paths (default: 5000)
    --steps <N>             Time steps (default: 252)
    --config <FILE>         TOML orchestrator config
    --format <FORMAT>       Output format: text (default) or json

ENVIRONMENT:
    FXSENS_BASE_URL         Simulation service base URL
    FXSENS_TIMEOUT_MS       Per-request timeout in milliseconds
    RUST_LOG                Log filter (default: info)

EXAMPLES:
    fx-sensitivity plan --magnitude 50
    fx-sensitivity requests --model ou --shock vol --magnitude 10
    fx-sensitivity run --spot 1.10 --shock spot --magnitude 20
    fx-sensitivity run --model ou --shock vol --format json --config fxsens.toml"#
    );
}

fn fail(message: impl Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn parse_value<T>(flag: &str, value: Option<&String>) -> T
where
    T: FromStr,
    T::Err: Display,
{
    let raw = value.unwrap_or_else(|| fail(format!("{} requires a value", flag)));
    raw.parse()
        .unwrap_or_else(|e| fail(format!("invalid value '{}' for {}: {}", raw, flag, e)))
}

#[derive(Default)]
struct Options {
    model: Option<ModelKind>,
    overrides: ParameterOverrides,
    shock: Option<ShockTarget>,
    magnitude: Option<ShockMagnitude>,
    maturity: Option<Decimal>,
    r_dom: Option<Decimal>,
    r_for: Option<Decimal>,
    paths: Option<u32>,
    steps: Option<u32>,
    config: Option<String>,
    json: bool,
}

impl Options {
    fn parse(args: &[String]) -> Self {
        let mut opts = Options::default();
        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            let value = args.get(i + 1);
            match flag {
                "--model" => opts.model = Some(parse_value(flag, value)),
                "--spot" => opts.overrides.spot = Some(parse_value(flag, value)),
                "--sigma" => opts.overrides.sigma = Some(parse_value(flag, value)),
                "--mu" => opts.overrides.mu = Some(parse_value(flag, value)),
                "--kappa" => opts.overrides.kappa = Some(parse_value(flag, value)),
                "--theta" => opts.overrides.theta = Some(parse_value(flag, value)),
                "--shock" => opts.shock = Some(parse_value(flag, value)),
                "--magnitude" => {
                    let pct: u32 = parse_value(flag, value);
                    opts.magnitude =
                        Some(ShockMagnitude::try_from(pct).unwrap_or_else(|e| fail(e)));
                }
                "--maturity" => opts.maturity = Some(parse_value(flag, value)),
                "--r-dom" => opts.r_dom = Some(parse_value(flag, value)),
                "--r-for" => opts.r_for = Some(parse_value(flag, value)),
                "--paths" => opts.paths = Some(parse_value(flag, value)),
                "--steps" => opts.steps = Some(parse_value(flag, value)),
                "--config" => opts.config = Some(parse_value(flag, value)),
                "--format" => {
                    let format: String = parse_value(flag, value);
                    opts.json = match format.as_str() {
                        "json" => true,
                        "text" => false,
                        other => fail(format!("--format must be 'text' or 'json', got '{}'", other)),
                    };
                }
                _ => fail(format!("unknown option: {}", flag)),
            }
            i += 2;
        }
        opts
    }

    fn model_parameters(&self) -> ModelParameters {
        let kind = self.model.unwrap_or(ModelKind::Gbm);
        for field in self.overrides.unused_for(kind) {
            eprintln!("Warning: --{} is ignored for the {} model", field, kind);
        }
        ModelParameters::default_for(kind).with_overrides(&self.overrides)
    }

    fn shock(&self) -> ShockSpec {
        ShockSpec::new(
            self.shock.unwrap_or(ShockTarget::Spot),
            self.magnitude.unwrap_or(ShockMagnitude::Ten),
        )
    }

    fn run_config(&self) -> RunConfig {
        let defaults = RunConfig::default();
        RunConfig {
            maturity: self.maturity.unwrap_or(defaults.maturity),
            domestic_rate: self.r_dom.unwrap_or(defaults.domestic_rate),
            foreign_rate: self.r_for.unwrap_or(defaults.foreign_rate),
            path_count: self.paths.unwrap_or(defaults.path_count),
            step_count: self.steps.unwrap_or(defaults.step_count),
        }
    }

    fn snapshot(&self) -> RunSnapshot {
        RunSnapshot::new(self.model_parameters(), self.shock(), self.run_config())
    }

    fn orchestrator_config(&self) -> OrchestratorConfig {
        let config = match &self.config {
            Some(path) => OrchestratorConfig::load(Path::new(path)).unwrap_or_else(|e| fail(e)),
            None => OrchestratorConfig::default(),
        };
        let config = config.with_env_override().unwrap_or_else(|e| fail(e));
        if let Err(e) = config.validate() {
            fail(e);
        }
        config
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| fail(format!("cannot render JSON: {}", e)))
}

fn cmd_plan(args: &[String]) {
    let opts = Options::parse(args);
    let scenarios = plan(opts.shock().magnitude);
    if opts.json {
        println!("{}", to_json(&scenarios));
    } else {
        for scenario in &scenarios {
            println!("{:<12} factor {}", scenario.label, scenario.shift_factor);
        }
    }
}

fn cmd_requests(args: &[String]) {
    let opts = Options::parse(args);
    let config = opts.orchestrator_config();
    let snapshot = opts.snapshot();
    if let Err(e) = snapshot.params.validate().and(snapshot.run.validate()) {
        fail(e);
    }

    let requests = snapshot.requests().unwrap_or_else(|e| fail(e));
    if opts.json {
        println!("{}", to_json(&requests));
    } else {
        println!("Model:  {}", snapshot.params);
        println!("Shock:  {}", snapshot.shock);
        for request in &requests {
            println!("{:<12} {}", request.label, request.url(&config.base_url));
        }
    }
}

async fn cmd_run(args: &[String]) {
    let opts = Options::parse(args);
    let config = opts.orchestrator_config();
    let snapshot = opts.snapshot();

    let client = HttpSimulationClient::from_config(&config).unwrap_or_else(|e| fail(e));
    let controller = RunController::with_dispatch(client, config.dispatch);

    if let Err(e) = controller.start(snapshot).await {
        fail(e);
    }
    let outcome = controller
        .outcome()
        .unwrap_or_else(|| fail("run finished without a published result"));

    if opts.json {
        println!("{}", to_json(&outcome));
    } else {
        println!("Run:    {}", outcome.run_id);
        println!("Model:  {}", outcome.snapshot.params);
        println!("Shock:  {}", outcome.snapshot.shock);
        println!(
            "Took:   {} ms\n",
            (outcome.finished_at - outcome.started_at).num_milliseconds()
        );
        println!("{}", outcome.result);
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "plan" => cmd_plan(rest),
        "requests" => cmd_requests(rest),
        "run" => cmd_run(rest).await,
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
