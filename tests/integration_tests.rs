use async_trait::async_trait;
use fx_sensitivity::client::error::SimulationError;
use fx_sensitivity::client::http::SimulationClient;
use fx_sensitivity::core::params::{ModelParameters, RunConfig};
use fx_sensitivity::core::shock::{ShockMagnitude, ShockSpec, ShockTarget};
use fx_sensitivity::core::stats::{RawScenarioResult, StatsPoint};
use fx_sensitivity::orchestration::controller::{
    Dispatch, RunController, RunError, RunSnapshot, RunState,
};
use fx_sensitivity::scenario::request::SimulationRequest;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{Notify, Semaphore};

/// Builds a deterministic two-point series from the request's spot.
fn synthetic_result(request: &SimulationRequest) -> RawScenarioResult {
    let spot: f64 = request
        .param("spot")
        .and_then(|s| s.parse().ok())
        .unwrap_or(f64::NAN);
    RawScenarioResult::new(
        vec![
            StatsPoint::new(0.0, spot, spot, spot),
            StatsPoint::new(1.0, spot * 1.01, spot * 0.8, spot * 1.2),
        ],
        vec![
            StatsPoint::new(0.0, 0.0, 0.0, 0.0),
            StatsPoint::new(1.0, spot - 1.1, spot - 1.4, spot - 0.8),
        ],
    )
}

/// Client that answers from the request, optionally failing or delaying per label.
#[derive(Default)]
struct ScriptedClient {
    failures: HashMap<String, SimulationError>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedClient {
    fn failing(mut self, label: &str, error: SimulationError) -> Self {
        self.failures.insert(label.to_string(), error);
        self
    }

    fn delayed(mut self, label: &str, delay: Duration) -> Self {
        self.delays.insert(label.to_string(), delay);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SimulationClient for ScriptedClient {
    async fn call(&self, request: &SimulationRequest) -> Result<RawScenarioResult, SimulationError> {
        self.calls.lock().unwrap().push(request.label.clone());
        if let Some(delay) = self.delays.get(&request.label) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(err) = self.failures.get(&request.label) {
            return Err(err.clone());
        }
        Ok(synthetic_result(request))
    }
}

/// Client that blocks every call until the test releases a permit.
struct GatedClient {
    entered: Notify,
    gate: Semaphore,
    calls: AtomicUsize,
}

impl GatedClient {
    fn new() -> Self {
        Self {
            entered: Notify::new(),
            gate: Semaphore::new(0),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SimulationClient for GatedClient {
    async fn call(&self, request: &SimulationRequest) -> Result<RawScenarioResult, SimulationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| SimulationError::transport(e.to_string()))?;
        permit.forget();
        Ok(synthetic_result(request))
    }
}

fn spot_shock(magnitude: ShockMagnitude) -> RunSnapshot {
    RunSnapshot::new(
        ModelParameters::gbm_default(),
        ShockSpec::new(ShockTarget::Spot, magnitude),
        RunConfig::default(),
    )
}

/// Full pipeline: plan → build → call → aggregate → publish.
#[tokio::test]
async fn full_run_publishes_ordered_tagged_series() {
    let controller = RunController::new(ScriptedClient::default());
    let result = controller
        .start(spot_shock(ShockMagnitude::Twenty))
        .await
        .unwrap();

    assert_eq!(controller.state(), RunState::Succeeded);
    assert_eq!(result.underlying.len(), 6);
    assert_eq!(result.present_value.len(), 6);
    assert_eq!(result.labels(), vec!["Down -20%", "Base 0%", "Up +20%"]);

    let initial_spots: Vec<f64> = result
        .underlying
        .iter()
        .filter(|p| p.time == 0.0)
        .map(|p| p.mean)
        .collect();
    assert_eq!(initial_spots, vec![0.88, 1.10, 1.32]);

    let outcome = controller.outcome().unwrap();
    assert_eq!(Some(outcome.run_id), controller.run_id());
    assert_eq!(outcome.result, result);
    assert!(controller.last_error().is_none());
}

#[tokio::test]
async fn second_scenario_failure_fails_whole_run() {
    let client = ScriptedClient::default().failing("Base 0%", SimulationError::Status { code: 502 });
    let controller = RunController::new(client);

    let err = controller
        .start(spot_shock(ShockMagnitude::Ten))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        RunError::Scenario {
            label: "Base 0%".to_string(),
            source: SimulationError::Status { code: 502 },
        }
    );
    assert_eq!(controller.state(), RunState::Failed);
    assert!(controller.result().is_none());
    assert!(controller.outcome().is_none());
    let message = controller.last_error_message().unwrap();
    assert!(message.contains("Base 0%"));
    assert!(message.contains("502"));
}

#[tokio::test]
async fn sequential_dispatch_stops_at_first_failure() {
    let client = ScriptedClient::default().failing(
        "Down -50%",
        SimulationError::transport("connection refused"),
    );
    let controller = RunController::new(client);
    assert!(controller.start(spot_shock(ShockMagnitude::Fifty)).await.is_err());

    // Base and Up are never issued once Down fails.
    assert_eq!(controller.client_calls(), vec!["Down -50%"]);
}

#[tokio::test]
async fn failed_rerun_clears_previous_result() {
    let controller = RunController::new(
        ScriptedClient::default().failing("Up +50%", SimulationError::parse("missing pvStats")),
    );

    controller
        .start(spot_shock(ShockMagnitude::Ten))
        .await
        .unwrap();
    assert!(controller.result().is_some());

    let err = controller
        .start(spot_shock(ShockMagnitude::Fifty))
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::Scenario { ref label, .. } if label == "Up +50%"));
    assert_eq!(controller.state(), RunState::Failed);
    assert!(controller.result().is_none(), "stale result must not survive a failed rerun");

    // Failed → Running → Succeeded with a fresh, fully replaced result.
    let result = controller
        .start(spot_shock(ShockMagnitude::Twenty))
        .await
        .unwrap();
    assert_eq!(controller.state(), RunState::Succeeded);
    assert_eq!(result.labels(), vec!["Down -20%", "Base 0%", "Up +20%"]);
    assert!(controller.last_error().is_none());
}

#[tokio::test]
async fn start_while_running_is_rejected() {
    let controller = Arc::new(RunController::new(GatedClient::new()));

    let background = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.start(spot_shock(ShockMagnitude::Ten)).await })
    };

    controller.client().entered.notified().await;
    assert_eq!(controller.state(), RunState::Running);
    let in_flight = controller.run_id();

    let err = controller
        .start(spot_shock(ShockMagnitude::Fifty))
        .await
        .unwrap_err();
    assert_eq!(err, RunError::ConcurrentRunRejected);
    assert_eq!(controller.state(), RunState::Running);
    assert_eq!(controller.run_id(), in_flight);
    assert_eq!(controller.client().calls.load(Ordering::SeqCst), 1);

    controller.client().gate.add_permits(3);
    let result = background.await.unwrap().unwrap();
    assert_eq!(result.labels(), vec!["Down -10%", "Base 0%", "Up +10%"]);
    assert_eq!(controller.client().calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn result_is_cleared_as_soon_as_a_run_starts() {
    let controller = Arc::new(RunController::new(GatedClient::new()));
    controller.client().gate.add_permits(3);
    controller
        .start(spot_shock(ShockMagnitude::Ten))
        .await
        .unwrap();
    assert!(controller.result().is_some());

    let background = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.start(spot_shock(ShockMagnitude::Twenty)).await })
    };
    controller.client().entered.notified().await;
    // notify_one may hold a stored permit from the first run; wait for the new one.
    while controller.client().calls.load(Ordering::SeqCst) < 4 {
        controller.client().entered.notified().await;
    }

    assert_eq!(controller.state(), RunState::Running);
    assert!(controller.result().is_none());

    controller.client().gate.add_permits(3);
    background.await.unwrap().unwrap();
    assert_eq!(controller.state(), RunState::Succeeded);
}

#[tokio::test]
async fn concurrent_dispatch_keeps_scenario_order() {
    let client = ScriptedClient::default()
        .delayed("Down -20%", Duration::from_millis(60))
        .delayed("Base 0%", Duration::from_millis(30));
    let controller = RunController::with_dispatch(client, Dispatch::Concurrent);

    let result = controller
        .start(spot_shock(ShockMagnitude::Twenty))
        .await
        .unwrap();
    assert_eq!(result.labels(), vec!["Down -20%", "Base 0%", "Up +20%"]);
    assert_eq!(controller.client_calls().len(), 3);
}

#[tokio::test]
async fn concurrent_dispatch_reports_earliest_failing_scenario() {
    let client = ScriptedClient::default()
        .delayed("Down -10%", Duration::from_millis(50))
        .failing("Down -10%", SimulationError::Status { code: 500 })
        .failing("Up +10%", SimulationError::Status { code: 503 });
    let controller = RunController::with_dispatch(client, Dispatch::Concurrent);

    let err = controller
        .start(spot_shock(ShockMagnitude::Ten))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RunError::Scenario {
            label: "Down -10%".to_string(),
            source: SimulationError::Status { code: 500 },
        }
    );
    assert!(controller.result().is_none());
}

#[tokio::test]
async fn concurrent_dispatch_fails_fast_on_earliest_failure() {
    let client = ScriptedClient::default()
        .failing("Down -10%", SimulationError::Status { code: 500 })
        .delayed("Up +10%", Duration::from_secs(60));
    let controller = RunController::with_dispatch(client, Dispatch::Concurrent);

    let started = Instant::now();
    let err = tokio::time::timeout(
        Duration::from_secs(5),
        controller.start(spot_shock(ShockMagnitude::Ten)),
    )
    .await
    .expect("run must not wait for the slow Up leg")
    .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(matches!(err, RunError::Scenario { ref label, .. } if label == "Down -10%"));
    assert_eq!(controller.state(), RunState::Failed);
    assert_eq!(controller.client_calls().len(), 3);
}

#[tokio::test]
async fn dropped_start_does_not_leave_controller_running() {
    let controller = RunController::new(GatedClient::new());

    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        controller.start(spot_shock(ShockMagnitude::Ten)),
    )
    .await;
    assert!(abandoned.is_err());
    assert_eq!(controller.state(), RunState::Failed);
    assert_eq!(controller.last_error(), Some(RunError::Cancelled));
    assert!(controller.result().is_none());

    controller.client().gate.add_permits(3);
    let result = controller
        .start(spot_shock(ShockMagnitude::Twenty))
        .await
        .unwrap();
    assert_eq!(controller.state(), RunState::Succeeded);
    assert_eq!(result.labels(), vec!["Down -20%", "Base 0%", "Up +20%"]);
    assert!(controller.last_error().is_none());
}

#[tokio::test]
async fn vol_shock_on_ou_moves_only_sigma() {
    let client = ScriptedClient::default();
    let controller = RunController::new(client);
    let snapshot = RunSnapshot::new(
        ModelParameters::ou_default(),
        ShockSpec::new(ShockTarget::Vol, ShockMagnitude::Ten),
        RunConfig::default(),
    );

    let requests = snapshot.requests().unwrap();
    let sigmas: Vec<&str> = requests.iter().map(|r| r.param("sigma_ou").unwrap()).collect();
    assert_eq!(sigmas, vec!["0.1080", "0.1200", "0.1320"]);
    assert!(requests.iter().all(|r| r.param("spot") == Some("1.1000")));
    assert!(requests.iter().all(|r| r.param("kappa") == Some("3")));

    controller.start(snapshot).await.unwrap();
    assert_eq!(controller.state(), RunState::Succeeded);
}

trait ClientCalls {
    fn client_calls(&self) -> Vec<String>;
}

impl ClientCalls for RunController<ScriptedClient> {
    fn client_calls(&self) -> Vec<String> {
        self.client().calls()
    }
}
