//! Run controller: drives one three-scenario sensitivity batch.
//!
//! ```text
//!   Idle ──start──▶ Running ──all ok──▶ Succeeded
//!                     │                    │
//!                     └──any error──▶ Failed
//!   Succeeded / Failed ──start──▶ Running
//!   Running ──start──▶ rejected (state untouched)
//! ```

use crate::client::error::SimulationError;
use crate::client::http::SimulationClient;
use crate::core::params::{ModelParameters, ParamError, RunConfig};
use crate::core::shock::ShockSpec;
use crate::core::stats::{RawScenarioResult, SensitivityResult};
use crate::orchestration::aggregator::aggregate;
use crate::scenario::planner::plan;
use crate::scenario::request::{RequestBuilder, SimulationRequest};
use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Lifecycle of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Idle,
    Running,
    Succeeded,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Succeeded => "succeeded",
            RunState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// How the three scenario calls are issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dispatch {
    /// One at a time, Down then Base then Up.
    #[default]
    Sequential,
    /// All three in flight at once. Output order is still Down, Base, Up.
    Concurrent,
}

/// Errors surfaced by [`RunController::start`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunError {
    #[error("scenario '{label}' failed: {source}")]
    Scenario {
        label: String,
        #[source]
        source: SimulationError,
    },
    #[error("a sensitivity run is already in progress")]
    ConcurrentRunRejected,
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ParamError),
    /// The caller dropped the run before it finished.
    #[error("sensitivity run was cancelled before completion")]
    Cancelled,
}

/// Inputs captured when a run is triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub params: ModelParameters,
    pub shock: ShockSpec,
    pub run: RunConfig,
}

impl RunSnapshot {
    pub fn new(params: ModelParameters, shock: ShockSpec, run: RunConfig) -> Self {
        Self { params, shock, run }
    }

    /// The three requests this snapshot expands to, in Down, Base, Up order.
    pub fn requests(&self) -> Result<Vec<SimulationRequest>, ParamError> {
        plan(self.shock.magnitude)
            .iter()
            .map(|scenario| RequestBuilder::build(scenario, &self.params, &self.shock, &self.run))
            .collect()
    }
}

/// A published, successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub snapshot: RunSnapshot,
    pub result: SensitivityResult,
}

#[derive(Debug)]
struct Published {
    state: RunState,
    run_id: Option<Uuid>,
    outcome: Option<RunOutcome>,
    last_error: Option<RunError>,
}

/// Marks an in-flight run `Failed` if its `start` future is dropped before
/// publishing.
struct RunGuard<'a> {
    published: &'a Mutex<Published>,
    run_id: Uuid,
    armed: bool,
}

impl RunGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut published = self.published.lock();
        if published.state == RunState::Running && published.run_id == Some(self.run_id) {
            warn!("run {} cancelled before completion", self.run_id);
            published.state = RunState::Failed;
            published.last_error = Some(RunError::Cancelled);
        }
    }
}

/// Sole owner of run state and the published result.
///
/// At most one run is in flight per controller. The published result is
/// cleared when a run starts and replaced only when all three scenarios
/// have succeeded.
pub struct RunController<C: SimulationClient> {
    client: C,
    dispatch: Dispatch,
    published: Mutex<Published>,
}

impl<C: SimulationClient> RunController<C> {
    pub fn new(client: C) -> Self {
        Self::with_dispatch(client, Dispatch::Sequential)
    }

    pub fn with_dispatch(client: C, dispatch: Dispatch) -> Self {
        Self {
            client,
            dispatch,
            published: Mutex::new(Published {
                state: RunState::Idle,
                run_id: None,
                outcome: None,
                last_error: None,
            }),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn dispatch(&self) -> Dispatch {
        self.dispatch
    }

    pub fn state(&self) -> RunState {
        self.published.lock().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == RunState::Running
    }

    /// Id of the current or most recent run.
    pub fn run_id(&self) -> Option<Uuid> {
        self.published.lock().run_id
    }

    pub fn result(&self) -> Option<SensitivityResult> {
        self.published.lock().outcome.as_ref().map(|o| o.result.clone())
    }

    pub fn outcome(&self) -> Option<RunOutcome> {
        self.published.lock().outcome.clone()
    }

    pub fn last_error(&self) -> Option<RunError> {
        self.published.lock().last_error.clone()
    }

    /// Human-readable message for the last failure, naming the scenario.
    pub fn last_error_message(&self) -> Option<String> {
        self.last_error().map(|e| e.to_string())
    }

    /// Run a full sensitivity batch for `snapshot`.
    ///
    /// Rejected with [`RunError::ConcurrentRunRejected`] while another run
    /// is in flight, and with [`RunError::InvalidInput`] before any state
    /// change when the snapshot cannot be simulated. Dropping the returned
    /// future mid-run leaves the controller `Failed` with
    /// [`RunError::Cancelled`].
    pub async fn start(&self, snapshot: RunSnapshot) -> Result<SensitivityResult, RunError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let requests = {
            let mut published = self.published.lock();
            if published.state == RunState::Running {
                warn!("start rejected: run {:?} still in progress", published.run_id);
                return Err(RunError::ConcurrentRunRejected);
            }
            snapshot.params.validate()?;
            snapshot.run.validate()?;
            let requests = snapshot.requests()?;

            published.state = RunState::Running;
            published.run_id = Some(run_id);
            published.outcome = None;
            published.last_error = None;
            requests
        };
        let mut guard = RunGuard {
            published: &self.published,
            run_id,
            armed: true,
        };
        info!(
            "run {} started: {} shock {} ({:?} dispatch)",
            run_id, snapshot.params, snapshot.shock, self.dispatch
        );

        let collected = self.execute(run_id, &requests).await;

        let mut published = self.published.lock();
        guard.disarm();
        match collected {
            Ok(collected) => {
                let result = aggregate(&collected);
                info!(
                    "run {} succeeded: {} underlying / {} pv points",
                    run_id,
                    result.underlying.len(),
                    result.present_value.len()
                );
                published.state = RunState::Succeeded;
                published.outcome = Some(RunOutcome {
                    run_id,
                    started_at,
                    finished_at: Utc::now(),
                    snapshot,
                    result: result.clone(),
                });
                Ok(result)
            }
            Err(err) => {
                warn!("run {} failed: {}", run_id, err);
                published.state = RunState::Failed;
                published.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        run_id: Uuid,
        requests: &[SimulationRequest],
    ) -> Result<Vec<(String, RawScenarioResult)>, RunError> {
        match self.dispatch {
            Dispatch::Sequential => {
                let mut collected = Vec::with_capacity(requests.len());
                for request in requests {
                    let raw = self.call_one(run_id, request).await?;
                    collected.push((request.label.clone(), raw));
                }
                Ok(collected)
            }
            Dispatch::Concurrent => {
                let mut in_flight: FuturesUnordered<_> = requests
                    .iter()
                    .enumerate()
                    .map(|(index, request)| async move {
                        (index, self.call_one(run_id, request).await)
                    })
                    .collect();
                let mut settled: Vec<Option<Result<RawScenarioResult, RunError>>> =
                    requests.iter().map(|_| None).collect();

                while let Some((index, response)) = in_flight.next().await {
                    settled[index] = Some(response);
                    // The earliest failing scenario wins once everything before it
                    // has settled; later legs are dropped unfinished.
                    for slot in &settled {
                        match slot {
                            None => break,
                            Some(Err(err)) => return Err(err.clone()),
                            Some(Ok(_)) => {}
                        }
                    }
                }

                requests
                    .iter()
                    .zip(settled.into_iter().flatten())
                    .map(|(request, response)| response.map(|raw| (request.label.clone(), raw)))
                    .collect()
            }
        }
    }

    async fn call_one(
        &self,
        run_id: Uuid,
        request: &SimulationRequest,
    ) -> Result<RawScenarioResult, RunError> {
        debug!("run {} dispatching '{}': {}", run_id, request.label, request.query_string());
        match self.client.call(request).await {
            Ok(raw) => {
                debug!(
                    "run {} '{}' returned {} underlying / {} pv points",
                    run_id,
                    request.label,
                    raw.underlying_stats.len(),
                    raw.pv_stats.len()
                );
                Ok(raw)
            }
            Err(source) => Err(RunError::Scenario {
                label: request.label.clone(),
                source,
            }),
        }
    }
}
