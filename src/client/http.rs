//! Client for the external path-simulation service.

use crate::client::error::SimulationError;
use crate::config::OrchestratorConfig;
use crate::core::stats::RawScenarioResult;
use crate::scenario::request::SimulationRequest;
use async_trait::async_trait;
use log::debug;
use std::time::Duration;

/// Issues one simulation request and returns the parsed statistics.
///
/// Every call is independent: implementations must not cache or retry.
#[async_trait]
pub trait SimulationClient: Send + Sync {
    async fn call(&self, request: &SimulationRequest) -> Result<RawScenarioResult, SimulationError>;
}

/// [`SimulationClient`] over HTTP GET.
pub struct HttpSimulationClient {
    base_url: String,
    client: reqwest::Client,
    validate_bands: bool,
}

impl HttpSimulationClient {
    /// Create a client with a bounded per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SimulationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    /// Wrap a preconfigured `reqwest` client. Its timeout is used as is.
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
            validate_bands: false,
        }
    }

    pub fn from_config(config: &OrchestratorConfig) -> Result<Self, SimulationError> {
        Ok(Self::new(config.base_url.clone(), config.timeout())?
            .with_band_validation(config.validate_bands))
    }

    /// Reject responses whose points break `p5 <= mean <= p95`.
    pub fn with_band_validation(mut self, enabled: bool) -> Self {
        self.validate_bands = enabled;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl SimulationClient for HttpSimulationClient {
    async fn call(&self, request: &SimulationRequest) -> Result<RawScenarioResult, SimulationError> {
        let url = request.url(&self.base_url);
        debug!("GET {} [{}]", url, request.label);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SimulationError::Status {
                code: status.as_u16(),
            });
        }

        let body = response.text().await?;
        parse_response(&body, self.validate_bands)
    }
}

/// Parse a service body into a [`RawScenarioResult`].
pub fn parse_response(body: &str, validate_bands: bool) -> Result<RawScenarioResult, SimulationError> {
    let raw: RawScenarioResult = serde_json::from_str(body)?;
    if validate_bands {
        if let Some((series, point)) = raw.first_unordered() {
            return Err(SimulationError::parse(format!(
                "{} at t={} violates p5 <= mean <= p95 ({} / {} / {})",
                series, point.time, point.p5, point.mean, point.p95
            )));
        }
    }
    Ok(raw)
}
