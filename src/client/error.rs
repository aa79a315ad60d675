use thiserror::Error;

/// Failure of a single call to the simulation service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimulationError {
    /// Connection refused, reset, DNS failure, or request timeout.
    #[error("transport error: {0}")]
    Transport(String),
    /// The service answered with a non-success status.
    #[error("simulation service returned status {code}")]
    Status { code: u16 },
    /// The body did not have the expected shape.
    #[error("malformed simulation response: {0}")]
    Parse(String),
}

impl SimulationError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

impl From<reqwest::Error> for SimulationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SimulationError::Transport(format!("request timed out: {}", err))
        } else if err.is_decode() {
            SimulationError::Parse(err.to_string())
        } else {
            SimulationError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SimulationError {
    fn from(err: serde_json::Error) -> Self {
        SimulationError::Parse(err.to_string())
    }
}
