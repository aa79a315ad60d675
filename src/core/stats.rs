use serde::{Deserialize, Serialize};
use std::fmt;

/// Time-indexed summary of simulated outcomes at one grid point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsPoint {
    pub time: f64,
    pub mean: f64,
    pub p5: f64,
    pub p95: f64,
}

impl StatsPoint {
    pub fn new(time: f64, mean: f64, p5: f64, p95: f64) -> Self {
        Self {
            time,
            mean,
            p5,
            p95,
        }
    }

    /// Whether `p5 <= mean <= p95` holds for this point.
    pub fn is_ordered(&self) -> bool {
        self.p5 <= self.mean && self.mean <= self.p95
    }
}

/// A [`StatsPoint`] tagged with the scenario it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedStatsPoint {
    pub scenario: String,
    pub time: f64,
    pub mean: f64,
    pub p5: f64,
    pub p95: f64,
}

impl TaggedStatsPoint {
    pub fn new(scenario: impl Into<String>, point: &StatsPoint) -> Self {
        Self {
            scenario: scenario.into(),
            time: point.time,
            mean: point.mean,
            p5: point.p5,
            p95: point.p95,
        }
    }

    pub fn point(&self) -> StatsPoint {
        StatsPoint::new(self.time, self.mean, self.p5, self.p95)
    }
}

/// Body returned by the simulation service for one scenario.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawScenarioResult {
    pub underlying_stats: Vec<StatsPoint>,
    pub pv_stats: Vec<StatsPoint>,
}

impl RawScenarioResult {
    pub fn new(underlying_stats: Vec<StatsPoint>, pv_stats: Vec<StatsPoint>) -> Self {
        Self {
            underlying_stats,
            pv_stats,
        }
    }

    /// First point violating `p5 <= mean <= p95`, if any.
    pub fn first_unordered(&self) -> Option<(&'static str, &StatsPoint)> {
        self.underlying_stats
            .iter()
            .find(|p| !p.is_ordered())
            .map(|p| ("underlyingStats", p))
            .or_else(|| {
                self.pv_stats
                    .iter()
                    .find(|p| !p.is_ordered())
                    .map(|p| ("pvStats", p))
            })
    }
}

/// Combined, scenario-tagged series of one sensitivity run.
///
/// Points are grouped by scenario in the order the scenarios were supplied
/// (Down, Base, Up); within a scenario they keep the service's time order.
/// A new run replaces the whole value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityResult {
    pub underlying: Vec<TaggedStatsPoint>,
    pub present_value: Vec<TaggedStatsPoint>,
}

impl SensitivityResult {
    pub fn is_empty(&self) -> bool {
        self.underlying.is_empty() && self.present_value.is_empty()
    }

    /// Distinct scenario labels in first-appearance order.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for p in self.underlying.iter().chain(self.present_value.iter()) {
            if !labels.contains(&p.scenario.as_str()) {
                labels.push(&p.scenario);
            }
        }
        labels
    }

    pub fn underlying_for<'a>(
        &'a self,
        label: &'a str,
    ) -> impl Iterator<Item = &'a TaggedStatsPoint> {
        self.underlying.iter().filter(move |p| p.scenario == label)
    }

    pub fn present_value_for<'a>(
        &'a self,
        label: &'a str,
    ) -> impl Iterator<Item = &'a TaggedStatsPoint> {
        self.present_value.iter().filter(move |p| p.scenario == label)
    }

    /// Terminal-point comparison across scenarios.
    pub fn summaries(&self) -> Vec<ScenarioSummary> {
        self.labels()
            .into_iter()
            .map(|label| ScenarioSummary {
                scenario: label.to_string(),
                terminal_underlying: self.underlying_for(label).last().map(|p| p.point()),
                terminal_pv: self.present_value_for(label).last().map(|p| p.point()),
            })
            .collect()
    }
}

/// Last-time-step statistics of one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSummary {
    pub scenario: String,
    pub terminal_underlying: Option<StatsPoint>,
    pub terminal_pv: Option<StatsPoint>,
}

impl fmt::Display for ScenarioSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<12}", self.scenario)?;
        match &self.terminal_underlying {
            Some(p) => write!(
                f,
                "  spot T={:.4}  mean={:.4} [{:.4}, {:.4}]",
                p.time, p.mean, p.p5, p.p95
            )?,
            None => write!(f, "  spot  (no points)")?,
        }
        match &self.terminal_pv {
            Some(p) => write!(f, "  pv mean={:.4} [{:.4}, {:.4}]", p.mean, p.p5, p.p95),
            None => write!(f, "  pv  (no points)"),
        }
    }
}

impl fmt::Display for SensitivityResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Sensitivity Result ===")?;
        writeln!(f, "Underlying points:    {}", self.underlying.len())?;
        writeln!(f, "Present value points: {}", self.present_value.len())?;
        writeln!(f, "\nTerminal statistics:")?;
        for summary in self.summaries() {
            writeln!(f, "  {}", summary)?;
        }
        Ok(())
    }
}
