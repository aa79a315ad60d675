use crate::core::stats::{RawScenarioResult, SensitivityResult, TaggedStatsPoint};

/// Tag and concatenate per-scenario results.
///
/// Scenarios are appended in the order given and each keeps its own point
/// order. Nothing is sorted, merged, deduplicated or validated.
///
/// # Examples
///
/// ```
/// use fx_sensitivity::core::stats::{RawScenarioResult, StatsPoint};
/// use fx_sensitivity::orchestration::aggregator::aggregate;
///
/// let raw = RawScenarioResult::new(vec![StatsPoint::new(0.0, 1.1, 1.1, 1.1)], vec![]);
/// let result = aggregate(&[("Base 0%".to_string(), raw)]);
/// assert_eq!(result.underlying[0].scenario, "Base 0%");
/// assert!(aggregate(&[]).is_empty());
/// ```
pub fn aggregate(results: &[(String, RawScenarioResult)]) -> SensitivityResult {
    let mut out = SensitivityResult::default();
    for (label, raw) in results {
        out.underlying.extend(
            raw.underlying_stats
                .iter()
                .map(|p| TaggedStatsPoint::new(label.as_str(), p)),
        );
        out.present_value.extend(
            raw.pv_stats
                .iter()
                .map(|p| TaggedStatsPoint::new(label.as_str(), p)),
        );
    }
    out
}
