//! Synthesized impact metrics.
//!
//! Every figure is a fixed linear function of the number of critical issues.
//! Warnings and infos never move the numbers.

use crate::models::{Issue, Metrics, Severity};
use serde::Deserialize;

const BASE_LOAD_TIME: f64 = 2.8;
const LOAD_TIME_PER_CRITICAL: f64 = 0.5;
const DATABASE_LOAD_PER_CRITICAL: f64 = 1.5;
const REQUESTS_PER_CRITICAL: f64 = 15.0;
const IMPROVEMENT_PER_CRITICAL: f64 = 20.0;
const MAX_SYNTHESIZED_IMPROVEMENT: f64 = 80.0;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// How the load-time estimate reacts to critical issues.
pub enum LoadTimeModel {
    /// `2.8 + 0.5 * critical`
    #[default]
    PerIssue,
    /// Constant `2.8`.
    Flat,
}

pub fn critical_count(issues: &[Issue]) -> usize {
    issues
        .iter()
        .filter(|i| i.severity == Severity::Critical)
        .count()
}

pub fn synthesize(issues: &[Issue], model: LoadTimeModel) -> Metrics {
    let k = critical_count(issues) as f64;
    let load_time = match model {
        LoadTimeModel::PerIssue => BASE_LOAD_TIME + LOAD_TIME_PER_CRITICAL * k,
        LoadTimeModel::Flat => BASE_LOAD_TIME,
    };
    Metrics {
        load_time,
        database_load: DATABASE_LOAD_PER_CRITICAL * k,
        network_requests: REQUESTS_PER_CRITICAL * k,
        potential_improvement: (IMPROVEMENT_PER_CRITICAL * k).min(MAX_SYNTHESIZED_IMPROVEMENT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with(severities: &[Severity]) -> Vec<Issue> {
        severities
            .iter()
            .map(|s| Issue {
                severity: *s,
                ..Issue::default()
            })
            .collect()
    }

    #[test]
    fn test_linear_in_critical_count() {
        for k in 0..8usize {
            let issues = with(&vec![Severity::Critical; k]);
            let m = synthesize(&issues, LoadTimeModel::PerIssue);
            let kf = k as f64;
            assert_eq!(m.database_load, 1.5 * kf);
            assert_eq!(m.network_requests, 15.0 * kf);
            assert_eq!(m.potential_improvement, (20.0 * kf).min(80.0));
            assert!((m.load_time - (2.8 + 0.5 * kf)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_other_severities_ignored() {
        let issues = with(&[Severity::Warning, Severity::Info, Severity::Warning]);
        let m = synthesize(&issues, LoadTimeModel::PerIssue);
        assert_eq!(m.database_load, 0.0);
        assert_eq!(m.network_requests, 0.0);
        assert_eq!(m.potential_improvement, 0.0);
        assert_eq!(m.load_time, 2.8);
    }

    #[test]
    fn test_improvement_clamped_at_80() {
        let issues = with(&[Severity::Critical; 5]);
        assert_eq!(synthesize(&issues, LoadTimeModel::Flat).potential_improvement, 80.0);
    }

    #[test]
    fn test_flat_model_keeps_base_load_time() {
        let issues = with(&[Severity::Critical; 3]);
        assert_eq!(synthesize(&issues, LoadTimeModel::Flat).load_time, 2.8);
    }
}
