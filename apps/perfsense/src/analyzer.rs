//! Single-source analysis: parse, match, optionally augment, then derive
//! metrics and recommendations.
//!
//! `analyze_source` never fails. A parse failure becomes one synthetic
//! warning issue with zero metrics; a remote failure is already folded into
//! an empty insight by the provider.

use crate::augment::{self, merge_metrics, InsightProvider, RemoteInsight};
use crate::error::AnalysisError;
use crate::matcher::find_issues;
use crate::metrics::{synthesize, LoadTimeModel};
use crate::models::{AnalysisResult, Issue, Metrics, Severity};
use crate::recommend;
use crate::syntax::{parse, SourceLanguage};
use tracing::{debug, warn};

pub const ANALYSIS_ERROR: &str = "ANALYSIS_ERROR";

#[derive(Clone, Copy)]
pub struct AnalyzeOptions<'a> {
    pub language: SourceLanguage,
    pub file: Option<&'a str>,
    pub load_time: LoadTimeModel,
    pub insight: Option<&'a dyn InsightProvider>,
}

impl Default for AnalyzeOptions<'_> {
    fn default() -> Self {
        Self {
            language: SourceLanguage::Tsx,
            file: None,
            load_time: LoadTimeModel::default(),
            insight: None,
        }
    }
}

/// Outcome of the local (parse + match) half of an analysis.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalOutcome {
    Matched(Vec<Issue>),
    /// Parsing failed; carries the synthetic issue describing why.
    Failed(Issue),
}

/// Parse and match only. Used directly by the pull-request commenter.
pub fn find_source_issues(
    source: &str,
    language: SourceLanguage,
    file: Option<&str>,
) -> Result<Vec<Issue>, AnalysisError> {
    let tree = parse(source, language)?;
    let issues = find_issues(&tree, file);
    debug!(file = file.unwrap_or("<input>"), issues = issues.len(), "pattern match complete");
    Ok(issues)
}

pub fn run_local(source: &str, language: SourceLanguage, file: Option<&str>) -> LocalOutcome {
    match find_source_issues(source, language, file) {
        Ok(issues) => LocalOutcome::Matched(issues),
        Err(e) => {
            warn!(file = file.unwrap_or("<input>"), error = %e, "analysis failed");
            LocalOutcome::Failed(error_issue(&e.to_string(), file))
        }
    }
}

/// Synthetic issue standing in for a failed analysis.
pub fn error_issue(reason: &str, file: Option<&str>) -> Issue {
    Issue {
        severity: Severity::Warning,
        code: ANALYSIS_ERROR.into(),
        title: "Analysis Error".into(),
        description: if reason.is_empty() {
            "Failed to analyze code".into()
        } else {
            reason.to_string()
        },
        line: Some(0),
        column: None,
        file: file.map(str::to_string),
        suggestion: None,
        impact: None,
    }
}

/// Turn a local outcome (and an optional remote insight) into a result.
pub fn finish(
    local: LocalOutcome,
    remote: Option<RemoteInsight>,
    model: LoadTimeModel,
) -> AnalysisResult {
    match (local, remote) {
        (LocalOutcome::Matched(issues), None) => {
            let metrics = synthesize(&issues, model);
            let recommendations = recommend::generate(&issues, &metrics);
            AnalysisResult {
                issues,
                metrics,
                recommendations,
            }
        }
        (LocalOutcome::Matched(issues), Some(remote)) => augment::merge(issues, remote, model),
        (LocalOutcome::Failed(issue), None) => AnalysisResult {
            issues: vec![issue],
            metrics: Metrics::zero(),
            recommendations: Vec::new(),
        },
        (LocalOutcome::Failed(issue), Some(remote)) => {
            let metrics = merge_metrics(&remote, &Metrics::zero());
            let recommendations = recommend::generate(&remote.additional_issues, &metrics);
            let mut issues = vec![issue];
            issues.extend(remote.additional_issues);
            AnalysisResult {
                issues,
                metrics,
                recommendations,
            }
        }
    }
}

pub fn analyze_source(source: &str, opts: &AnalyzeOptions<'_>) -> AnalysisResult {
    let local = run_local(source, opts.language, opts.file);
    let remote = opts.insight.map(|provider| provider.insights(source));
    finish(local, remote, opts.load_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{N_PLUS_ONE_TITLE, PROMISE_ALL_MAP};

    struct FixedInsight(RemoteInsight);

    impl InsightProvider for FixedInsight {
        fn insights(&self, _source: &str) -> RemoteInsight {
            self.0.clone()
        }
    }

    const SCENARIO: &str =
        "async function f(){ await Promise.all(ids.map(async id => fetch('/x/'+id))) }";

    #[test]
    fn test_scenario_two_issues() {
        let res = analyze_source(SCENARIO, &AnalyzeOptions::default());
        assert_eq!(res.issues.len(), 2);
        assert_eq!(res.issues[0].code, PROMISE_ALL_MAP);
        assert_eq!(res.issues[1].title, N_PLUS_ONE_TITLE);
        assert_eq!(res.metrics.network_requests, 15.0);
        assert_eq!(res.metrics.potential_improvement, 20.0);
        assert!(res
            .recommendations
            .iter()
            .any(|r| r.title == "Implement Request Batching"));
    }

    #[test]
    fn test_idempotent_without_insight() {
        let opts = AnalyzeOptions::default();
        assert_eq!(analyze_source(SCENARIO, &opts), analyze_source(SCENARIO, &opts));
    }

    #[test]
    fn test_no_pattern_is_clean() {
        let res = analyze_source("const a = [1, 2].filter(x => x > 1);", &AnalyzeOptions::default());
        assert!(res.issues.is_empty());
        assert_eq!(res.metrics.database_load, 0.0);
        assert_eq!(res.metrics.network_requests, 0.0);
        assert_eq!(res.metrics.potential_improvement, 0.0);
        assert!(res.recommendations.is_empty());
    }

    #[test]
    fn test_unparseable_input_degrades() {
        let res = analyze_source("function ((( {", &AnalyzeOptions::default());
        assert_eq!(res.issues.len(), 1);
        assert_eq!(res.issues[0].severity, Severity::Warning);
        assert_eq!(res.issues[0].code, ANALYSIS_ERROR);
        assert_eq!(res.metrics, Metrics::zero());
        assert!(res.recommendations.is_empty());
    }

    #[test]
    fn test_deeply_nested_input_degrades() {
        let src = format!("const a = {}{};", "[".repeat(20_000), "]".repeat(20_000));
        let res = analyze_source(&src, &AnalyzeOptions::default());
        assert_eq!(res.issues.len(), 1);
        assert_eq!(res.issues[0].code, ANALYSIS_ERROR);
        assert!(res.issues[0].description.contains("nesting deeper than"));
        assert_eq!(res.metrics, Metrics::zero());
    }

    #[test]
    fn test_insight_merged_on_success() {
        let provider = FixedInsight(RemoteInsight {
            load_time_impact: 4.0,
            potential_improvement: 90.0,
            additional_issues: vec![Issue {
                severity: Severity::Info,
                title: "Remote".into(),
                ..Issue::default()
            }],
            ..RemoteInsight::default()
        });
        let opts = AnalyzeOptions {
            insight: Some(&provider),
            ..AnalyzeOptions::default()
        };
        let res = analyze_source(SCENARIO, &opts);
        assert_eq!(res.issues.len(), 3);
        assert_eq!(res.issues[2].title, "Remote");
        assert_eq!(res.metrics.load_time, 4.0);
        assert_eq!(res.metrics.potential_improvement, 90.0);
        assert_eq!(res.metrics.network_requests, 15.0);
    }

    #[test]
    fn test_insight_applies_after_parse_failure() {
        let provider = FixedInsight(RemoteInsight {
            network_optimization: 12.0,
            ..RemoteInsight::default()
        });
        let opts = AnalyzeOptions {
            insight: Some(&provider),
            ..AnalyzeOptions::default()
        };
        let res = analyze_source("}}}", &opts);
        assert_eq!(res.issues[0].code, ANALYSIS_ERROR);
        assert_eq!(res.metrics.network_requests, 12.0);
        assert_eq!(res.metrics.load_time, 0.0);
        assert_eq!(res.recommendations.len(), 1);
        assert_eq!(res.recommendations[0].title, "Implement Request Batching");
    }
}
