//! Remote insight: an LLM second opinion merged into local findings.
//!
//! The provider boundary is infallible. Transport errors, bad status codes and
//! unparseable replies all collapse to `RemoteInsight::default()`, which the
//! merge treats as "no opinion" so local numbers stand.

mod client;
mod prompt;
mod reply;

pub use client::{ChatInsightProvider, ChatSettings};
pub use prompt::build_prompt;
pub use reply::{parse_json_reply, parse_labeled_reply, parse_reply};

use crate::metrics::{synthesize, LoadTimeModel};
use crate::models::{AnalysisResult, Issue, Metrics};
use crate::recommend;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
/// Reply shape requested from the model.
pub enum ReplyFormat {
    /// A single strict JSON object.
    #[default]
    Json,
    /// `Label: value` lines plus a numbered issue list.
    Labeled,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteInsight {
    pub load_time_impact: f64,
    pub database_efficiency: f64,
    pub network_optimization: f64,
    pub potential_improvement: f64,
    pub additional_issues: Vec<Issue>,
}

impl RemoteInsight {
    pub fn is_empty(&self) -> bool {
        *self == RemoteInsight::default()
    }
}

/// Something that can comment on a piece of source code.
pub trait InsightProvider: Send + Sync {
    fn insights(&self, source: &str) -> RemoteInsight;
}

/// Remote value when it is a usable non-zero number, else the local one.
fn prefer_remote(remote: f64, local: f64) -> f64 {
    if remote != 0.0 && remote.is_finite() {
        remote
    } else {
        local
    }
}

pub fn merge_metrics(remote: &RemoteInsight, local: &Metrics) -> Metrics {
    Metrics {
        load_time: prefer_remote(remote.load_time_impact, local.load_time),
        database_load: prefer_remote(remote.database_efficiency, local.database_load),
        network_requests: prefer_remote(remote.network_optimization, local.network_requests),
        potential_improvement: prefer_remote(
            remote.potential_improvement,
            local.potential_improvement,
        ),
    }
}

/// Combine local issues with a remote insight.
///
/// Issues are concatenated local-first without de-duplication. Metrics are
/// synthesized from the local issues only, then overridden field by field by
/// non-zero remote values. Recommendations cover every merged issue.
pub fn merge(local_issues: Vec<Issue>, remote: RemoteInsight, model: LoadTimeModel) -> AnalysisResult {
    let local_metrics = synthesize(&local_issues, model);
    let metrics = merge_metrics(&remote, &local_metrics);
    let mut issues = local_issues;
    issues.extend(remote.additional_issues);
    let recommendations = recommend::generate(&issues, &metrics);
    AnalysisResult {
        issues,
        metrics,
        recommendations,
    }
}
