//! Parsers for model replies. Absent or malformed numbers read as 0 and a
//! malformed issue list reads as empty; nothing here fails.

use super::{RemoteInsight, ReplyFormat};
use crate::models::{Issue, Severity};
use regex::Regex;
use serde_json::Value as Json;
use std::sync::OnceLock;
use tracing::debug;

pub fn parse_reply(text: &str, format: ReplyFormat) -> RemoteInsight {
    match format {
        ReplyFormat::Json => parse_json_reply(text),
        ReplyFormat::Labeled => parse_labeled_reply(text),
    }
}

/// Parse a JSON-object reply. Prose or code fences around the outermost
/// `{ ... }` are ignored.
pub fn parse_json_reply(text: &str) -> RemoteInsight {
    let body = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => {
            debug!("reply contains no JSON object");
            return RemoteInsight::default();
        }
    };
    let value: Json = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "reply is not valid JSON");
            return RemoteInsight::default();
        }
    };
    let issues = value
        .get("issues")
        .or_else(|| value.get("additionalIssues"))
        .cloned()
        .map(|v| match serde_json::from_value::<Vec<Issue>>(v) {
            Ok(list) => list,
            Err(e) => {
                debug!(error = %e, "reply issue list is malformed");
                Vec::new()
            }
        })
        .unwrap_or_default();
    RemoteInsight {
        load_time_impact: number_field(&value, "loadTimeImpact"),
        database_efficiency: number_field(&value, "databaseEfficiency"),
        network_optimization: number_field(&value, "networkOptimization"),
        potential_improvement: number_field(&value, "potentialImprovement"),
        additional_issues: issues,
    }
}

fn number_field(value: &Json, key: &str) -> f64 {
    match value.get(key) {
        Some(Json::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Json::String(s)) => parse_number(s),
        _ => 0.0,
    }
}

fn parse_number(raw: &str) -> f64 {
    raw.trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

fn label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?im)^\s*(load\s+time\s+impact|database\s+efficiency|network\s+optimization|potential\s+improvement)\s*:\s*([-+]?\d+(?:\.\d+)?)",
        )
        .expect("label pattern compiles")
    })
}

fn item_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*\d+[.)]\s+(?:\[(\w+)\]\s*)?(.+?)\s*$")
            .expect("item pattern compiles")
    })
}

/// Parse the `Label: value` + numbered-list reply format.
pub fn parse_labeled_reply(text: &str) -> RemoteInsight {
    let mut insight = RemoteInsight::default();
    for caps in label_regex().captures_iter(text) {
        let label = caps[1].split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_lowercase();
        let value = parse_number(&caps[2]);
        match label.as_str() {
            "load time impact" => insight.load_time_impact = value,
            "database efficiency" => insight.database_efficiency = value,
            "network optimization" => insight.network_optimization = value,
            "potential improvement" => insight.potential_improvement = value,
            _ => {}
        }
    }
    insight.additional_issues = labeled_issues(text);
    insight
}

fn labeled_issues(text: &str) -> Vec<Issue> {
    let mut lines = text.lines();
    if !lines
        .by_ref()
        .any(|l| l.trim().trim_end_matches(':').eq_ignore_ascii_case("issues"))
    {
        return Vec::new();
    }
    let mut issues = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let Some(caps) = item_regex().captures(line) else {
            break;
        };
        let severity = caps
            .get(1)
            .map(|m| Severity::from_label(m.as_str()))
            .unwrap_or(Severity::Info);
        let rest = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        let (title, description) = match rest.split_once(" - ") {
            Some((t, d)) => (t.trim(), d.trim()),
            None => (rest.trim(), ""),
        };
        issues.push(Issue {
            severity,
            title: title.to_string(),
            description: description.to_string(),
            ..Issue::default()
        });
    }
    issues
}
