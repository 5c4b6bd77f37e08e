//! Output rendering for the analyze and pr commands.
//!
//! Supports `human` (default), `json` and `markdown` outputs. The JSON form
//! is the serialized result with a top-level summary.

use crate::github::PrReport;
use crate::models::{AnalysisResult, Issue, Severity};
use crate::scan::{FileReport, ScanResult};
use owo_colors::OwoColorize;
use serde_json::Value as JsonVal;
use std::fmt::Write as _;

fn use_colors(output: &str) -> bool {
    output == "human" && std::env::var_os("NO_COLOR").is_none()
}

fn paint(text: &str, color: bool, style: impl Fn(&str) -> String) -> String {
    if color {
        style(text)
    } else {
        text.to_string()
    }
}

fn stderr_colors() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix() -> String {
    paint("error:", stderr_colors(), |s| s.red().bold().to_string())
}

pub fn note_prefix() -> String {
    paint("note:", stderr_colors(), |s| s.bright_black().bold().to_string())
}

/// Print scan results in the requested format.
pub fn print_scan(res: &ScanResult, output: &str) {
    match output {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&compose_scan_json(res)).unwrap_or_default()
        ),
        "markdown" | "md" => print!("{}", render_markdown(res)),
        _ => print!("{}", render_human(res, use_colors(output))),
    }
}

/// Print the outcome of a pull-request review.
pub fn print_pr(report: &PrReport, output: &str) {
    match output {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&compose_pr_json(report)).unwrap_or_default()
        ),
        _ => print!("{}", render_pr_human(report, use_colors(output))),
    }
}

/// Compose scan JSON object (pure) for testing/snapshot purposes.
pub fn compose_scan_json(res: &ScanResult) -> JsonVal {
    serde_json::to_value(res).unwrap_or(JsonVal::Null)
}

pub fn compose_pr_json(report: &PrReport) -> JsonVal {
    serde_json::to_value(report).unwrap_or(JsonVal::Null)
}

fn location(file: &str, issue: &Issue) -> String {
    match issue.line {
        Some(line) if line > 0 => format!("{file}:{line}"),
        _ => file.to_string(),
    }
}

fn issue_line(file: &str, issue: &Issue, color: bool) -> String {
    let (icon, badge) = match issue.severity {
        Severity::Critical => (
            paint("✖", color, |s| s.red().to_string()),
            paint("⟦critical⟧", color, |s| s.red().bold().to_string()),
        ),
        Severity::Warning => (
            paint("▲", color, |s| s.yellow().to_string()),
            paint("⟦warn⟧", color, |s| s.yellow().bold().to_string()),
        ),
        Severity::Info => (
            paint("◆", color, |s| s.blue().to_string()),
            paint("⟦info⟧", color, |s| s.blue().bold().to_string()),
        ),
    };
    let loc = paint(&location(file, issue), color, |s| s.bold().to_string());
    let mut line = if issue.code.is_empty() {
        format!("{icon} {badge} {loc} — {}", issue.title)
    } else {
        format!("{icon} {badge} {loc} ❲{}❳ — {}", issue.code, issue.title)
    };
    if !issue.description.is_empty() && issue.description != issue.title {
        let _ = write!(line, ": {}", issue.description);
    }
    if let Some(s) = &issue.suggestion {
        let _ = write!(line, "\n    ↳ {s}");
    }
    line
}

fn render_file_human(out: &mut String, report: &FileReport, color: bool) {
    let res: &AnalysisResult = &report.result;
    if res.issues.is_empty() {
        let _ = writeln!(
            out,
            "{} {}",
            paint("✔ no issues:", color, |s| s.green().bold().to_string()),
            report.file
        );
        return;
    }
    for issue in &res.issues {
        let _ = writeln!(out, "{}", issue_line(&report.file, issue, color));
    }
    if res.has_critical() {
        let _ = writeln!(
            out,
            "  {}",
            paint(
                "⚠ Critical performance issues detected: these patterns may significantly slow down your application.",
                color,
                |s| s.red().bold().to_string()
            )
        );
    }
    let m = &res.metrics;
    let _ = writeln!(
        out,
        "  Load time: {:.1}s current, {:.1}s with changes",
        m.load_time,
        m.improved_load_time()
    );
    let _ = writeln!(
        out,
        "  Database Load: {:.1}x higher than necessary | Network Requests: {}+ per page load | Potential Improvement: {}%",
        m.database_load,
        m.network_requests.round(),
        m.potential_improvement.round()
    );
    for rec in &res.recommendations {
        let _ = writeln!(
            out,
            "  💡 {}: {}",
            paint(&rec.title, color, |s| s.cyan().bold().to_string()),
            rec.description
        );
        if !rec.example_code.is_empty() {
            for code in rec.example_code.lines() {
                let _ = writeln!(out, "      {}", paint(code, color, |s| s.bright_black().to_string()));
            }
        }
    }
}

/// Human rendering of a whole scan.
pub fn render_human(res: &ScanResult, color: bool) -> String {
    let mut out = String::new();
    for report in &res.files {
        render_file_human(&mut out, report, color);
    }
    let summary = format!(
        "— Summary — critical={} warnings={} infos={} files={}",
        res.summary.critical, res.summary.warnings, res.summary.infos, res.summary.files
    );
    let _ = writeln!(out, "{}", paint(&summary, color, |s| s.bold().to_string()));
    out
}

fn severity_label(sev: Severity) -> &'static str {
    match sev {
        Severity::Critical => "🔴 critical",
        Severity::Warning => "🟠 warning",
        Severity::Info => "🔵 info",
    }
}

/// Markdown report, suitable for pasting into an issue or PR description.
pub fn render_markdown(res: &ScanResult) -> String {
    let mut out = String::from("# Performance Report\n\n");
    let s = &res.summary;
    let _ = writeln!(out, "| Files | Critical | Warnings | Info |");
    let _ = writeln!(out, "|---|---|---|---|");
    let _ = writeln!(out, "| {} | {} | {} | {} |\n", s.files, s.critical, s.warnings, s.infos);

    for report in res.files.iter().filter(|f| !f.result.issues.is_empty()) {
        let r = &report.result;
        let _ = writeln!(out, "## `{}`\n", report.file);
        if r.has_critical() {
            let _ = writeln!(
                out,
                "> **Critical performance issues detected.** These patterns may significantly slow down your application.\n"
            );
        }
        for issue in &r.issues {
            let line = issue
                .line
                .filter(|l| *l > 0)
                .map(|l| format!(" (line {l})"))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "- **{}** {}{}: {}",
                severity_label(issue.severity),
                issue.title,
                line,
                issue.description
            );
            if let Some(sug) = &issue.suggestion {
                let _ = writeln!(out, "  - Suggestion: {sug}");
            }
        }
        let m = &r.metrics;
        let _ = writeln!(out, "\n| Metric | Value |\n|---|---|");
        let _ = writeln!(
            out,
            "| Load time | {:.1}s current, {:.1}s with changes |",
            m.load_time,
            m.improved_load_time()
        );
        let _ = writeln!(out, "| Database Load | {:.1}x higher than necessary |", m.database_load);
        let _ = writeln!(out, "| Network Requests | {}+ per page load |", m.network_requests.round());
        let _ = writeln!(out, "| Potential Improvement | {}% |\n", m.potential_improvement.round());
        if !r.recommendations.is_empty() {
            let _ = writeln!(out, "### Recommendations\n");
            for rec in &r.recommendations {
                let _ = writeln!(out, "#### {}\n\n{}\n", rec.title, rec.description);
                if !rec.example_code.is_empty() {
                    let _ = writeln!(out, "```typescript\n{}\n```\n", rec.example_code.trim_end());
                }
            }
        }
    }
    out
}

pub fn render_pr_human(report: &PrReport, color: bool) -> String {
    let mut out = String::new();
    let verb = if report.dry_run { "planned:" } else { "comment:" };
    for c in &report.comments {
        let headline = c.body.lines().next().unwrap_or_default();
        let _ = writeln!(
            out,
            "{} {}:{} {}",
            paint(verb, color, |s| s.cyan().bold().to_string()),
            c.path,
            c.line,
            headline
        );
    }
    for f in &report.failures {
        let _ = writeln!(out, "{} {}", paint("failed:", color, |s| s.red().bold().to_string()), f);
    }
    let summary = format!(
        "— Summary — scanned={} skipped={} posted={} failures={}",
        report.files_scanned,
        report.files_skipped,
        report.comments_posted,
        report.failures.len()
    );
    let _ = writeln!(out, "{}", paint(&summary, color, |s| s.bold().to_string()));
    out
}
