//! Scan runner: expand patterns, analyze each matched file, summarize.
//!
//! Local analysis runs in parallel across files. Remote insight, when
//! enabled, is requested afterwards one file at a time.

use crate::analyzer::{error_issue, finish, run_local, LocalOutcome};
use crate::augment::InsightProvider;
use crate::metrics::LoadTimeModel;
use crate::models::{AnalysisResult, Severity};
use crate::syntax::SourceLanguage;
use glob::glob;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Default)]
pub struct ScanOptions<'a> {
    pub load_time: LoadTimeModel,
    pub insight: Option<&'a dyn InsightProvider>,
}

#[derive(Debug, Clone, Serialize)]
/// One analyzed file.
pub struct FileReport {
    pub file: String,
    #[serde(flatten)]
    pub result: AnalysisResult,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
/// Aggregated scan summary used by printers and exit codes.
pub struct Summary {
    pub critical: usize,
    pub warnings: usize,
    pub infos: usize,
    pub files: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub files: Vec<FileReport>,
    pub summary: Summary,
}

impl ScanResult {
    fn from_reports(files: Vec<FileReport>) -> Self {
        let mut summary = Summary {
            files: files.len(),
            ..Summary::default()
        };
        for report in &files {
            for issue in &report.result.issues {
                match issue.severity {
                    Severity::Critical => summary.critical += 1,
                    Severity::Warning => summary.warnings += 1,
                    Severity::Info => summary.infos += 1,
                }
            }
        }
        ScanResult { files, summary }
    }
}

/// Only components below `root` count, so a checkout that itself lives under
/// a `node_modules` directory is still scanned.
fn in_node_modules(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .any(|c| matches!(c, Component::Normal(n) if n == "node_modules"))
}

/// Expand glob patterns relative to `root` into a sorted, de-duplicated file list.
pub fn collect_targets(root: &Path, patterns: &[String]) -> Vec<PathBuf> {
    let mut targets: BTreeSet<PathBuf> = BTreeSet::new();
    for pat in patterns {
        let abs_glob = root.join(pat);
        let pattern = abs_glob.to_string_lossy().to_string();
        let entries = match glob(&pattern) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(pattern = %pat, error = %e, "skipping invalid glob pattern");
                continue;
            }
        };
        for entry in entries.flatten() {
            if entry.is_file() && !in_node_modules(root, &entry) {
                targets.insert(entry);
            }
        }
    }
    targets.into_iter().collect()
}

fn display_path(root: &Path, path: &Path) -> String {
    pathdiff::diff_paths(path, root)
        .unwrap_or_else(|| path.to_path_buf())
        .to_string_lossy()
        .to_string()
}

struct LocalFile {
    display: String,
    source: Option<String>,
    outcome: LocalOutcome,
}

fn complete(files: Vec<LocalFile>, opts: &ScanOptions<'_>) -> ScanResult {
    let reports = files
        .into_iter()
        .map(|f| {
            let remote = match (opts.insight, f.source.as_deref()) {
                (Some(provider), Some(source)) => {
                    debug!(file = %f.display, "requesting remote insight");
                    Some(provider.insights(source))
                }
                _ => None,
            };
            FileReport {
                result: finish(f.outcome, remote, opts.load_time),
                file: f.display,
            }
        })
        .collect();
    ScanResult::from_reports(reports)
}

/// Analyze every file matched by `patterns` under `root`.
pub fn run_scan(root: &Path, patterns: &[String], opts: &ScanOptions<'_>) -> ScanResult {
    let targets = collect_targets(root, patterns);
    info!(files = targets.len(), "scanning");
    let locals: Vec<LocalFile> = targets
        .par_iter()
        .map(|path| {
            let display_name = display_path(root, path);
            match fs::read_to_string(path) {
                Ok(source) => {
                    let outcome =
                        run_local(&source, SourceLanguage::from_path(path), Some(&display_name));
                    LocalFile {
                        display: display_name,
                        source: Some(source),
                        outcome,
                    }
                }
                Err(e) => {
                    warn!(file = %display_name, error = %e, "unreadable file");
                    let issue = error_issue(&format!("Failed to read file: {e}"), Some(&display_name));
                    LocalFile {
                        display: display_name,
                        source: None,
                        outcome: LocalOutcome::Failed(issue),
                    }
                }
            }
        })
        .collect();
    complete(locals, opts)
}

/// Analyze a single in-memory source (e.g. stdin) under a display name.
pub fn scan_source(source: String, name: &str, opts: &ScanOptions<'_>) -> ScanResult {
    let outcome = run_local(&source, SourceLanguage::from_path(Path::new(name)), Some(name));
    complete(
        vec![LocalFile {
            display: name.to_string(),
            source: Some(source),
            outcome,
        }],
        opts,
    )
}
