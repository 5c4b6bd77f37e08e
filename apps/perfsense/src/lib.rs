//! Perfsense core library.
//!
//! Static detection of N+1 request patterns in JavaScript/TypeScript, with
//! illustrative cost metrics, fix recommendations, optional remote model
//! insight and a GitHub pull-request commenter.
//!
//! High-level modules:
//! - `syntax`: tree-sitter parsing lowered into a typed node tree and a visitor.
//! - `matcher`: the N+1 pattern rules.
//! - `metrics`: metric synthesis from issue counts.
//! - `recommend`: recommendations and example snippets.
//! - `augment`: remote model insight (prompt, client, reply parsing, merge).
//! - `analyzer`: the single-source analysis pipeline.
//! - `scan`: glob-driven multi-file analysis with a summary.
//! - `github`: pull-request review comments.
//! - `cli`, `config`, `logging`, `output`: the binary's surface.
pub mod analyzer;
pub mod augment;
pub mod cli;
pub mod config;
pub mod error;
pub mod github;
pub mod logging;
pub mod matcher;
pub mod metrics;
pub mod models;
pub mod output;
pub mod recommend;
pub mod scan;
pub mod syntax;

pub use analyzer::{analyze_source, AnalyzeOptions};
pub use models::{AnalysisResult, Issue, Metrics, Recommendation, Severity};
