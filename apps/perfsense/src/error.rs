//! Error types for the parse and remote-service boundaries.
//!
//! None of these escape an analysis: callers convert them into degraded
//! results (a synthetic warning issue or an all-zero insight).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("failed to load {language} grammar: {message}")]
    Grammar { language: &'static str, message: String },
    #[error("parser produced no syntax tree")]
    NoTree,
    #[error("syntax error at line {line}, column {column}")]
    Syntax { line: u32, column: u32 },
    #[error("nesting deeper than {limit} levels at line {line}")]
    TooDeep { limit: usize, line: u32 },
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{service} responded with status {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },
    #[error("missing credential: environment variable {0} is not set")]
    MissingCredential(String),
    #[error("malformed reply: {0}")]
    MalformedReply(String),
    #[error("failed to decode content: {0}")]
    Decode(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}
