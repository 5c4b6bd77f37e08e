//! Pull-request commenter.
//!
//! For every changed file with an allowlisted extension, fetch its content at
//! the head commit, run the pattern matcher, and post one inline review
//! comment per issue. Comments are posted sequentially with no batching and
//! no check against earlier runs, so re-running duplicates them.

use crate::analyzer::find_source_issues;
use crate::error::RemoteError;
use crate::models::Issue;
use crate::syntax::SourceLanguage;
use base64::Engine;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use tracing::{debug, info, warn};

const PER_PAGE: usize = 100;
/// GitHub stops listing pull-request files at 3000.
const MAX_PAGES: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChangedFile {
    pub filename: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewComment {
    pub path: String,
    pub line: u32,
    pub body: String,
}

/// The subset of a code-hosting API the commenter needs.
pub trait PullRequestHost {
    fn head_sha(&self, pr: &PullRequestRef) -> Result<String, RemoteError>;
    fn list_files(&self, pr: &PullRequestRef) -> Result<Vec<ChangedFile>, RemoteError>;
    fn file_content(
        &self,
        pr: &PullRequestRef,
        path: &str,
        git_ref: &str,
    ) -> Result<String, RemoteError>;
    fn create_review_comment(
        &self,
        pr: &PullRequestRef,
        commit_id: &str,
        comment: &ReviewComment,
    ) -> Result<(), RemoteError>;
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrReport {
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub comments_posted: usize,
    pub dry_run: bool,
    /// Every comment the run produced, posted or not.
    pub comments: Vec<ReviewComment>,
    pub failures: Vec<String>,
}

pub fn comment_body(issue: &Issue) -> String {
    format!(
        "🔍 Performance Issue Detected: {}\n\nSuggestion: {}",
        issue.description,
        issue
            .suggestion
            .as_deref()
            .unwrap_or("No specific recommendation available")
    )
}

/// Extension allowlist check; `removed` files have no content to review.
pub fn is_eligible(file: &ChangedFile, extensions: &[String]) -> bool {
    if file.status == "removed" {
        return false;
    }
    Path::new(&file.filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| extensions.iter().any(|allowed| *allowed == e))
}

pub fn process_pull_request(
    host: &dyn PullRequestHost,
    pr: &PullRequestRef,
    extensions: &[String],
    dry_run: bool,
) -> PrReport {
    let mut report = PrReport {
        dry_run,
        ..PrReport::default()
    };
    let head = match host.head_sha(pr) {
        Ok(sha) => sha,
        Err(e) => {
            warn!(error = %e, "could not resolve pull request head");
            report.failures.push(format!("head: {e}"));
            return report;
        }
    };
    let files = match host.list_files(pr) {
        Ok(files) => files,
        Err(e) => {
            warn!(error = %e, "could not list pull request files");
            report.failures.push(format!("files: {e}"));
            return report;
        }
    };
    info!(files = files.len(), head = %head, "reviewing pull request");

    for file in files {
        if !is_eligible(&file, extensions) {
            debug!(file = %file.filename, status = %file.status, "skipping file");
            report.files_skipped += 1;
            continue;
        }
        let content = match host.file_content(pr, &file.filename, &head) {
            Ok(c) => c,
            Err(e) => {
                warn!(file = %file.filename, error = %e, "could not fetch file content");
                report.failures.push(format!("{}: {e}", file.filename));
                continue;
            }
        };
        let language = SourceLanguage::from_path(Path::new(&file.filename));
        let issues = match find_source_issues(&content, language, Some(&file.filename)) {
            Ok(issues) => issues,
            Err(e) => {
                warn!(file = %file.filename, error = %e, "analysis failed");
                report.failures.push(format!("{}: {e}", file.filename));
                continue;
            }
        };
        report.files_scanned += 1;

        for issue in &issues {
            let Some(line) = issue.line.filter(|l| *l > 0) else {
                continue;
            };
            let comment = ReviewComment {
                path: file.filename.clone(),
                line,
                body: comment_body(issue),
            };
            if !dry_run {
                match host.create_review_comment(pr, &head, &comment) {
                    Ok(()) => report.comments_posted += 1,
                    Err(e) => {
                        warn!(file = %file.filename, line, error = %e, "could not post comment");
                        report
                            .failures
                            .push(format!("{}:{line}: {e}", file.filename));
                    }
                }
            }
            report.comments.push(comment);
        }
    }
    report
}

/// GitHub REST API implementation of `PullRequestHost`.
pub struct GitHubClient {
    client: Client,
    api_base: Url,
    token: String,
}

#[derive(Deserialize)]
struct PullRequestBody {
    head: HeadBody,
}

#[derive(Deserialize)]
struct HeadBody {
    sha: String,
}

#[derive(Deserialize)]
struct ContentBody {
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

impl GitHubClient {
    pub fn new(api_base: &str, token: String) -> Result<Self, RemoteError> {
        let api_base =
            Url::parse(api_base).map_err(|e| RemoteError::InvalidUrl(format!("{api_base}: {e}")))?;
        let client = Client::builder()
            .user_agent(concat!("perfsense/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_base,
            token,
        })
    }

    fn url<'s>(&self, segments: impl IntoIterator<Item = &'s str>) -> Result<Url, RemoteError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::InvalidUrl(self.api_base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn pulls_url(&self, pr: &PullRequestRef, tail: &[&str]) -> Result<Url, RemoteError> {
        let number = pr.number.to_string();
        let mut segments = vec!["repos", pr.owner.as_str(), pr.repo.as_str(), "pulls", number.as_str()];
        segments.extend_from_slice(tail);
        self.url(segments)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    fn send(&self, req: RequestBuilder) -> Result<String, RemoteError> {
        let resp = self.authorized(req).send()?;
        let status = resp.status();
        let text = resp.text()?;
        if !status.is_success() {
            return Err(RemoteError::Status {
                service: "github",
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, RemoteError> {
        let text = self.send(self.client.get(url))?;
        serde_json::from_str(&text).map_err(|e| RemoteError::MalformedReply(e.to_string()))
    }
}

impl PullRequestHost for GitHubClient {
    fn head_sha(&self, pr: &PullRequestRef) -> Result<String, RemoteError> {
        let body: PullRequestBody = self.get_json(self.pulls_url(pr, &[])?)?;
        Ok(body.head.sha)
    }

    fn list_files(&self, pr: &PullRequestRef) -> Result<Vec<ChangedFile>, RemoteError> {
        let mut all = Vec::new();
        for page in 1..=MAX_PAGES {
            let mut url = self.pulls_url(pr, &["files"])?;
            url.query_pairs_mut()
                .append_pair("per_page", &PER_PAGE.to_string())
                .append_pair("page", &page.to_string());
            let batch: Vec<ChangedFile> = self.get_json(url)?;
            let done = batch.len() < PER_PAGE;
            all.extend(batch);
            if done {
                break;
            }
        }
        Ok(all)
    }

    fn file_content(
        &self,
        pr: &PullRequestRef,
        path: &str,
        git_ref: &str,
    ) -> Result<String, RemoteError> {
        let mut segments = vec!["repos", pr.owner.as_str(), pr.repo.as_str(), "contents"];
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        let mut url = self.url(segments)?;
        url.query_pairs_mut().append_pair("ref", git_ref);
        let body: ContentBody = self.get_json(url)?;
        decode_content(&body.content, &body.encoding)
    }

    fn create_review_comment(
        &self,
        pr: &PullRequestRef,
        commit_id: &str,
        comment: &ReviewComment,
    ) -> Result<(), RemoteError> {
        let url = self.pulls_url(pr, &["comments"])?;
        let payload = json!({
            "body": comment.body,
            "commit_id": commit_id,
            "path": comment.path,
            "line": comment.line,
            "side": "RIGHT",
        });
        self.send(self.client.post(url).json(&payload))?;
        Ok(())
    }
}

/// Decode a contents-API payload; base64 arrives wrapped at 60 columns.
fn decode_content(content: &str, encoding: &str) -> Result<String, RemoteError> {
    if !encoding.is_empty() && encoding != "base64" {
        return Err(RemoteError::Decode(format!("unsupported encoding {encoding}")));
    }
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| RemoteError::Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| RemoteError::Decode(e.to_string()))
}
