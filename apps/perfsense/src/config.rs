//! Configuration discovery and effective settings resolution.
//!
//! perfsense reads `perfsense.toml|yaml|yml` from the repository root (or
//! closest ancestor) and merges it with CLI flags to produce an `Effective`
//! config.
//! Defaults:
//! - `output`: `human`
//! - `analyze.patterns`: `src/**/*.{ts,tsx,js,jsx}` (one glob per extension)
//! - `metrics.load_time`: `per-issue`
//! - `ai.enabled`: false; `ai.format`: `json`; no request timeout
//! - `github.extensions`: `ts`, `tsx`
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::augment::{ChatSettings, ReplyFormat};
use crate::error::RemoteError;
use crate::metrics::LoadTimeModel;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_NAMES: [&str; 3] = ["perfsense.toml", "perfsense.yaml", "perfsense.yml"];

pub const DEFAULT_PATTERNS: [&str; 4] = [
    "src/**/*.ts",
    "src/**/*.tsx",
    "src/**/*.js",
    "src/**/*.jsx",
];
pub const DEFAULT_AI_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_AI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_AI_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";
pub const DEFAULT_GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

#[derive(Debug, Default, Deserialize, Clone)]
/// `[analyze]` section.
pub struct AnalyzeCfg {
    pub patterns: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// `[metrics]` section.
pub struct MetricsCfg {
    pub load_time: Option<LoadTimeModel>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// `[ai]` section: remote insight provider.
pub struct AiCfg {
    pub enabled: Option<bool>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    /// Name of the environment variable holding the API key.
    pub api_key_env: Option<String>,
    pub format: Option<ReplyFormat>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// `[github]` section: pull-request commenter.
pub struct GithubCfg {
    pub api_base: Option<String>,
    pub token_env: Option<String>,
    /// File extensions (without the dot) eligible for review comments.
    pub extensions: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `perfsense.toml|yaml`.
pub struct PerfsenseConfig {
    pub output: Option<String>,
    #[serde(default)]
    pub analyze: Option<AnalyzeCfg>,
    #[serde(default)]
    pub metrics: Option<MetricsCfg>,
    #[serde(default)]
    pub ai: Option<AiCfg>,
    #[serde(default)]
    pub github: Option<GithubCfg>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AiSettings {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    pub api_key_env: String,
    pub format: ReplyFormat,
    pub timeout: Option<Duration>,
}

impl AiSettings {
    /// Resolve the API key from the environment into client settings.
    pub fn chat_settings(&self) -> Result<ChatSettings, RemoteError> {
        let api_key = std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| RemoteError::MissingCredential(self.api_key_env.clone()))?;
        Ok(ChatSettings {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            api_key,
            format: self.format,
            timeout: self.timeout,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GithubSettings {
    pub api_base: String,
    pub token_env: String,
    pub extensions: Vec<String>,
}

impl GithubSettings {
    pub fn token(&self) -> Result<String, RemoteError> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| RemoteError::MissingCredential(self.token_env.clone()))
    }
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub config_found: bool,
    pub output: String,
    pub patterns: Vec<String>,
    pub load_time: LoadTimeModel,
    pub ai: AiSettings,
    pub github: GithubSettings,
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `perfsense.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_NAMES.iter().any(|n| cur.join(n).exists()) {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `PerfsenseConfig` from `perfsense.toml` or `perfsense.yaml|yml` if present.
pub fn load_config(root: &Path) -> Option<PerfsenseConfig> {
    let toml_path = root.join("perfsense.toml");
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path).ok()?;
        return match toml::from_str::<PerfsenseConfig>(&s) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                tracing::warn!(path = %toml_path.display(), error = %e, "ignoring invalid config");
                None
            }
        };
    }
    for yml in ["perfsense.yaml", "perfsense.yml"] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p).ok()?;
            return match serde_yaml::from_str::<PerfsenseConfig>(&s) {
                Ok(cfg) => Some(cfg),
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "ignoring invalid config");
                    None
                }
            };
        }
    }
    None
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(
    cli_repo_root: Option<&str>,
    cli_output: Option<&str>,
    cli_patterns: &[String],
    cli_ai: Option<bool>,
) -> Effective {
    let start = PathBuf::from(cli_repo_root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let loaded = load_config(&repo_root);
    let config_found = loaded.is_some();
    let cfg = loaded.unwrap_or_default();

    let output = cli_output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    let patterns = if !cli_patterns.is_empty() {
        cli_patterns.to_vec()
    } else {
        cfg.analyze
            .as_ref()
            .and_then(|a| a.patterns.clone())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_PATTERNS.iter().map(|s| s.to_string()).collect())
    };

    let load_time = cfg
        .metrics
        .as_ref()
        .and_then(|m| m.load_time)
        .unwrap_or_default();

    let ai_cfg = cfg.ai.unwrap_or_default();
    let ai = AiSettings {
        enabled: cli_ai.or(ai_cfg.enabled).unwrap_or(false),
        endpoint: ai_cfg
            .endpoint
            .unwrap_or_else(|| DEFAULT_AI_ENDPOINT.to_string()),
        model: ai_cfg.model.unwrap_or_else(|| DEFAULT_AI_MODEL.to_string()),
        api_key_env: ai_cfg
            .api_key_env
            .unwrap_or_else(|| DEFAULT_AI_KEY_ENV.to_string()),
        format: ai_cfg.format.unwrap_or_default(),
        timeout: ai_cfg.timeout_secs.map(Duration::from_secs),
    };

    let gh_cfg = cfg.github.unwrap_or_default();
    let github = GithubSettings {
        api_base: gh_cfg
            .api_base
            .unwrap_or_else(|| DEFAULT_GITHUB_API.to_string()),
        token_env: gh_cfg
            .token_env
            .unwrap_or_else(|| DEFAULT_GITHUB_TOKEN_ENV.to_string()),
        extensions: gh_cfg
            .extensions
            .unwrap_or_else(|| vec!["ts".to_string(), "tsx".to_string()])
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect(),
    };

    Effective {
        repo_root,
        config_found,
        output,
        patterns,
        load_time,
        ai,
        github,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("perfsense.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
output = "json"
[analyze]
patterns = ["app/**/*.ts"]
[metrics]
load_time = "flat"
[ai]
enabled = true
model = "gpt-4o-mini"
format = "labeled"
timeout_secs = 30
    "#
        )
        .unwrap();

        // Resolve using explicit repo_root to avoid global CWD races
        let eff = resolve_effective(root.to_str(), None, &[], None);
        assert!(eff.config_found);
        assert_eq!(eff.output, "json");
        assert_eq!(eff.patterns, vec!["app/**/*.ts".to_string()]);
        assert_eq!(eff.load_time, LoadTimeModel::Flat);
        assert!(eff.ai.enabled);
        assert_eq!(eff.ai.model, "gpt-4o-mini");
        assert_eq!(eff.ai.format, ReplyFormat::Labeled);
        assert_eq!(eff.ai.timeout, Some(Duration::from_secs(30)));
        assert_eq!(eff.ai.endpoint, DEFAULT_AI_ENDPOINT);
    }

    #[test]
    fn test_load_yaml_and_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("perfsense.yaml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
github:
  extensions: [".ts", "JS"]
            "#
        )
        .unwrap();

        let eff = resolve_effective(root.to_str(), None, &[], None);
        assert_eq!(eff.output, "human");
        assert_eq!(eff.patterns.len(), DEFAULT_PATTERNS.len());
        assert_eq!(eff.load_time, LoadTimeModel::PerIssue);
        assert!(!eff.ai.enabled);
        assert_eq!(eff.ai.timeout, None);
        assert_eq!(eff.github.extensions, vec!["ts".to_string(), "js".to_string()]);
        assert_eq!(eff.github.token_env, DEFAULT_GITHUB_TOKEN_ENV);
    }

    #[test]
    fn test_cli_precedence() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("perfsense.toml"),
            "output = \"json\"\n[ai]\nenabled = true\n[analyze]\npatterns = [\"lib/*.ts\"]\n",
        )
        .unwrap();
        let cli_patterns = vec!["web/*.tsx".to_string()];
        let eff = resolve_effective(root.to_str(), Some("markdown"), &cli_patterns, Some(false));
        assert_eq!(eff.output, "markdown");
        assert!(!eff.ai.enabled);
        assert_eq!(eff.patterns, cli_patterns);
    }

    #[test]
    fn test_detect_root_from_nested_dir() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("a/b")).unwrap();
        assert_eq!(detect_repo_root(&root.join("a/b")), root.to_path_buf());
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("perfsense.toml"), "output = [").unwrap();
        let eff = resolve_effective(root.to_str(), None, &[], None);
        assert!(!eff.config_found);
        assert_eq!(eff.output, "human");
    }

    #[test]
    fn test_missing_key_is_reported() {
        let ai = AiSettings {
            enabled: true,
            endpoint: DEFAULT_AI_ENDPOINT.into(),
            model: DEFAULT_AI_MODEL.into(),
            api_key_env: "PERFSENSE_TEST_UNSET_KEY_VAR".into(),
            format: ReplyFormat::Json,
            timeout: None,
        };
        assert!(matches!(
            ai.chat_settings(),
            Err(RemoteError::MissingCredential(_))
        ));
    }
}
