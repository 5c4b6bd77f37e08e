//! Perfsense CLI binary entry point.
//! Resolves configuration, delegates to the library and prints results.

use clap::Parser;
use perfsense::augment::{ChatInsightProvider, InsightProvider};
use perfsense::cli::{Cli, Commands};
use perfsense::config::{self, Effective};
use perfsense::github::{self, GitHubClient, PullRequestRef};
use perfsense::output::{self, error_prefix, note_prefix};
use perfsense::scan::{self, ScanOptions};
use perfsense::logging;
use std::io::Read;
use tracing::warn;

/// Build the remote insight provider when enabled; a missing key disables it.
fn insight_provider(eff: &Effective) -> Option<ChatInsightProvider> {
    if !eff.ai.enabled {
        return None;
    }
    let provider = eff
        .ai
        .chat_settings()
        .and_then(ChatInsightProvider::new);
    match provider {
        Ok(p) => Some(p),
        Err(e) => {
            warn!(error = %e, "remote insight disabled");
            eprintln!("{} remote insight disabled: {}", note_prefix(), e);
            None
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Analyze {
            patterns,
            repo_root,
            stdin,
            file_name,
            output,
            ai,
            no_ai,
        } => {
            let eff = config::resolve_effective(
                repo_root.as_deref(),
                output.as_deref(),
                &patterns,
                Commands::ai_override(ai, no_ai),
            );
            if !eff.config_found && eff.output == "human" {
                eprintln!("{} No perfsense.toml found; using defaults.", note_prefix());
            }
            let provider = insight_provider(&eff);
            let opts = ScanOptions {
                load_time: eff.load_time,
                insight: provider.as_ref().map(|p| p as &dyn InsightProvider),
            };
            let result = if stdin {
                let mut source = String::new();
                if let Err(e) = std::io::stdin().read_to_string(&mut source) {
                    eprintln!("{} failed to read stdin: {}", error_prefix(), e);
                    std::process::exit(2);
                }
                let name = file_name.as_deref().unwrap_or("stdin.tsx");
                scan::scan_source(source, name, &opts)
            } else {
                scan::run_scan(&eff.repo_root, &eff.patterns, &opts)
            };
            output::print_scan(&result, &eff.output);
            if result.summary.critical > 0 {
                std::process::exit(1);
            }
        }
        Commands::Pr {
            owner,
            repo,
            number,
            repo_root,
            dry_run,
            output,
        } => {
            let eff = config::resolve_effective(repo_root.as_deref(), output.as_deref(), &[], None);
            let token = match eff.github.token() {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("{} {}", error_prefix(), e);
                    std::process::exit(2);
                }
            };
            let client = match GitHubClient::new(&eff.github.api_base, token) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("{} {}", error_prefix(), e);
                    std::process::exit(2);
                }
            };
            let pr = PullRequestRef {
                owner,
                repo,
                number,
            };
            let report =
                github::process_pull_request(&client, &pr, &eff.github.extensions, dry_run);
            output::print_pr(&report, &eff.output);
            if !report.failures.is_empty() {
                std::process::exit(1);
            }
        }
    }
}
