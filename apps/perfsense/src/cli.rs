//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "perfsense",
    version,
    about = "Perfsense: N+1 pattern detection for JS/TS",
    long_about = "Perfsense scans JavaScript/TypeScript sources for N+1 request patterns, estimates their cost, and suggests fixes.\n\nConfiguration precedence: CLI > perfsense.toml > defaults.",
    after_help = "Examples:\n  perfsense analyze\n  perfsense analyze 'app/**/*.ts' --output json\n  cat file.ts | perfsense analyze --stdin --file-name file.ts\n  perfsense pr --owner acme --repo shop --number 42 --dry-run",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[arg(short, long, global = true, action = clap::ArgAction::SetTrue, help = "Enable debug logging on stderr")]
    pub verbose: bool,
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current perfsense version.")]
    Version,
    /// Analyze source files
    #[command(
        about = "Analyze source files",
        long_about = "Match files against N+1 patterns and print issues, estimated metrics and recommendations. Exits 1 when any critical issue is found.",
        after_help = "Examples:\n  perfsense analyze 'src/**/*.ts'\n  perfsense analyze --output markdown --ai"
    )]
    Analyze {
        #[arg(help = "Glob patterns relative to the repository root (default: src/**/*.{ts,tsx,js,jsx})")]
        patterns: Vec<String>,
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Read a single source from stdin")]
        stdin: bool,
        #[arg(long, help = "Display name for --stdin input; its extension selects the grammar")]
        file_name: Option<String>,
        #[arg(long, help = "Output mode: human|json|markdown (default: human)")]
        output: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, conflicts_with = "no_ai", help = "Augment results with remote model insight")]
        ai: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Disable remote insight even if configured")]
        no_ai: bool,
    },
    /// Comment on a pull request
    #[command(
        about = "Review a GitHub pull request",
        long_about = "Run the pattern matcher on changed TS/TSX files of a pull request and post one inline review comment per issue. The token is read from GITHUB_TOKEN unless configured otherwise.",
        after_help = "Examples:\n  perfsense pr --owner acme --repo shop --number 42\n  perfsense pr --owner acme --repo shop --number 42 --dry-run --output json"
    )]
    Pr {
        #[arg(long, help = "Repository owner")]
        owner: String,
        #[arg(long, help = "Repository name")]
        repo: String,
        #[arg(long, help = "Pull request number")]
        number: u64,
        #[arg(long, help = "Repository root used for config discovery (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Print planned comments without posting them")]
        dry_run: bool,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
}

impl Commands {
    /// Tri-state AI toggle: `Some(true)` for `--ai`, `Some(false)` for `--no-ai`.
    pub fn ai_override(ai: bool, no_ai: bool) -> Option<bool> {
        match (ai, no_ai) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}
