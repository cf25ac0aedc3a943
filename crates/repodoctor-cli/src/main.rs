//! RepoDoctor - evidence-based repository review CLI
//!
//! ## Commands
//!
//! - `analyze`: Clone a repo, run heuristics and the AI review, print the report
//! - `publish`: File reviewed issues on the repo's GitHub tracker

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;

use repodoctor_core::{
    publish_top_issues, AnalysisResult, Analyzer, GitHubIssues, RepoDoctorConfig, RepoRef,
    ReviewIssue,
};

#[derive(Parser)]
#[command(name = "repodoctor")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Evidence-based repository review", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a GitHub repository and print the review
    Analyze {
        /// Repository URL, e.g. https://github.com/owner/repo
        url: String,

        /// Print the raw result as JSON instead of the human report
        #[arg(long)]
        json: bool,
    },

    /// Create GitHub issues from a saved review
    Publish {
        /// Repository URL, e.g. https://github.com/owner/repo
        url: String,

        /// GitHub token with issue-write access (not stored)
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: String,

        /// Path to a JSON file holding the issues to create
        #[arg(long)]
        issues: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    repodoctor_core::init_tracing(cli.json_logs, level);

    match cli.command {
        Commands::Analyze { url, json } => cmd_analyze(&url, json).await,
        Commands::Publish { url, token, issues } => cmd_publish(&url, &token, &issues).await,
    }
}

async fn cmd_analyze(url: &str, json: bool) -> Result<()> {
    let config = RepoDoctorConfig::from_env();
    let analyzer = Analyzer::new(&config);

    let result = analyzer
        .analyze(url)
        .await
        .with_context(|| format!("analysis of {url} failed"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_report(&result);
    }
    Ok(())
}

fn print_report(result: &AnalysisResult) {
    println!("Repository: {}", result.repo);
    println!(
        "Sampled {} files; key files: {}",
        result.summary.file_count_sampled,
        if result.summary.key_files_found.is_empty() {
            "none".to_string()
        } else {
            result.summary.key_files_found.join(", ")
        }
    );

    print_section("Findings", &result.findings);
    print_section("Quick wins", &result.quick_wins);
    print_section("Risks", &result.risks);

    match &result.ai_review {
        Some(review) => {
            println!("\n{}", review.one_liner);
            println!("\nTop 5 issues:");
            for issue in &review.top_5 {
                println!("  [{}] {}", issue.severity, issue.title);
                println!("      evidence: {}", issue.evidence);
                println!("      fix:      {}", issue.fix);
            }
            print_section("Next 7 days", &review.next_7_days_plan);
        }
        None => {
            println!("\nAI review unavailable.");
            if let Some(err) = &result.debug.review_error {
                println!("  reason: {err}");
            }
        }
    }

    print_section("Next steps", &result.next_steps);
}

fn print_section(title: &str, entries: &[String]) {
    if entries.is_empty() {
        return;
    }
    println!("\n{title}:");
    for entry in entries {
        println!("  - {entry}");
    }
}

async fn cmd_publish(url: &str, token: &str, issues_path: &PathBuf) -> Result<()> {
    let repo = RepoRef::parse(url).context("invalid repository URL")?;

    let raw = std::fs::read_to_string(issues_path)
        .with_context(|| format!("failed to read {}", issues_path.display()))?;
    let issues: Vec<ReviewIssue> =
        serde_json::from_str(&raw).context("issues file is not a valid issue list")?;

    let tracker = GitHubIssues::new();
    match publish_top_issues(&tracker, &repo, token, &issues).await {
        Ok(created) => {
            println!("Created {} issue(s):", created.len());
            for url in created {
                println!("  {url}");
            }
            Ok(())
        }
        Err(err) => {
            for url in err.created() {
                println!("  created before failure: {url}");
            }
            Err(err).context("publishing issues failed")
        }
    }
}
