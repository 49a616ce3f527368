//! CLI for creating a list of repositories in a GitHub organization.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use repo_shuttle::github::DEFAULT_API_URL;
use repo_shuttle::logging::init_logging;
use repo_shuttle::prelude::*;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "mass-create")]
#[command(author, version, about = "Create GitHub repositories in an organization, fixing the visibility of existing ones", long_about = None)]
struct Cli {
    /// File containing repository names, one per line
    repos_list: PathBuf,

    /// Organization the repositories are created in
    org: String,

    /// GitHub token allowed to create repositories in the organization
    token: String,

    /// Whether the repositories are private (true/yes/1/private or false/no/0/public)
    private: Visibility,

    /// GitHub API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Create attempts per repository while rate limited
    #[arg(long, default_value_t = 10)]
    max_attempts: u32,

    /// Longest total wait per repository while rate limited, in seconds
    #[arg(long, default_value_t = 3600)]
    max_wait_secs: u64,

    /// Verbose output (repeat for more verbosity)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(summary) if summary.has_failures() => ExitCode::from(1),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<BatchSummary> {
    let list = RepoList::from_file(&cli.repos_list)
        .with_context(|| format!("Failed to read {}", cli.repos_list.display()))?;

    let retry = RetryPolicy::default()
        .max_attempts(cli.max_attempts)
        .max_total_wait(Duration::from_secs(cli.max_wait_secs));
    let config = CreateConfig::new(cli.org, cli.private).retry(retry);
    config.validate().context("Invalid configuration")?;

    let client = GitHubClient::with_base_url(cli.token, cli.api_url).context("Invalid API URL")?;
    let creator = RepoCreator::new(&client, config);

    let batch = creator.run(&list, |result| println!("{}", result));

    println!("\n{}", batch.summary);
    Ok(batch.summary)
}
