//! CLI for mirroring repositories from one Git host to another.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use repo_shuttle::config::{DEFAULT_DESTINATION_TEMPLATE, DEFAULT_REMOTE_NAME, DEFAULT_SOURCE_TEMPLATE};
use repo_shuttle::logging::init_logging;
use repo_shuttle::prelude::*;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "mirror-migrate")]
#[command(author, version, about = "Mirror every branch and tag of a list of repositories to another host", long_about = None)]
struct Cli {
    /// File containing repository names, one per line
    repos_list: PathBuf,

    /// Organization or user owning the repositories on the source host
    source_org: String,

    /// Organization or user receiving the mirrors
    destination_org: String,

    /// Directory holding the local mirror clones
    #[arg(long, default_value = ".")]
    workdir: PathBuf,

    /// Source URL template ({org} and {repo} are substituted)
    #[arg(long, default_value = DEFAULT_SOURCE_TEMPLATE)]
    source_url: UrlTemplate,

    /// Destination URL template ({org} and {repo} are substituted)
    #[arg(long, default_value = DEFAULT_DESTINATION_TEMPLATE)]
    destination_url: UrlTemplate,

    /// Name of the remote registered for the destination
    #[arg(long, default_value = DEFAULT_REMOTE_NAME)]
    remote_name: String,

    /// SSH private key to use instead of the SSH agent
    #[arg(long)]
    ssh_key: Option<PathBuf>,

    /// Passphrase for the SSH private key
    #[arg(long, env = "MIRROR_SSH_PASSPHRASE", requires = "ssh_key", hide_env_values = true)]
    ssh_passphrase: Option<String>,

    /// Token for HTTPS source and destination URLs
    #[arg(long, env = "MIRROR_GIT_TOKEN", conflicts_with = "ssh_key", hide_env_values = true)]
    git_token: Option<String>,

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

    let auth = match (cli.ssh_key, cli.git_token) {
        (Some(path), _) => match cli.ssh_passphrase {
            Some(passphrase) => GitAuth::ssh_key(path).with_passphrase(passphrase),
            None => GitAuth::ssh_key(path),
        },
        (None, Some(token)) => GitAuth::token(token),
        (None, None) => GitAuth::default(),
    };

    let config = MirrorConfig::new(cli.source_org, cli.destination_org)
        .workdir(cli.workdir)
        .source_template(cli.source_url)
        .destination_template(cli.destination_url)
        .remote_name(cli.remote_name)
        .auth(auth);
    config.validate().context("Invalid configuration")?;

    std::fs::create_dir_all(&config.workdir)
        .with_context(|| format!("Failed to create {}", config.workdir.display()))?;

    if list.is_empty() {
        println!("No repositories listed in {}", cli.repos_list.display());
    }

    let batch = Migrator::new(config).run(&list, |result| println!("{}", result));

    println!("\n{}", batch.summary);
    Ok(batch.summary)
}
