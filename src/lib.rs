//! # repo-shuttle
//!
//! Tools for moving a batch of repositories from one Git host to another.
//!
//! This crate provides:
//! - A mirror migrator that copies every branch and tag of a repository from
//!   a source host to a destination host, reusing local mirrors on later runs
//! - A bulk creator that makes sure repositories exist in a GitHub
//!   organization with the desired visibility, waiting out secondary rate
//!   limits
//!
//! Both work through a list file with one repository name per line.
//!
//! ## Mirror Migration
//!
//! ```rust,no_run
//! use repo_shuttle::prelude::*;
//!
//! let list = RepoList::from_file("repos.txt")?;
//! let config = MirrorConfig::new("gitlab-team", "github-org").workdir("./mirrors");
//!
//! let batch = Migrator::new(config).run(&list, |result| println!("{}", result));
//! println!("{}", batch.summary);
//! # Ok::<(), repo_shuttle::error::ShuttleError>(())
//! ```
//!
//! ## Bulk Creation
//!
//! ```rust,no_run
//! use repo_shuttle::prelude::*;
//!
//! let client = GitHubClient::from_env()?;
//! let list = RepoList::from_file("repos.txt")?;
//! let creator = RepoCreator::new(&client, CreateConfig::new("github-org", Visibility::Private));
//!
//! let batch = creator.run(&list, |result| println!("{}", result));
//! assert!(!batch.summary.has_failures());
//! # Ok::<(), repo_shuttle::error::ShuttleError>(())
//! ```

pub mod config;
pub mod create;
pub mod error;
pub mod git;
pub mod github;
pub mod logging;
pub mod migrate;
pub mod repo_list;
pub mod report;
pub mod retry;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{CreateConfig, MirrorConfig, UrlTemplate, Visibility};
    pub use crate::create::{CreateOutcome, Reconciliation, RepoCreator};
    pub use crate::error::{Result, ShuttleError};
    pub use crate::git::{GitAuth, GitOps, MirrorOps, MirrorPlan, RemoteChange};
    pub use crate::github::{CreateAttempt, CreateRepoRequest, GitHubClient, GitHubRepo, RepoOps};
    pub use crate::migrate::{GitBackend, MigrationOutcome, MirrorBackend, Migrator};
    pub use crate::repo_list::{RepoList, RepoListEntry, RepoName};
    pub use crate::report::{BatchResult, BatchSummary, Outcome, RepoResult, RepoStatus};
    pub use crate::retry::{Clock, RetryPolicy, SystemClock};
}

pub use prelude::*;
