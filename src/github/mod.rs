//! GitHub API integration for bulk repository creation.
//!
//! This module provides a blocking client for the GitHub REST API that can:
//! - Create repositories in an organization
//! - Read and change repository visibility
//! - Recognise the secondary rate limit and its reset time
//!
//! # Example
//!
//! ```rust,no_run
//! use repo_shuttle::github::{CreateAttempt, CreateRepoRequest, GitHubClient, RepoOps};
//!
//! let client = GitHubClient::new("ghp_your_token_here");
//!
//! match client.create_org_repo("my-org", &CreateRepoRequest::new("widgets", true))? {
//!     CreateAttempt::Created(_) => println!("created my-org/widgets"),
//!     other => println!("not created: {:?}", other),
//! }
//! # Ok::<(), repo_shuttle::error::ShuttleError>(())
//! ```

pub(crate) mod client;
mod rate_limit;
mod repos;

pub use client::{ApiResponse, DEFAULT_API_URL, GitHubClient};
pub use rate_limit::{RATE_LIMIT_RESET, RateLimitWindow, is_secondary_rate_limit};
pub use repos::{CreateAttempt, CreateRepoRequest, GitHubRepo, RepoOps};
