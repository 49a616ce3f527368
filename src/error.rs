//! Error types for repository mirroring and creation.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The main error type for repo-shuttle operations.
#[derive(Error, Debug)]
pub enum ShuttleError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid repository name {name:?}: {reason}")]
    InvalidRepoName { name: String, reason: String },

    #[error("Invalid visibility {0:?} (expected one of: true, yes, 1, private, false, no, 0, public)")]
    InvalidVisibility(String),

    #[error("Invalid URL template {template:?}: {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("Clone failed for {url}: {message}")]
    CloneError { url: String, message: String },

    #[error("Fetch failed: {message}")]
    FetchError { message: String },

    #[error("Push to '{remote}' rejected for {}", .refs.join(", "))]
    PushRejected { remote: String, refs: Vec<String> },

    #[error("Push failed: {message}")]
    PushError { message: String },

    #[error("GitHub API error ({status}): {message}")]
    GitHub { status: u16, message: String },

    #[error("Still rate limited after {attempts} attempt(s) and {}s of waiting", .waited.as_secs())]
    RateLimitExhausted { attempts: u32, waited: Duration },
}

/// A specialized Result type for repo-shuttle operations.
pub type Result<T> = std::result::Result<T, ShuttleError>;
