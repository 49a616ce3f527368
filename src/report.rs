//! Per-repository results and batch totals.

use crate::error::Result;
use crate::repo_list::{RepoList, RepoListEntry, RepoName};
use std::fmt;

/// Status of a repository after processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoStatus {
    /// Processed and changed something.
    Success,
    /// Processed but no changes were needed.
    NoChanges,
    /// Deliberately left alone.
    Skipped(String),
    /// Failed to process.
    Failed(String),
}

impl RepoStatus {
    /// Console marker for the status.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Success => "ok",
            Self::NoChanges => "unchanged",
            Self::Skipped(_) => "skipped",
            Self::Failed(_) => "FAILED",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// The result of processing something for one repository.
pub trait Outcome: fmt::Display {
    fn status(&self) -> RepoStatus;
}

/// Result for a single list entry.
#[derive(Debug, Clone)]
pub struct RepoResult {
    /// Line of the list file the entry came from.
    pub line: usize,
    pub name: String,
    pub status: RepoStatus,
    /// What was done, when it succeeded.
    pub detail: Option<String>,
}

impl fmt::Display for RepoResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>9}  {}", self.status.marker(), self.name)?;
        match &self.status {
            RepoStatus::Skipped(reason) | RepoStatus::Failed(reason) => {
                write!(f, ": {}", reason)
            }
            RepoStatus::Success | RepoStatus::NoChanges => match &self.detail {
                Some(detail) => write!(f, ": {}", detail),
                None => Ok(()),
            },
        }
    }
}

/// Totals across a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    fn record(&mut self, status: &RepoStatus) {
        self.total += 1;
        match status {
            RepoStatus::Success => self.succeeded += 1,
            RepoStatus::NoChanges => self.unchanged += 1,
            RepoStatus::Skipped(_) => self.skipped += 1,
            RepoStatus::Failed(_) => self.failed += 1,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} repositories: {} ok, {} unchanged, {} skipped, {} failed",
            self.total, self.succeeded, self.unchanged, self.skipped, self.failed
        )
    }
}

/// Result of running over a repository list.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub results: Vec<RepoResult>,
    pub summary: BatchSummary,
}

/// Process every entry of `list` in order.
///
/// Invalid entries fail without calling `process`. Errors from `process`
/// fail their entry only. `on_result` sees each result as soon as it exists.
pub fn run_batch<O, P, R>(list: &RepoList, mut process: P, mut on_result: R) -> BatchResult
where
    O: Outcome,
    P: FnMut(&RepoName) -> Result<O>,
    R: FnMut(&RepoResult),
{
    let mut batch = BatchResult::default();

    for entry in list {
        let label = entry.label().to_string();
        let result = match entry {
            RepoListEntry::Valid { line, name } => match process(name) {
                Ok(outcome) => RepoResult {
                    line: *line,
                    name: label,
                    status: outcome.status(),
                    detail: Some(outcome.to_string()),
                },
                Err(e) => {
                    log::debug!("{} failed: {:?}", name, e);
                    RepoResult {
                        line: *line,
                        name: label,
                        status: RepoStatus::Failed(e.to_string()),
                        detail: None,
                    }
                }
            },
            RepoListEntry::Invalid { line, reason, .. } => RepoResult {
                line: *line,
                name: label,
                status: RepoStatus::Failed(format!("line {}: {}", line, reason)),
                detail: None,
            },
        };

        batch.summary.record(&result.status);
        on_result(&result);
        batch.results.push(result);
    }

    batch
}
