//! Bulk creation of organization repositories.

use crate::config::{CreateConfig, Visibility};
use crate::error::{Result, ShuttleError};
use crate::github::{CreateAttempt, CreateRepoRequest, GitHubRepo, RepoOps};
use crate::repo_list::{RepoList, RepoName};
use crate::report::{BatchResult, Outcome, RepoResult, RepoStatus, run_batch};
use crate::retry::{Clock, SystemClock};
use std::fmt;

/// How an existing repository was brought in line with the desired
/// visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// It was public and has been made private.
    MadePrivate,
    /// It already had the desired visibility.
    AlreadyMatching(Visibility),
    /// Public was asked for but it is private. Never downgraded.
    KeptPrivate,
}

/// What happened for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created {
        visibility: Visibility,
        /// Attempts made, rate-limited ones included.
        attempts: u32,
    },
    Existing(Reconciliation),
}

impl Outcome for CreateOutcome {
    fn status(&self) -> RepoStatus {
        match self {
            Self::Created { .. } | Self::Existing(Reconciliation::MadePrivate) => {
                RepoStatus::Success
            }
            Self::Existing(Reconciliation::AlreadyMatching(_)) => RepoStatus::NoChanges,
            Self::Existing(Reconciliation::KeptPrivate) => {
                RepoStatus::Skipped("exists and is private; visibility is never downgraded".into())
            }
        }
    }
}

impl fmt::Display for CreateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created {
                visibility,
                attempts: 1,
            } => write!(f, "created ({})", visibility),
            Self::Created {
                visibility,
                attempts,
            } => write!(f, "created ({}) after {} attempts", visibility, attempts),
            Self::Existing(Reconciliation::MadePrivate) => {
                f.write_str("already existed, changed to private")
            }
            Self::Existing(Reconciliation::AlreadyMatching(visibility)) => {
                write!(f, "already exists and is {}", visibility)
            }
            Self::Existing(Reconciliation::KeptPrivate) => f.write_str("already exists and is private"),
        }
    }
}

/// Ensures repositories exist in an organization with the desired visibility.
pub struct RepoCreator<'a, A, C = SystemClock> {
    api: &'a A,
    config: CreateConfig,
    clock: C,
}

impl<'a, A: RepoOps> RepoCreator<'a, A, SystemClock> {
    pub fn new(api: &'a A, config: CreateConfig) -> Self {
        Self {
            api,
            config,
            clock: SystemClock,
        }
    }
}

impl<'a, A: RepoOps, C: Clock> RepoCreator<'a, A, C> {
    /// Use a different clock for rate limit waits.
    pub fn with_clock<D: Clock>(self, clock: D) -> RepoCreator<'a, A, D> {
        RepoCreator {
            api: self.api,
            config: self.config,
            clock,
        }
    }

    pub fn config(&self) -> &CreateConfig {
        &self.config
    }

    /// Create `name`, or reconcile it if it already exists.
    ///
    /// Secondary rate limits are waited out and the identical request is
    /// sent again, within the configured retry policy.
    pub fn ensure_repo(&self, name: &RepoName) -> Result<CreateOutcome> {
        let org = &self.config.org;
        let request = CreateRepoRequest::new(name.as_str(), self.config.visibility.is_private());
        let mut backoff = self.config.retry.start();

        loop {
            backoff.begin_attempt();
            log::debug!("Creating {}/{} (attempt {})", org, name, backoff.attempts());

            match self.api.create_org_repo(org, &request)? {
                CreateAttempt::Created(_) => {
                    log::info!("Created repository {}/{}", org, name);
                    return Ok(CreateOutcome::Created {
                        visibility: self.config.visibility,
                        attempts: backoff.attempts(),
                    });
                }
                CreateAttempt::NameExists => {
                    log::info!("Repository {}/{} already exists", org, name);
                    return self.reconcile(name).map(CreateOutcome::Existing);
                }
                CreateAttempt::RateLimited(window) => {
                    let wait = window.wait_from(self.clock.now(), self.config.retry.default_wait);
                    log::warn!(
                        "Rate limit exceeded. Retrying after {:.2} minutes...",
                        wait.as_secs_f64() / 60.0
                    );
                    backoff.wait(&self.clock, wait)?;
                }
                CreateAttempt::Rejected { status, message } => {
                    return Err(ShuttleError::GitHub { status, message });
                }
            }
        }
    }

    fn reconcile(&self, name: &RepoName) -> Result<Reconciliation> {
        let org = &self.config.org;
        let existing: GitHubRepo = self.api.get_repo(org, name.as_str())?;

        match (self.config.visibility, existing.is_private) {
            (Visibility::Private, false) => {
                log::info!("Repository {}/{} is public. Changing to private...", org, name);
                self.api.set_private(org, name.as_str(), true)?;
                Ok(Reconciliation::MadePrivate)
            }
            (Visibility::Private, true) => Ok(Reconciliation::AlreadyMatching(Visibility::Private)),
            (Visibility::Public, false) => Ok(Reconciliation::AlreadyMatching(Visibility::Public)),
            (Visibility::Public, true) => Ok(Reconciliation::KeptPrivate),
        }
    }

    /// Process every entry of a list, in order.
    pub fn run(&self, list: &RepoList, on_result: impl FnMut(&RepoResult)) -> BatchResult {
        run_batch(list, |name| self.ensure_repo(name), on_result)
    }
}
