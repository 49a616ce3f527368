//! Mirror migration of repositories between hosts.

use crate::config::MirrorConfig;
use crate::error::Result;
use crate::git::{GitAuth, GitOps, MirrorOps, MirrorPlan, RemoteChange};
use crate::repo_list::{RepoList, RepoName};
use crate::report::{BatchResult, Outcome, RepoResult, RepoStatus, run_batch};
use std::fmt;
use std::path::Path;

/// The git operations a migration is made of.
pub trait MirrorBackend {
    /// Mirror-clone `url` into a new repository at `path`.
    fn clone_mirror(&self, url: &str, path: &Path) -> Result<()>;

    /// Refresh the existing mirror at `path` from `url`.
    fn fetch_mirror(&self, path: &Path, url: &str) -> Result<()>;

    /// Get-or-create the remote `name` pointing at `url`.
    fn ensure_remote(&self, path: &Path, name: &str, url: &str) -> Result<RemoteChange>;

    /// Mirror-push everything to the remote `name`.
    fn push_mirror(&self, path: &Path, name: &str) -> Result<MirrorPlan>;
}

/// [`MirrorBackend`] on top of git2.
#[derive(Debug, Clone, Default)]
pub struct GitBackend {
    auth: GitAuth,
}

impl GitBackend {
    pub fn new(auth: GitAuth) -> Self {
        Self { auth }
    }

    fn open(&self, path: &Path) -> Result<GitOps> {
        Ok(GitOps::open(path)?.with_auth(self.auth.clone()))
    }
}

impl MirrorBackend for GitBackend {
    fn clone_mirror(&self, url: &str, path: &Path) -> Result<()> {
        let git = GitOps::clone_mirror(url, path, self.auth.clone())?;
        log::debug!("Mirror clone of {} at {}", url, git.path().display());
        Ok(())
    }

    fn fetch_mirror(&self, path: &Path, url: &str) -> Result<()> {
        self.open(path)?.fetch_origin(url)
    }

    fn ensure_remote(&self, path: &Path, name: &str, url: &str) -> Result<RemoteChange> {
        self.open(path)?.ensure_remote(name, url)
    }

    fn push_mirror(&self, path: &Path, name: &str) -> Result<MirrorPlan> {
        self.open(path)?.push_mirror(name)
    }
}

/// What a migration did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOutcome {
    /// Whether a fresh clone was made (otherwise the mirror was fetched).
    pub cloned: bool,
    pub remote: RemoteChange,
    pub plan: MirrorPlan,
}

impl Outcome for MigrationOutcome {
    fn status(&self) -> RepoStatus {
        if self.plan.updates.is_empty() {
            RepoStatus::Skipped("source has no refs to push".into())
        } else {
            RepoStatus::Success
        }
    }
}

impl fmt::Display for MigrationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.cloned { "cloned" } else { "fetched" })?;
        match self.remote {
            RemoteChange::Created => f.write_str(", remote added")?,
            RemoteChange::UrlUpdated => f.write_str(", remote URL updated")?,
            RemoteChange::Unchanged => {}
        }
        write!(f, ", {} refs pushed", self.plan.updates.len())?;
        if !self.plan.deletions.is_empty() {
            write!(f, ", {} deleted", self.plan.deletions.len())?;
        }
        Ok(())
    }
}

/// Mirrors repositories from the source organization to the destination.
pub struct Migrator<B = GitBackend> {
    config: MirrorConfig,
    backend: B,
}

impl Migrator<GitBackend> {
    /// Create a migrator using git2 with the configured authentication.
    pub fn new(config: MirrorConfig) -> Self {
        let backend = GitBackend::new(config.auth.clone());
        Self { config, backend }
    }
}

impl<B: MirrorBackend> Migrator<B> {
    /// Create a migrator with a specific backend.
    pub fn with_backend(config: MirrorConfig, backend: B) -> Self {
        Self { config, backend }
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// Migrate a single repository.
    ///
    /// Clones into the workspace on the first run and fetches on later ones,
    /// then registers the destination remote and mirror-pushes to it.
    pub fn migrate(&self, name: &RepoName) -> Result<MigrationOutcome> {
        let path = self.config.workspace_path(name);
        let source = self.config.source_url(name);
        let destination = self.config.destination_url(name);

        log::info!("Migrating {}", name);
        let cloned = if path.exists() {
            log::info!("{} already exists, fetching from {}", path.display(), source);
            self.backend.fetch_mirror(&path, &source)?;
            false
        } else {
            log::info!("Cloning {} into {}", source, path.display());
            self.backend.clone_mirror(&source, &path)?;
            true
        };

        let remote = self
            .backend
            .ensure_remote(&path, &self.config.remote_name, &destination)?;
        match remote {
            RemoteChange::Created => log::info!("Added remote {} -> {}", self.config.remote_name, destination),
            RemoteChange::UrlUpdated => {
                log::info!("Pointed remote {} at {}", self.config.remote_name, destination)
            }
            RemoteChange::Unchanged => log::debug!("Remote {} already set", self.config.remote_name),
        }

        log::info!("Pushing to {}", destination);
        let plan = self.backend.push_mirror(&path, &self.config.remote_name)?;

        Ok(MigrationOutcome {
            cloned,
            remote,
            plan,
        })
    }

    /// Migrate every entry of a list, in order.
    pub fn run(&self, list: &RepoList, on_result: impl FnMut(&RepoResult)) -> BatchResult {
        run_batch(list, |name| self.migrate(name), on_result)
    }
}
