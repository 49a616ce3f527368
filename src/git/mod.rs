//! Git operations for mirror clones.
//!
//! Wraps git2 with the handful of operations a mirror migration needs:
//! - Mirror-cloning a repository into a bare workspace
//! - Fetching all refs from the source with pruning
//! - Registering the destination remote idempotently
//! - Pushing the complete ref namespace, deletions included
//!
//! # Example
//!
//! ```rust,no_run
//! use repo_shuttle::git::{GitAuth, GitOps, MirrorOps};
//!
//! let git = GitOps::clone_mirror(
//!     "git@gitlab.com:team/widgets.git",
//!     "./work/team/widgets.git",
//!     GitAuth::default(),
//! )?;
//!
//! git.ensure_remote("destination", "git@github.com:team/widgets.git")?;
//! git.push_mirror("destination")?;
//! # Ok::<(), repo_shuttle::error::ShuttleError>(())
//! ```

mod auth;
mod mirror;

pub use auth::GitAuth;
pub use mirror::{MIRROR_REFSPEC, MirrorOps, MirrorPlan, RemoteChange};

use crate::error::{Result, ShuttleError};
use git2::{ErrorCode, RemoteCallbacks, Repository};
use std::path::Path;

/// Git operations wrapper around a local mirror clone.
pub struct GitOps {
    repo: Repository,
    auth: GitAuth,
}

impl GitOps {
    /// Open an existing repository.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::open(path).map_err(|e| match e.code() {
            ErrorCode::NotFound => ShuttleError::NotARepository(path.to_path_buf()),
            _ => ShuttleError::Git(e),
        })?;
        Ok(Self {
            repo,
            auth: GitAuth::default(),
        })
    }

    /// Mirror-clone `url` into a new bare repository at `path`.
    ///
    /// Equivalent to `git clone --mirror`: every ref under `refs/` is copied
    /// to the same name and later fetches keep it that way. A failed clone
    /// leaves nothing behind at `path`, and an existing `path` is refused.
    pub fn clone_mirror(url: &str, path: impl AsRef<Path>, auth: GitAuth) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Err(ShuttleError::CloneError {
                url: url.to_string(),
                message: format!("{} already exists", path.display()),
            });
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        match Self::init_mirror(url, path, auth) {
            Ok(git) => {
                git.follow_default_branch();
                Ok(git)
            }
            Err(e) => {
                if let Err(cleanup) = std::fs::remove_dir_all(path) {
                    if cleanup.kind() != std::io::ErrorKind::NotFound {
                        log::warn!("Could not remove {}: {}", path.display(), cleanup);
                    }
                }
                Err(match e {
                    ShuttleError::FetchError { message } => ShuttleError::CloneError {
                        url: url.to_string(),
                        message,
                    },
                    other => other,
                })
            }
        }
    }

    fn init_mirror(url: &str, path: &Path, auth: GitAuth) -> Result<Self> {
        let repo = Repository::init_bare(path)?;
        repo.remote_with_fetch("origin", url, MIRROR_REFSPEC)?;
        repo.config()?.set_bool("remote.origin.mirror", true)?;

        let git = Self { repo, auth };
        git.fetch_origin(url)?;
        Ok(git)
    }

    /// Point HEAD at `main` or `master` when the mirror has one.
    fn follow_default_branch(&self) {
        let head = ["refs/heads/main", "refs/heads/master"]
            .into_iter()
            .find(|name| self.repo.find_reference(name).is_ok());

        if let Some(head) = head {
            if let Err(e) = self.repo.set_head(head) {
                log::debug!("Could not set HEAD to {}: {}", head, e);
            }
        }
    }

    /// Set authentication method for remote operations.
    pub fn with_auth(mut self, auth: GitAuth) -> Self {
        self.auth = auth;
        self
    }

    /// Location of the repository on disk.
    pub fn path(&self) -> &Path {
        self.repo.path()
    }

    /// Callbacks carrying this repository's credentials.
    pub(crate) fn remote_callbacks<'cb>(&self) -> RemoteCallbacks<'cb> {
        let mut callbacks = RemoteCallbacks::new();
        self.auth.install(&mut callbacks);
        callbacks
    }
}
