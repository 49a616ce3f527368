//! Mirror fetch and push.

use std::collections::BTreeSet;

use git2::{AutotagOption, ErrorCode, FetchOptions, FetchPrune, PushOptions, ReferenceType};

use super::GitOps;
use crate::error::{Result, ShuttleError};

/// Refspec mapping every ref onto itself, forced.
pub const MIRROR_REFSPEC: &str = "+refs/*:refs/*";

/// What `ensure_remote` had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteChange {
    Created,
    UrlUpdated,
    Unchanged,
}

/// The ref updates that make a remote match the local ref set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorPlan {
    /// Refs force-pushed to the same name.
    pub updates: Vec<String>,
    /// Remote branches and tags with no local counterpart.
    pub deletions: Vec<String>,
}

impl MirrorPlan {
    /// Compare local refs with the refs a remote advertises.
    ///
    /// With nothing local to mirror the plan is empty, so an empty source
    /// never clears the remote.
    pub fn new(local: &[String], remote: &[String]) -> Self {
        let local: BTreeSet<&str> = local
            .iter()
            .map(String::as_str)
            .filter(|name| is_mirrored_ref(name))
            .collect();
        if local.is_empty() {
            return Self::default();
        }

        let deletions = remote
            .iter()
            .map(String::as_str)
            .filter(|name| is_deletable_ref(name) && !local.contains(name))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(String::from)
            .collect();

        Self {
            updates: local.into_iter().map(String::from).collect(),
            deletions,
        }
    }

    /// Push refspecs for the plan.
    pub fn refspecs(&self) -> Vec<String> {
        self.updates
            .iter()
            .map(|name| format!("+{}:{}", name, name))
            .chain(self.deletions.iter().map(|name| format!(":{}", name)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.deletions.is_empty()
    }
}

/// Refs carried to the destination.
///
/// Remote-tracking refs stay local and `refs/pull/` is read-only on GitHub.
fn is_mirrored_ref(name: &str) -> bool {
    name.starts_with("refs/")
        && !name.starts_with("refs/remotes/")
        && !name.starts_with("refs/pull/")
}

fn is_deletable_ref(name: &str) -> bool {
    (name.starts_with("refs/heads/") || name.starts_with("refs/tags/")) && !name.ends_with("^{}")
}

/// Operations for keeping a mirror clone and its destination in sync.
pub trait MirrorOps {
    /// Fetch every ref from `origin`, pruning refs gone from the source.
    ///
    /// `origin` is pointed at `url` first if it has moved.
    fn fetch_origin(&self, url: &str) -> Result<()>;

    /// Make sure the remote `name` exists and points at `url`.
    fn ensure_remote(&self, name: &str, url: &str) -> Result<RemoteChange>;

    /// Names of the local refs a mirror push would send.
    fn local_refs(&self) -> Result<Vec<String>>;

    /// Names of the branches and tags the remote currently has.
    fn remote_refs(&self, name: &str) -> Result<Vec<String>>;

    /// Make the remote's refs match the local ones, like `git push --mirror`.
    fn push_mirror(&self, name: &str) -> Result<MirrorPlan>;
}

impl MirrorOps for GitOps {
    fn fetch_origin(&self, url: &str) -> Result<()> {
        let mut remote = match self.repo.find_remote("origin") {
            Ok(remote) if remote.url() == Some(url) => remote,
            Ok(_) => {
                self.repo.remote_set_url("origin", url)?;
                self.repo.find_remote("origin")?
            }
            Err(e) if e.code() == ErrorCode::NotFound => {
                self.repo.remote_with_fetch("origin", url, MIRROR_REFSPEC)?
            }
            Err(e) => return Err(e.into()),
        };

        let mut options = FetchOptions::new();
        options
            .remote_callbacks(self.remote_callbacks())
            .prune(FetchPrune::On)
            .download_tags(AutotagOption::All);

        remote
            .fetch(&[] as &[&str], Some(&mut options), None)
            .map_err(|e| ShuttleError::FetchError {
                message: e.message().to_string(),
            })
    }

    fn ensure_remote(&self, name: &str, url: &str) -> Result<RemoteChange> {
        match self.repo.find_remote(name) {
            Ok(remote) if remote.url() == Some(url) => Ok(RemoteChange::Unchanged),
            Ok(_) => {
                self.repo.remote_set_url(name, url)?;
                Ok(RemoteChange::UrlUpdated)
            }
            Err(e) if e.code() == ErrorCode::NotFound => {
                self.repo.remote(name, url)?;
                self.repo
                    .config()?
                    .set_bool(&format!("remote.{}.mirror", name), true)?;
                Ok(RemoteChange::Created)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn local_refs(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for reference in self.repo.references()? {
            let reference = reference?;
            if reference.kind() != Some(ReferenceType::Direct) {
                continue;
            }
            if let Some(name) = reference.name() {
                if is_mirrored_ref(name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn remote_refs(&self, name: &str) -> Result<Vec<String>> {
        // Branches and tags are fetched into a scratch namespace and read
        // back locally. git2's ref listing is unsound for a remote that
        // advertises nothing, which every new empty repository does.
        let scratch = format!("refs/remotes/{}/", name);
        let stale: Vec<String> = self
            .repo
            .references_glob(&format!("{}*", scratch))?
            .names()
            .filter_map(|name| name.ok().map(String::from))
            .collect();
        for stale in stale {
            self.repo.find_reference(&stale)?.delete()?;
        }

        let refspecs = [
            format!("+refs/heads/*:{}heads/*", scratch),
            format!("+refs/tags/*:{}tags/*", scratch),
        ];
        let mut options = FetchOptions::new();
        options
            .remote_callbacks(self.remote_callbacks())
            .download_tags(AutotagOption::None);

        let mut remote = self.repo.find_remote(name)?;
        remote.fetch(&refspecs, Some(&mut options), None)?;

        let mut names = Vec::new();
        for reference in self.repo.references_glob(&format!("{}*", scratch))? {
            let reference = reference?;
            if let Some(stripped) = reference.name().and_then(|n| n.strip_prefix(scratch.as_str())) {
                names.push(format!("refs/{}", stripped));
            }
        }
        names.sort();
        Ok(names)
    }

    fn push_mirror(&self, name: &str) -> Result<MirrorPlan> {
        let local = self.local_refs()?;
        if local.is_empty() {
            log::info!("No refs to mirror, leaving {} untouched", name);
            return Ok(MirrorPlan::default());
        }

        let remote = self
            .remote_refs(name)
            .map_err(|e| ShuttleError::PushError {
                message: format!("could not list refs on '{}': {}", name, e),
            })?;

        let plan = MirrorPlan::new(&local, &remote);
        let refspecs = plan.refspecs();
        log::debug!(
            "Pushing {} refs to {} ({} deletions)",
            plan.updates.len(),
            name,
            plan.deletions.len()
        );

        let mut rejected = Vec::new();
        {
            let mut callbacks = self.remote_callbacks();
            callbacks.push_update_reference(|refname, status| {
                if let Some(message) = status {
                    rejected.push(format!("{} ({})", refname, message));
                }
                Ok(())
            });

            let mut options = PushOptions::new();
            options.remote_callbacks(callbacks);

            let mut remote = self.repo.find_remote(name)?;
            remote
                .push(&refspecs, Some(&mut options))
                .map_err(|e| ShuttleError::PushError {
                    message: e.message().to_string(),
                })?;
        }

        if !rejected.is_empty() {
            return Err(ShuttleError::PushRejected {
                remote: name.to_string(),
                refs: rejected,
            });
        }

        Ok(plan)
    }
}
