//! Configuration for the migrator and the creator.

use crate::error::{Result, ShuttleError};
use crate::git::GitAuth;
use crate::repo_list::RepoName;
use crate::retry::RetryPolicy;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default template for the repository being mirrored from.
pub const DEFAULT_SOURCE_TEMPLATE: &str = "git@gitlab.com:{org}/{repo}.git";

/// Default template for the repository being mirrored to.
pub const DEFAULT_DESTINATION_TEMPLATE: &str = "git@github.com:{org}/{repo}.git";

/// Default name of the remote registered for the destination.
pub const DEFAULT_REMOTE_NAME: &str = "destination";

/// Desired repository visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Private,
    Public,
}

impl Visibility {
    /// Whether this is [`Visibility::Private`].
    pub fn is_private(self) -> bool {
        matches!(self, Self::Private)
    }
}

impl FromStr for Visibility {
    type Err = ShuttleError;

    /// Accepts `true`, `yes`, `1`, `private` and `false`, `no`, `0`, `public`,
    /// ignoring case. Anything else is rejected.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" | "private" => Ok(Self::Private),
            "false" | "no" | "0" | "public" => Ok(Self::Public),
            _ => Err(ShuttleError::InvalidVisibility(s.to_string())),
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Private => f.write_str("private"),
            Self::Public => f.write_str("public"),
        }
    }
}

/// A remote URL pattern with `{org}` and `{repo}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    /// Create a template. It must mention `{repo}`.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if !template.contains("{repo}") {
            return Err(ShuttleError::InvalidTemplate {
                template,
                reason: "missing the {repo} placeholder".into(),
            });
        }
        if template.chars().any(char::is_whitespace) {
            return Err(ShuttleError::InvalidTemplate {
                template,
                reason: "contains whitespace".into(),
            });
        }
        Ok(Self(template))
    }

    /// Expand the template for an organization and repository.
    pub fn render(&self, org: &str, repo: &RepoName) -> String {
        self.0.replace("{org}", org).replace("{repo}", repo.as_str())
    }

    /// The raw template text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for UrlTemplate {
    type Err = ShuttleError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Settings for a mirror migration batch.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Organization or user owning the source repositories.
    pub source_org: String,
    /// Organization or user receiving the mirrors.
    pub destination_org: String,
    /// Directory holding the local mirror clones.
    pub workdir: PathBuf,
    pub source_template: UrlTemplate,
    pub destination_template: UrlTemplate,
    /// Name of the remote registered for the destination.
    pub remote_name: String,
    pub auth: GitAuth,
}

impl MirrorConfig {
    /// Create a configuration with the default templates, working in the
    /// current directory.
    pub fn new(source_org: impl Into<String>, destination_org: impl Into<String>) -> Self {
        Self {
            source_org: source_org.into(),
            destination_org: destination_org.into(),
            workdir: PathBuf::from("."),
            source_template: UrlTemplate(DEFAULT_SOURCE_TEMPLATE.into()),
            destination_template: UrlTemplate(DEFAULT_DESTINATION_TEMPLATE.into()),
            remote_name: DEFAULT_REMOTE_NAME.into(),
            auth: GitAuth::default(),
        }
    }

    /// Sets the directory holding mirror clones.
    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = dir.into();
        self
    }

    /// Sets the source URL template.
    pub fn source_template(mut self, template: UrlTemplate) -> Self {
        self.source_template = template;
        self
    }

    /// Sets the destination URL template.
    pub fn destination_template(mut self, template: UrlTemplate) -> Self {
        self.destination_template = template;
        self
    }

    /// Sets the destination remote name.
    pub fn remote_name(mut self, name: impl Into<String>) -> Self {
        self.remote_name = name.into();
        self
    }

    /// Sets the authentication used for fetch and push.
    pub fn auth(mut self, auth: GitAuth) -> Self {
        self.auth = auth;
        self
    }

    /// Check the settings that cannot be enforced by construction.
    pub fn validate(&self) -> Result<()> {
        for (what, org) in [
            ("source", &self.source_org),
            ("destination", &self.destination_org),
        ] {
            if !is_valid_org(org) {
                return Err(ShuttleError::InvalidConfig(format!(
                    "invalid {} organization: {:?}",
                    what, org
                )));
            }
        }

        if self.remote_name == "origin" {
            return Err(ShuttleError::InvalidConfig(
                "the destination remote cannot be named 'origin'".into(),
            ));
        }
        git2::Remote::is_valid_name(&self.remote_name)
            .then_some(())
            .ok_or_else(|| {
                ShuttleError::InvalidConfig(format!(
                    "invalid remote name: {:?}",
                    self.remote_name
                ))
            })
    }

    /// Where the mirror clone of `repo` lives.
    ///
    /// Keyed by source organization so same-named repositories from
    /// different organizations never share a directory.
    pub fn workspace_path(&self, repo: &RepoName) -> PathBuf {
        workspace_path(&self.workdir, &self.source_org, repo)
    }

    pub fn source_url(&self, repo: &RepoName) -> String {
        self.source_template.render(&self.source_org, repo)
    }

    pub fn destination_url(&self, repo: &RepoName) -> String {
        self.destination_template.render(&self.destination_org, repo)
    }
}

/// Organization names become a path segment in both workspaces and URLs.
fn is_valid_org(org: &str) -> bool {
    !org.trim().is_empty() && !org.contains(['/', '\\']) && org != "." && org != ".."
}

fn workspace_path(workdir: &Path, org: &str, repo: &RepoName) -> PathBuf {
    workdir.join(org).join(format!("{}.git", repo))
}

/// Settings for a bulk creation batch.
#[derive(Debug, Clone)]
pub struct CreateConfig {
    /// Organization the repositories are created in.
    pub org: String,
    pub visibility: Visibility,
    pub retry: RetryPolicy,
}

impl CreateConfig {
    /// Create a configuration with the default retry policy.
    pub fn new(org: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            org: org.into(),
            visibility,
            retry: RetryPolicy::default(),
        }
    }

    /// Sets the retry policy.
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Check the organization name.
    pub fn validate(&self) -> Result<()> {
        if !is_valid_org(&self.org) || self.org.contains(['?', '#']) {
            return Err(ShuttleError::InvalidConfig(format!(
                "invalid organization: {:?}",
                self.org
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(name: &str) -> RepoName {
        RepoName::new(name).unwrap()
    }

    #[test]
    fn test_visibility_literals() {
        for s in ["true", "TRUE", "yes", "1", "private", " Private "] {
            assert_eq!(s.parse::<Visibility>().unwrap(), Visibility::Private, "{}", s);
        }
        for s in ["false", "No", "0", "public"] {
            assert_eq!(s.parse::<Visibility>().unwrap(), Visibility::Public, "{}", s);
        }
    }

    #[test]
    fn test_visibility_rejects_other_strings() {
        for s in ["", "y", "2", "off-ish", "privat"] {
            let err = s.parse::<Visibility>().unwrap_err();
            assert!(matches!(err, ShuttleError::InvalidVisibility(_)));
        }
    }

    #[test]
    fn test_default_urls() {
        let config = MirrorConfig::new("lab-org", "hub-org");
        let name = repo("widget");

        assert_eq!(config.source_url(&name), "git@gitlab.com:lab-org/widget.git");
        assert_eq!(
            config.destination_url(&name),
            "git@github.com:hub-org/widget.git"
        );
    }

    #[test]
    fn test_custom_template() {
        let template = UrlTemplate::new("https://git.example.com/{org}/{repo}").unwrap();
        assert_eq!(
            template.render("team", &repo("api")),
            "https://git.example.com/team/api"
        );
    }

    #[test]
    fn test_template_requires_repo_placeholder() {
        assert!(UrlTemplate::new("git@github.com:{org}/fixed.git").is_err());
        assert!(UrlTemplate::new("git@host:{org}/{repo} .git").is_err());
    }

    #[test]
    fn test_workspace_path_is_keyed_by_source_org() {
        let a = MirrorConfig::new("org-a", "dest").workdir("/work");
        let b = MirrorConfig::new("org-b", "dest").workdir("/work");
        let name = repo("shared");

        assert_eq!(a.workspace_path(&name), PathBuf::from("/work/org-a/shared.git"));
        assert_ne!(a.workspace_path(&name), b.workspace_path(&name));
    }

    #[test]
    fn test_mirror_config_validation() {
        assert!(MirrorConfig::new("src", "dst").validate().is_ok());
        assert!(MirrorConfig::new("", "dst").validate().is_err());
        assert!(MirrorConfig::new("a/b", "dst").validate().is_err());
        assert!(MirrorConfig::new(".", "dst").validate().is_err());
        assert!(MirrorConfig::new("..", "dst").validate().is_err());
        assert!(MirrorConfig::new("src", ".").validate().is_err());
        assert!(MirrorConfig::new(".github", "dst").validate().is_ok());
        assert!(MirrorConfig::new("src", "dst").remote_name("origin").validate().is_err());
        assert!(MirrorConfig::new("src", "dst").remote_name("bad name").validate().is_err());
    }

    #[test]
    fn test_create_config_validation() {
        assert!(CreateConfig::new("acme", Visibility::Private).validate().is_ok());
        assert!(CreateConfig::new(" ", Visibility::Private).validate().is_err());
        assert!(CreateConfig::new("acme/x", Visibility::Public).validate().is_err());
        assert!(CreateConfig::new(".", Visibility::Public).validate().is_err());
        assert!(CreateConfig::new("..", Visibility::Public).validate().is_err());
    }
}
