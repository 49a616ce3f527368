//! Repository list files: one repository name per line.
//!
//! Every line is trimmed before use and blank lines are skipped. Lines that
//! do not form a valid repository name are kept as [`RepoListEntry::Invalid`]
//! so a batch can report them without touching the network.

use crate::error::{Result, ShuttleError};
use regex::Regex;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

/// GitHub and GitLab both cap repository names well below this.
const MAX_NAME_LEN: usize = 100;

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("static regex is valid"));

/// A validated repository name.
///
/// Safe to interpolate into clone URLs, API paths and workspace paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoName(String);

impl RepoName {
    /// Validate a repository name. Surrounding whitespace is trimmed first.
    pub fn new(raw: &str) -> Result<Self> {
        let name = raw.trim();
        let invalid = |reason: &str| ShuttleError::InvalidRepoName {
            name: raw.to_string(),
            reason: reason.to_string(),
        };

        if name.is_empty() {
            return Err(invalid("name is empty"));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(invalid("name is longer than 100 characters"));
        }
        if name == "." || name == ".." {
            return Err(invalid("name is a relative path component"));
        }
        if !NAME_PATTERN.is_match(name) {
            return Err(invalid(
                "only ASCII letters, digits, '.', '-' and '_' are allowed",
            ));
        }

        Ok(Self(name.to_string()))
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RepoName {
    type Err = ShuttleError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RepoName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A single non-blank line of a repository list.
#[derive(Debug, Clone, PartialEq)]
pub enum RepoListEntry {
    /// A usable repository name.
    Valid { line: usize, name: RepoName },
    /// A line that could not be turned into a repository name.
    Invalid {
        line: usize,
        raw: String,
        reason: String,
    },
}

impl RepoListEntry {
    /// The 1-based line number the entry came from.
    pub fn line(&self) -> usize {
        match self {
            Self::Valid { line, .. } | Self::Invalid { line, .. } => *line,
        }
    }

    /// The text used to identify the entry in reports.
    pub fn label(&self) -> &str {
        match self {
            Self::Valid { name, .. } => name.as_str(),
            Self::Invalid { raw, .. } => raw,
        }
    }
}

/// A parsed repository list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepoList {
    entries: Vec<RepoListEntry>,
}

impl RepoList {
    /// Parse list contents. Blank and whitespace-only lines produce no entry.
    pub fn parse(contents: &str) -> Self {
        let entries = contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| match RepoName::new(line) {
                Ok(name) => RepoListEntry::Valid {
                    line: index + 1,
                    name,
                },
                Err(ShuttleError::InvalidRepoName { reason, .. }) => RepoListEntry::Invalid {
                    line: index + 1,
                    raw: line.trim().to_string(),
                    reason,
                },
                Err(other) => RepoListEntry::Invalid {
                    line: index + 1,
                    raw: line.trim().to_string(),
                    reason: other.to_string(),
                },
            })
            .collect();

        Self { entries }
    }

    /// Read and parse a list file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::parse(&contents))
    }

    /// All entries in file order.
    pub fn entries(&self) -> &[RepoListEntry] {
        &self.entries
    }

    /// Number of non-blank lines.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list has no non-blank lines.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of the valid entries, in order.
    pub fn valid_names(&self) -> impl Iterator<Item = &RepoName> {
        self.entries.iter().filter_map(|entry| match entry {
            RepoListEntry::Valid { name, .. } => Some(name),
            RepoListEntry::Invalid { .. } => None,
        })
    }
}

impl<'a> IntoIterator for &'a RepoList {
    type Item = &'a RepoListEntry;
    type IntoIter = std::slice::Iter<'a, RepoListEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
