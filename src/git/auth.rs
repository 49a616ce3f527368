//! Git authentication configuration.

use git2::{Cred, CredentialType, RemoteCallbacks};
use std::path::PathBuf;

/// Credential prompts answered before giving up on a remote.
const MAX_CREDENTIAL_ATTEMPTS: u32 = 3;

/// Authentication method for git remote operations.
#[derive(Debug, Clone, Default)]
pub enum GitAuth {
    /// SSH key authentication.
    SshKey {
        private_key_path: PathBuf,
        passphrase: Option<String>,
    },
    /// Token-based authentication (for HTTPS).
    Token(String),
    /// Keys held by the running SSH agent.
    #[default]
    SshAgent,
}

impl GitAuth {
    /// Create SSH key auth with a specific key path.
    pub fn ssh_key(path: impl Into<PathBuf>) -> Self {
        Self::SshKey {
            private_key_path: path.into(),
            passphrase: None,
        }
    }

    /// Create token-based auth (typically for GitHub/GitLab HTTPS URLs).
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(token.into())
    }

    /// Set passphrase for SSH key auth.
    pub fn with_passphrase(self, passphrase: impl Into<String>) -> Self {
        match self {
            Self::SshKey {
                private_key_path, ..
            } => Self::SshKey {
                private_key_path,
                passphrase: Some(passphrase.into()),
            },
            other => other,
        }
    }

    /// Install a credentials callback using this method.
    ///
    /// libgit2 keeps asking while credentials are rejected, so the callback
    /// fails after a few attempts.
    pub(crate) fn install(&self, callbacks: &mut RemoteCallbacks<'_>) {
        let auth = self.clone();
        let mut attempts = 0;

        callbacks.credentials(move |_url, username_from_url, allowed_types| {
            attempts += 1;
            if attempts > MAX_CREDENTIAL_ATTEMPTS {
                return Err(git2::Error::from_str("credentials rejected by the remote"));
            }

            let username = username_from_url.unwrap_or("git");
            match &auth {
                GitAuth::SshKey {
                    private_key_path,
                    passphrase,
                } => Cred::ssh_key(username, None, private_key_path, passphrase.as_deref()),
                GitAuth::Token(token) => Cred::userpass_plaintext(token, ""),
                GitAuth::SshAgent => {
                    if allowed_types.contains(CredentialType::SSH_KEY) {
                        Cred::ssh_key_from_agent(username)
                    } else {
                        Cred::default()
                    }
                }
            }
        });
    }
}
