//! GitHub repository operations.

use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::github::client::ApiResponse;
use crate::github::{GitHubClient, RateLimitWindow, is_secondary_rate_limit};

/// Repository information from GitHub API.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRepo {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub ssh_url: Option<String>,
    /// A missing flag is read as private so it is never "fixed" blindly.
    #[serde(rename = "private", default = "default_private")]
    pub is_private: bool,
}

fn default_private() -> bool {
    true
}

/// Request body for creating a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateRepoRequest {
    pub name: String,
    pub private: bool,
}

impl CreateRepoRequest {
    pub fn new(name: impl Into<String>, private: bool) -> Self {
        Self {
            name: name.into(),
            private,
        }
    }
}

#[derive(Debug, Serialize)]
struct UpdateVisibility {
    private: bool,
}

/// How GitHub answered a single create request.
#[derive(Debug, Clone)]
pub enum CreateAttempt {
    /// The repository was created (201). The body is `None` when it could
    /// not be read as a repository.
    Created(Option<GitHubRepo>),
    /// The name is already taken in the organization (422 "already exists").
    NameExists,
    /// The secondary rate limit was hit; retry after the window.
    RateLimited(RateLimitWindow),
    /// Any other answer. Not retried.
    Rejected { status: u16, message: String },
}

impl CreateAttempt {
    /// Classify a raw create response.
    pub fn from_response(response: ApiResponse) -> Result<Self> {
        let status = response.status;

        if status == StatusCode::CREATED {
            return Ok(Self::Created(match response.json() {
                Ok(repo) => Some(repo),
                Err(e) => {
                    log::debug!("Created, but the response body was unreadable: {}", e);
                    None
                }
            }));
        }

        if status == StatusCode::UNPROCESSABLE_ENTITY
            && response
                .first_error_message()
                .is_some_and(|m| m.contains("already exists"))
        {
            return Ok(Self::NameExists);
        }

        if is_secondary_rate_limit(status, response.message()) {
            return Ok(Self::RateLimited(response.rate_limit));
        }

        Ok(Self::Rejected {
            status: status.as_u16(),
            message: response.describe(),
        })
    }
}

/// Repository creation and update operations.
pub trait RepoOps {
    /// Issue one create request for a repository in an organization.
    fn create_org_repo(&self, org: &str, request: &CreateRepoRequest) -> Result<CreateAttempt>;

    /// Get a specific repository.
    fn get_repo(&self, owner: &str, name: &str) -> Result<GitHubRepo>;

    /// Change whether a repository is private.
    fn set_private(&self, owner: &str, name: &str, private: bool) -> Result<GitHubRepo>;
}

impl RepoOps for GitHubClient {
    fn create_org_repo(&self, org: &str, request: &CreateRepoRequest) -> Result<CreateAttempt> {
        let endpoint = format!("/orgs/{}/repos", org);
        let response = self.send(Method::POST, &endpoint, Some(request))?;
        CreateAttempt::from_response(response)
    }

    fn get_repo(&self, owner: &str, name: &str) -> Result<GitHubRepo> {
        let endpoint = format!("/repos/{}/{}", owner, name);
        let response = self.send(Method::GET, &endpoint, None::<&()>)?;

        if response.status != StatusCode::OK {
            return Err(response.into_error());
        }
        response.json()
    }

    fn set_private(&self, owner: &str, name: &str, private: bool) -> Result<GitHubRepo> {
        let endpoint = format!("/repos/{}/{}", owner, name);
        let body = UpdateVisibility { private };
        let response = self.send(Method::PATCH, &endpoint, Some(&body))?;

        if response.status != StatusCode::OK {
            return Err(response.into_error());
        }
        response.json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn response(status: u16, body: Value) -> ApiResponse {
        ApiResponse {
            status: StatusCode::from_u16(status).unwrap(),
            rate_limit: RateLimitWindow::default(),
            body,
        }
    }

    #[test]
    fn test_created() {
        let attempt = CreateAttempt::from_response(response(
            201,
            json!({"id": 7, "name": "alpha", "full_name": "acme/alpha", "private": true}),
        ))
        .unwrap();

        match attempt {
            CreateAttempt::Created(Some(repo)) => {
                assert_eq!(repo.full_name, "acme/alpha");
                assert!(repo.is_private);
            }
            other => panic!("unexpected attempt: {:?}", other),
        }
    }

    #[test]
    fn test_created_with_unreadable_body_is_still_created() {
        let attempt = CreateAttempt::from_response(response(201, json!({"unexpected": 1}))).unwrap();
        assert!(matches!(attempt, CreateAttempt::Created(None)));

        let empty = CreateAttempt::from_response(response(201, Value::Null)).unwrap();
        assert!(matches!(empty, CreateAttempt::Created(None)));
    }

    #[test]
    fn test_name_exists() {
        let attempt = CreateAttempt::from_response(response(
            422,
            json!({
                "message": "Repository creation failed.",
                "errors": [{"resource": "Repository", "code": "custom", "field": "name",
                            "message": "name already exists on this account"}]
            }),
        ))
        .unwrap();

        assert!(matches!(attempt, CreateAttempt::NameExists));
    }

    #[test]
    fn test_other_validation_failure_is_rejected() {
        let attempt = CreateAttempt::from_response(response(
            422,
            json!({
                "message": "Repository creation failed.",
                "errors": [{"message": "name is invalid"}]
            }),
        ))
        .unwrap();

        match attempt {
            CreateAttempt::Rejected { status, message } => {
                assert_eq!(status, 422);
                assert!(message.contains("name is invalid"));
            }
            other => panic!("unexpected attempt: {:?}", other),
        }
    }

    #[test]
    fn test_secondary_rate_limit() {
        let attempt = CreateAttempt::from_response(response(
            403,
            json!({"message": "You have exceeded a secondary rate limit and have been temporarily blocked from content creation."}),
        ))
        .unwrap();

        assert!(matches!(attempt, CreateAttempt::RateLimited(_)));
    }

    #[test]
    fn test_plain_forbidden_is_rejected() {
        let attempt = CreateAttempt::from_response(response(
            403,
            json!({"message": "Must have admin rights to Repository."}),
        ))
        .unwrap();

        assert!(matches!(attempt, CreateAttempt::Rejected { status: 403, .. }));
    }

    #[test]
    fn test_missing_private_flag_reads_as_private() {
        let repo: GitHubRepo = serde_json::from_value(json!({"name": "x"})).unwrap();
        assert!(repo.is_private);
    }

    #[test]
    fn test_create_request_body() {
        let body = serde_json::to_value(CreateRepoRequest::new("alpha", false)).unwrap();
        assert_eq!(body, json!({"name": "alpha", "private": false}));
    }
}
