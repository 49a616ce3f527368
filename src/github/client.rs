//! GitHub API client.

use reqwest::Method;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::{Result, ShuttleError};
use crate::github::RateLimitWindow;

/// Public GitHub API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Client for interacting with the GitHub API.
#[derive(Clone)]
pub struct GitHubClient {
    pub(crate) token: String,
    pub(crate) base_url: String,
    pub(crate) client: Client,
}

impl GitHubClient {
    /// Create a new GitHub client with the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: DEFAULT_API_URL.into(),
            client: Client::new(),
        }
    }

    /// Create a client for GitHub Enterprise (or any compatible server) with a
    /// custom base URL.
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let mut url = base_url.into();
        let parsed = Url::parse(&url).map_err(|e| {
            ShuttleError::InvalidConfig(format!("invalid API URL {:?}: {}", url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ShuttleError::InvalidConfig(format!(
                "API URL must use http or https: {:?}",
                url
            )));
        }

        // Remove trailing slash if present
        while url.ends_with('/') {
            url.pop();
        }

        Ok(Self {
            token: token.into(),
            base_url: url,
            client: Client::new(),
        })
    }

    /// Create a client using the GITHUB_TOKEN environment variable.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("GITHUB_TOKEN").map_err(|_| {
            ShuttleError::InvalidConfig("GITHUB_TOKEN environment variable not set".into())
        })?;
        Ok(Self::new(token))
    }

    /// Get the default headers for API requests.
    pub(crate) fn headers(&self) -> Result<HeaderMap> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", self.token)).map_err(|_| {
            ShuttleError::InvalidConfig("token contains characters not allowed in a header".into())
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("repo-shuttle"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Send a request and hand back the response whatever its status.
    ///
    /// Only transport failures are errors here; callers decide what each
    /// status code means.
    pub(crate) fn send<B: Serialize>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url, endpoint);
        log::debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method, &url)
            .headers(self.headers()?);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send()?;
        let status = response.status();
        let rate_limit = RateLimitWindow::from_headers(response.headers());
        let text = response.text()?;
        log::trace!("Response {} ({} bytes)", status, text.len());

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        Ok(ApiResponse {
            status,
            rate_limit,
            body,
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// A raw API response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub rate_limit: RateLimitWindow,
    pub body: Value,
}

impl ApiResponse {
    /// The top-level `message` of an error body.
    pub fn message(&self) -> Option<&str> {
        match &self.body {
            Value::Object(map) => map.get("message").and_then(Value::as_str),
            Value::String(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// The `message` of the first entry in `errors`, if any.
    pub fn first_error_message(&self) -> Option<&str> {
        self.body
            .get("errors")
            .and_then(Value::as_array)
            .and_then(|errors| errors.first())
            .and_then(|error| error.get("message"))
            .and_then(Value::as_str)
    }

    /// A readable description of a failed response.
    pub fn describe(&self) -> String {
        let mut description = self.message().unwrap_or("no message").to_string();
        if let Some(detail) = self.first_error_message() {
            description.push_str(": ");
            description.push_str(detail);
        }
        description
    }

    /// Turn the response into an API error.
    pub fn into_error(self) -> ShuttleError {
        ShuttleError::GitHub {
            status: self.status.as_u16(),
            message: self.describe(),
        }
    }

    /// Decode a successful body.
    pub fn json<T: serde::de::DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_value(self.body)?)
    }
}
