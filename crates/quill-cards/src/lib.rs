//! GitHub repository previews for `::github{repo="owner/name"}` cards.
//!
//! [`GithubResolver`] implements the renderer's
//! [`CardResolver`](quill_renderer::components::CardResolver) over the
//! GitHub REST API with a blocking `ureq` agent. The renderer bounds every
//! lookup with its own timeout; the agent timeout here only stops abandoned
//! requests from running forever.

mod api;
mod error;

use std::time::Duration;

use quill_renderer::components::{CardPreview, CardResolver, RepoId, ResolveError};
use ureq::Agent;

pub use error::CardError;

use crate::api::RepoResponse;

/// Default GitHub API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default HTTP timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("quill/", env!("CARGO_PKG_VERSION"));

/// Card resolver backed by the GitHub REST API.
pub struct GithubResolver {
    agent: Agent,
    api_url: String,
    token: Option<String>,
}

impl GithubResolver {
    /// Create a resolver for the given API base URL.
    #[must_use]
    pub fn new(api_url: &str) -> Self {
        Self {
            agent: create_agent(DEFAULT_TIMEOUT),
            api_url: api_url.trim_end_matches('/').to_owned(),
            token: None,
        }
    }

    /// Send `Authorization: Bearer <token>` with every request.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the HTTP timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = create_agent(timeout);
        self
    }

    /// Fetch repository metadata.
    ///
    /// # Errors
    ///
    /// Returns [`CardError`] if the identifier is unusable, the request
    /// fails, or the response is not a repository.
    pub fn fetch(&self, repo: &RepoId) -> Result<CardPreview, CardError> {
        for part in [&repo.owner, &repo.name] {
            if part.is_empty() || part == "." || part == ".." {
                return Err(CardError::InvalidIdentifier(repo.to_string()));
            }
        }

        let url = format!("{}/repos/{}/{}", self.api_url, repo.owner, repo.name);
        tracing::debug!(repo = %repo, url = %url, "Fetching repository");

        let mut request = self
            .agent
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT);
        if let Some(token) = &self.token {
            request = request.header("Authorization", &format!("Bearer {token}"));
        }

        let response = request.call().map_err(|e| match e {
            ureq::Error::Timeout(_) => CardError::Timeout,
            other => CardError::Http(other),
        })?;

        let status = response.status().as_u16();
        let mut body_reader = response.into_body();

        if status >= 400 {
            let error_body = body_reader
                .read_to_string()
                .unwrap_or_else(|_| "(unable to read error body)".to_owned());
            return Err(CardError::Status {
                status,
                body: error_body,
            });
        }

        let body = body_reader.read_to_string()?;
        let response: RepoResponse = serde_json::from_str(&body)?;
        Ok(response.into())
    }
}

impl Default for GithubResolver {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl CardResolver for GithubResolver {
    fn resolve(&self, repo: &RepoId) -> Result<CardPreview, ResolveError> {
        Ok(self.fetch(repo)?)
    }
}

fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn repo(owner: &str, name: &str) -> RepoId {
        RepoId {
            owner: owner.to_owned(),
            name: name.to_owned(),
        }
    }

    #[test]
    fn test_api_url_trailing_slash() {
        let resolver = GithubResolver::new("https://ghe.example.com/api/v3/");
        assert_eq!(resolver.api_url, "https://ghe.example.com/api/v3");
    }

    #[test]
    fn test_dot_segments_rejected() {
        let resolver = GithubResolver::default();
        let err = resolver.fetch(&repo("..", "x")).unwrap_err();
        assert!(matches!(err, CardError::InvalidIdentifier(_)));
    }

    #[test]
    fn test_connection_failure_is_resolve_error() {
        // Nothing listens on port 1
        let resolver =
            GithubResolver::new("http://127.0.0.1:1").with_timeout(Duration::from_secs(2));
        let result = resolver.resolve(&repo("rust-lang", "rust"));
        assert!(matches!(result, Err(ResolveError::Failed(_))));
    }

    #[test]
    fn test_token_is_stored() {
        let resolver = GithubResolver::default().with_token("ghp_example");
        assert_eq!(resolver.token.as_deref(), Some("ghp_example"));
    }
}
