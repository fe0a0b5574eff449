//! Repository descriptor supplied by the task framework

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

/// Repository property keys understood by the resolver
pub mod properties {
    /// Base URL of the GitLab instance; the repository URL must start with it
    pub const BASE_URL: &str = "gitlabBaseUrl";
    /// `"true"` selects static-token authentication
    pub const USE_PRIVATE_TOKEN: &str = "usePrivateToken";
}

/// Username and password (or static token) of a repository
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Read-only description of a remote repository: URL, credentials and flags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryDescriptor {
    url: String,
    base_url: Option<String>,
    use_private_token: bool,
    credentials: Credentials,
}

impl RepositoryDescriptor {
    pub fn new(url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            url: url.into(),
            credentials,
            ..Self::default()
        }
    }

    /// Build a descriptor from a task repository's property map
    ///
    /// Unknown keys are ignored. The base URL is trimmed and dropped when empty;
    /// static-token mode is on only for the exact value `"true"`.
    #[must_use]
    pub fn from_properties(
        url: impl Into<String>,
        credentials: Credentials,
        props: &HashMap<String, String>,
    ) -> Self {
        Self::new(url, credentials)
            .with_base_url(props.get(properties::BASE_URL).cloned())
            .with_private_token(
                props
                    .get(properties::USE_PRIVATE_TOKEN)
                    .is_some_and(|v| v == "true"),
            )
    }

    /// Set the base URL override; blank values mean "no override"
    #[must_use]
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }

    #[must_use]
    pub const fn with_private_token(mut self, enabled: bool) -> Self {
        self.use_private_token = enabled;
        self
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    #[must_use]
    pub const fn use_private_token(&self) -> bool {
        self.use_private_token
    }

    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.credentials.password
    }
}
