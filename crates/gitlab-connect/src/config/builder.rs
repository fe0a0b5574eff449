//! Configuration builder

use std::time::Duration;

use crate::Error;
use crate::descriptor::RepositoryDescriptor;

/// Default request timeout for GitLab calls
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Default REST API path appended to the host
pub const DEFAULT_API_PREFIX: &str = "/api/v4";

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub http: HttpConfig,
    pub logging: LoggingConfig,
    pub repositories: Vec<RepositoryDescriptor>,
}

impl Config {
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    #[must_use]
    pub const fn http(&self) -> &HttpConfig {
        &self.http
    }

    #[must_use]
    pub const fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    #[must_use]
    pub fn repositories(&self) -> &[RepositoryDescriptor] {
        &self.repositories
    }
}

/// HTTP client settings for [`HttpConnector`](crate::api::HttpConnector)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub api_prefix: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_HTTP_TIMEOUT,
            user_agent: default_user_agent(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingConfig {
    pub log_level: String,
    pub json_logs: bool,
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// Configuration builder with fluent API
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    http_timeout: Option<Duration>,
    user_agent: Option<String>,
    api_prefix: Option<String>,
    log_level: Option<String>,
    json_logs: bool,
    repositories: Vec<RepositoryDescriptor>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = Some(user_agent);
        self
    }

    #[must_use]
    pub fn api_prefix(mut self, prefix: String) -> Self {
        self.api_prefix = Some(prefix);
        self
    }

    #[must_use]
    pub fn log_level(mut self, level: String) -> Self {
        self.log_level = Some(level);
        self
    }

    #[must_use]
    pub const fn json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = enabled;
        self
    }

    /// Append a repository
    #[must_use]
    pub fn repository(mut self, repository: RepositoryDescriptor) -> Self {
        self.repositories.push(repository);
        self
    }

    /// Put a repository in front of the ones already configured
    #[must_use]
    pub fn prepend_repository(mut self, repository: RepositoryDescriptor) -> Self {
        self.repositories.insert(0, repository);
        self
    }

    /// Build the configuration
    pub fn build(self) -> crate::Result<Config> {
        let timeout = self.http_timeout.unwrap_or(DEFAULT_HTTP_TIMEOUT);
        if timeout.is_zero() {
            return Err(Error::Config("http timeout must be greater than zero".into()));
        }

        let api_prefix = self
            .api_prefix
            .unwrap_or_else(|| DEFAULT_API_PREFIX.to_string());
        if !api_prefix.starts_with('/') {
            return Err(Error::Config(format!(
                "api_prefix must start with '/': {api_prefix}"
            )));
        }

        let user_agent = self
            .user_agent
            .filter(|ua| !ua.trim().is_empty())
            .unwrap_or_else(default_user_agent);

        let log_level = self
            .log_level
            .filter(|level| !level.is_empty())
            .unwrap_or_else(|| "info".to_string());

        for repo in &self.repositories {
            if repo.url().is_empty() {
                return Err(Error::Config("repository url must not be empty".into()));
            }
        }

        Ok(Config {
            http: HttpConfig {
                timeout,
                user_agent,
                api_prefix: api_prefix.trim_end_matches('/').to_string(),
            },
            logging: LoggingConfig {
                log_level,
                json_logs: self.json_logs,
            },
            repositories: self.repositories,
        })
    }
}
