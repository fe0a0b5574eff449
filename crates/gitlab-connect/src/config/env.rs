//! Environment variable loading for configuration

use std::env;
use std::time::Duration;

use super::builder::ConfigBuilder;
use crate::Result;
use crate::descriptor::{Credentials, RepositoryDescriptor};

/// Environment variable names
mod vars {
    pub const GITLAB_URL: &str = "GITLAB_URL";
    pub const GITLAB_USERNAME: &str = "GITLAB_USERNAME";
    pub const GITLAB_PASSWORD: &str = "GITLAB_PASSWORD";
    pub const GITLAB_BASE_URL: &str = "GITLAB_BASE_URL";
    pub const GITLAB_USE_PRIVATE_TOKEN: &str = "GITLAB_USE_PRIVATE_TOKEN";
    pub const GITLAB_HTTP_TIMEOUT_SECS: &str = "GITLAB_HTTP_TIMEOUT_SECS";
    pub const RUST_LOG: &str = "RUST_LOG";
    pub const GITLAB_JSON_LOGS: &str = "GITLAB_JSON_LOGS";
}

/// Load configuration from environment variables
pub fn load_from_env(mut builder: ConfigBuilder) -> Result<ConfigBuilder> {
    // Repository defined by env goes first
    if let Ok(url) = env::var(vars::GITLAB_URL) {
        if url.trim().is_empty() {
            return Err(crate::Error::Config(format!(
                "{} must not be empty",
                vars::GITLAB_URL
            )));
        }

        let credentials = Credentials::new(
            env::var(vars::GITLAB_USERNAME).unwrap_or_default(),
            env::var(vars::GITLAB_PASSWORD).unwrap_or_default(),
        );
        let use_private_token = env::var(vars::GITLAB_USE_PRIVATE_TOKEN)
            .map(|v| parse_bool(&v))
            .unwrap_or(false);

        let repository = RepositoryDescriptor::new(url.trim(), credentials)
            .with_base_url(env::var(vars::GITLAB_BASE_URL).ok())
            .with_private_token(use_private_token);

        builder = builder.prepend_repository(repository);
    }

    if let Ok(timeout_str) = env::var(vars::GITLAB_HTTP_TIMEOUT_SECS)
        && let Ok(secs) = timeout_str.parse::<u64>()
    {
        builder = builder.http_timeout(Duration::from_secs(secs));
    }

    if let Ok(level) = env::var(vars::RUST_LOG) {
        builder = builder.log_level(level);
    }

    if let Ok(val) = env::var(vars::GITLAB_JSON_LOGS) {
        builder = builder.json_logs(parse_bool(&val));
    }

    Ok(builder)
}

fn parse_bool(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
