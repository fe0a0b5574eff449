//! TOML configuration file loading

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::builder::ConfigBuilder;
use crate::Result;
use crate::descriptor::{Credentials, RepositoryDescriptor};

/// Configuration file locations checked in order
const CONFIG_PATHS: &[&str] = &[
    "./gitlab-connect.toml",
    "~/.config/gitlab-connect/config.toml",
    "/etc/gitlab-connect/config.toml",
];

/// Find the first existing configuration file
pub fn find_config_file() -> Option<PathBuf> {
    for path_str in CONFIG_PATHS {
        let path = if path_str.starts_with('~') {
            if let Ok(home) = std::env::var("HOME") {
                PathBuf::from(path_str.replacen('~', &home, 1))
            } else {
                continue;
            }
        } else {
            PathBuf::from(path_str)
        };

        if path.exists() {
            return Some(path);
        }
    }
    None
}

/// Load configuration from a TOML file
pub fn load_from_file(path: &Path, builder: ConfigBuilder) -> Result<ConfigBuilder> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::Error::Config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    let file_config: FileConfig = toml::from_str(&content).map_err(|e| {
        crate::Error::Config(format!(
            "Failed to parse config file {}: {}",
            path.display(),
            e
        ))
    })?;

    Ok(apply_file_config(builder, file_config))
}

fn apply_file_config(mut builder: ConfigBuilder, config: FileConfig) -> ConfigBuilder {
    if let Some(http) = config.http {
        if let Some(secs) = http.timeout_secs {
            builder = builder.http_timeout(Duration::from_secs(secs));
        }

        if let Some(ua) = http.user_agent {
            builder = builder.user_agent(ua);
        }

        if let Some(prefix) = http.api_prefix {
            builder = builder.api_prefix(prefix);
        }
    }

    if let Some(logging) = config.logging {
        if let Some(level) = logging.log_level {
            builder = builder.log_level(level);
        }

        if let Some(json) = logging.json_logs {
            builder = builder.json_logs(json);
        }
    }

    for repo in config.repository {
        builder = builder.repository(repo.into_descriptor());
    }

    builder
}

/// Root configuration file structure
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    http: Option<HttpFileConfig>,
    logging: Option<LoggingFileConfig>,
    #[serde(default)]
    repository: Vec<RepositoryFileConfig>,
}

#[derive(Debug, Deserialize)]
struct HttpFileConfig {
    timeout_secs: Option<u64>,
    user_agent: Option<String>,
    api_prefix: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoggingFileConfig {
    log_level: Option<String>,
    json_logs: Option<bool>,
}

#[derive(Deserialize)]
struct RepositoryFileConfig {
    url: String,
    #[serde(flatten)]
    credentials: Credentials,
    base_url: Option<String>,
    #[serde(default)]
    use_private_token: bool,
}

impl std::fmt::Debug for RepositoryFileConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryFileConfig")
            .field("url", &self.url)
            .field("credentials", &self.credentials)
            .field("base_url", &self.base_url)
            .field("use_private_token", &self.use_private_token)
            .finish()
    }
}

impl RepositoryFileConfig {
    fn into_descriptor(self) -> RepositoryDescriptor {
        RepositoryDescriptor::new(self.url, self.credentials)
            .with_base_url(self.base_url)
            .with_private_token(self.use_private_token)
    }
}
