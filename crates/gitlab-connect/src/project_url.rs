//! Project URL resolution
//!
//! Resolution happens in two stages, matching the points where validation
//! needs them:
//!
//! 1. [`ProjectLocation::resolve`] finds the GitLab host and the raw project
//!    path. Two shapes are accepted:
//!    - With a base URL override, the repository URL must start with the base
//!      URL byte for byte. The rest, minus one leading `/`, is the path.
//!    - Without one, the URL must look like `http(s)://authority/namespace/name`.
//!      The host is scheme plus authority and the path is everything after.
//! 2. [`ProjectPath::parse`] drops a trailing `.git` and splits the path at its
//!    last `/` into namespace and name. It runs only after authentication.

use std::sync::LazyLock;

use regex::Regex;

use crate::descriptor::RepositoryDescriptor;
use crate::error::{Error, Result};

/// `(scheme://authority)/(namespace.../name)` anchored at the end of the URL
static PROJECT_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"((?:http|https)://(?:[^/]*))/((?:.*?)/(?:[^/]*?))$")
        .expect("project URL pattern is valid")
});

const GIT_SUFFIX: &str = ".git";

/// GitLab host and raw project path of a repository URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLocation {
    host: String,
    raw_path: String,
}

impl ProjectLocation {
    /// Resolve host and raw path of the repository described by `descriptor`
    pub fn resolve(descriptor: &RepositoryDescriptor) -> Result<Self> {
        let (host, raw_path) = split_host(descriptor.url(), descriptor.base_url())?;
        Ok(Self {
            host: host.to_string(),
            raw_path: raw_path.to_string(),
        })
    }

    /// Scheme and authority (or the base URL override)
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Path as found in the URL, `.git` suffix included
    #[must_use]
    pub fn raw_path(&self) -> &str {
        &self.raw_path
    }

    /// Split the raw path into namespace and name
    pub fn project_path(&self) -> Result<ProjectPath> {
        ProjectPath::parse(&self.raw_path)
    }
}

/// Project path split into namespace and name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPath {
    path: String,
    namespace: String,
    name: String,
}

impl ProjectPath {
    /// Strip one trailing `.git` and split at the last `/`
    ///
    /// Only a path without any `/` is rejected. Empty segments such as in
    /// `ns/` are passed on and end up as an unknown project.
    pub fn parse(raw_path: &str) -> Result<Self> {
        let path = raw_path.strip_suffix(GIT_SUFFIX).unwrap_or(raw_path);

        let (namespace, name) = path.rsplit_once('/').ok_or_else(|| {
            Error::invalid_url(format!("project path '{path}' has no namespace"))
        })?;

        Ok(Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            path: path.to_string(),
        })
    }

    /// `namespace/name`, without any `.git` suffix
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

fn split_host<'a>(url: &'a str, base_url: Option<&'a str>) -> Result<(&'a str, &'a str)> {
    if let Some(base) = base_url {
        let rest = url.strip_prefix(base).ok_or_else(|| {
            Error::invalid_url(format!("{url} does not start with base URL {base}"))
        })?;
        return Ok((base, rest.strip_prefix('/').unwrap_or(rest)));
    }

    let caps = PROJECT_URL_PATTERN
        .captures(url)
        .ok_or_else(|| Error::invalid_url(url.to_string()))?;

    match (caps.get(1), caps.get(2)) {
        (Some(host), Some(path)) => Ok((host.as_str(), path.as_str())),
        _ => Err(Error::invalid_url(url.to_string())),
    }
}
