//! GitLab connection resolution and caching
//!
//! Turns a repository descriptor (URL, credentials, optional base URL and
//! token flag) into an authenticated, cached [`ConnectionHandle`] bound to
//! one GitLab project. See [`ConnectionResolver`] for the entry point.

pub mod api;
pub mod cache;
pub mod config;
mod connection;
pub mod descriptor;
mod error;
mod mapper;
pub mod observability;
mod project_url;
mod resolver;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{GitlabClient, GitlabConnector, HttpConnector};
pub use cache::{CacheKey, ConnectionCache};
pub use config::{Config, ConfigBuilder, HttpConfig, LoggingConfig};
pub use connection::ConnectionHandle;
pub use descriptor::{Credentials, RepositoryDescriptor};
pub use error::{Error, ErrorKind, Result};
pub use mapper::{AttributeMapper, ProjectMetadata};
pub use project_url::{ProjectLocation, ProjectPath};
pub use resolver::{ConnectionResolver, ResolverStats};
