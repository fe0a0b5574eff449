//! Remote GitLab API contract
//!
//! The resolver only talks to GitLab through the two traits defined here:
//!
//! - [`GitlabConnector`] - entry point that binds a host to credentials
//! - [`GitlabClient`] - an authenticated client bound to a host and a token
//!
//! [`HttpConnector`] is the production implementation backed by `reqwest`.
//! Tests substitute their own connector to observe calls without a network.

mod error;
mod http;
mod types;

use std::sync::Arc;

use async_trait::async_trait;

pub use error::{ApiError, ApiResult};
pub use http::{HttpClient, HttpConnector};
pub use types::{Label, Milestone, Project, ProjectNamespace, Session, User};

/// Factory for authenticated GitLab clients
#[async_trait]
pub trait GitlabConnector: Send + Sync + std::fmt::Debug {
    /// Bind a client to `host` using `token` for every request.
    ///
    /// No request is sent; an invalid token only surfaces on the first call.
    fn connect_with_token(&self, host: &str, token: &str) -> ApiResult<Arc<dyn GitlabClient>>;

    /// Exchange a username and password for a session carrying a usable token
    async fn connect_with_password(
        &self,
        host: &str,
        username: &str,
        password: &str,
    ) -> ApiResult<Session>;
}

/// Authenticated GitLab client
#[async_trait]
pub trait GitlabClient: Send + Sync + std::fmt::Debug {
    /// Host this client is bound to
    fn host(&self) -> &str;

    /// Fetch the session of the authenticated user
    async fn current_session(&self) -> ApiResult<Session>;

    /// Look up a project by namespace and name. `None` when it does not exist.
    async fn get_project(&self, namespace: &str, name: &str) -> ApiResult<Option<Project>>;

    /// All members of a project, including inherited ones
    async fn project_members(&self, project_id: u64) -> ApiResult<Vec<User>>;

    async fn project_milestones(&self, project_id: u64) -> ApiResult<Vec<Milestone>>;

    async fn project_labels(&self, project_id: u64) -> ApiResult<Vec<Label>>;
}
