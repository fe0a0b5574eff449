//! Resolved, authenticated connection to one GitLab project

use std::sync::Arc;

use crate::api::{GitlabClient, Project};
use crate::error::Result;
use crate::mapper::AttributeMapper;

/// Authenticated connection to a GitLab project
///
/// Fields are fixed at construction. Only the attribute mapper's metadata
/// changes, through [`ConnectionHandle::refresh`].
pub struct ConnectionHandle {
    host: String,
    project: Project,
    token: String,
    mapper: AttributeMapper,
    client: Arc<dyn GitlabClient>,
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("host", &self.host)
            .field("project", &self.project.path_with_namespace)
            .field("mapper", &self.mapper)
            .finish_non_exhaustive()
    }
}

impl ConnectionHandle {
    #[must_use]
    pub fn new(
        host: String,
        project: Project,
        token: String,
        mapper: AttributeMapper,
        client: Arc<dyn GitlabClient>,
    ) -> Self {
        Self {
            host,
            project,
            token,
            mapper,
            client,
        }
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub const fn project(&self) -> &Project {
        &self.project
    }

    /// Token used for every call made through this connection
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub const fn mapper(&self) -> &AttributeMapper {
        &self.mapper
    }

    #[must_use]
    pub fn client(&self) -> &Arc<dyn GitlabClient> {
        &self.client
    }

    /// Reload the project metadata held by the attribute mapper
    pub async fn refresh(&self) -> Result<()> {
        self.mapper.update(self.client.as_ref(), self.project.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::handle_for;

    #[test]
    fn test_accessors() {
        let handle = handle_for("group/sub/project");
        assert_eq!(handle.host(), "https://git.example.com");
        assert_eq!(handle.project().path_with_namespace, "group/sub/project");
        assert_eq!(handle.token(), "glpat-test");
        assert_eq!(handle.client().host(), "https://git.example.com");
    }

    #[test]
    fn test_debug_hides_token() {
        let handle = handle_for("ns/proj");
        let debug_str = format!("{handle:?}");
        assert!(debug_str.contains("ns/proj"));
        assert!(!debug_str.contains("glpat-test"));
    }

    #[tokio::test]
    async fn test_refresh_populates_mapper() {
        let handle = handle_for("ns/proj");
        assert!(handle.mapper().label_names().is_empty());

        handle.refresh().await.unwrap();

        assert!(!handle.mapper().label_names().is_empty());
        assert!(handle.mapper().member_by_username("alice").is_some());
    }
}
