//! Project attribute mapper
//!
//! Translates between task attribute values and GitLab objects (members,
//! milestones, labels). The project metadata is loaded by
//! [`ConnectionHandle::refresh`] and replaced atomically, so readers always
//! see one complete snapshot.
//!
//! [`ConnectionHandle::refresh`]: crate::connection::ConnectionHandle::refresh

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::api::{GitlabClient, Label, Milestone, User};
use crate::descriptor::RepositoryDescriptor;
use crate::error::Result;

/// Project metadata fetched on refresh
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectMetadata {
    pub members: Vec<User>,
    pub milestones: Vec<Milestone>,
    pub labels: Vec<Label>,
}

pub struct AttributeMapper {
    repository_url: String,
    metadata: ArcSwap<ProjectMetadata>,
}

impl std::fmt::Debug for AttributeMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let metadata = self.metadata.load();
        f.debug_struct("AttributeMapper")
            .field("repository_url", &self.repository_url)
            .field("members", &metadata.members.len())
            .field("milestones", &metadata.milestones.len())
            .field("labels", &metadata.labels.len())
            .finish()
    }
}

impl AttributeMapper {
    #[must_use]
    pub fn new(descriptor: &RepositoryDescriptor) -> Self {
        Self {
            repository_url: descriptor.url().to_string(),
            metadata: ArcSwap::from_pointee(ProjectMetadata::default()),
        }
    }

    #[must_use]
    pub fn repository_url(&self) -> &str {
        &self.repository_url
    }

    /// Current metadata snapshot
    #[must_use]
    pub fn snapshot(&self) -> Arc<ProjectMetadata> {
        self.metadata.load_full()
    }

    /// Reload members, milestones and labels of `project_id`
    ///
    /// The previous snapshot stays in place if any request fails.
    pub async fn update(&self, client: &dyn GitlabClient, project_id: u64) -> Result<()> {
        let (members, milestones, labels) = tokio::try_join!(
            client.project_members(project_id),
            client.project_milestones(project_id),
            client.project_labels(project_id),
        )?;

        tracing::debug!(
            project_id,
            members = members.len(),
            milestones = milestones.len(),
            labels = labels.len(),
            "Project metadata refreshed"
        );

        self.metadata.store(Arc::new(ProjectMetadata {
            members,
            milestones,
            labels,
        }));
        Ok(())
    }

    #[must_use]
    pub fn member_by_username(&self, username: &str) -> Option<User> {
        self.metadata
            .load()
            .members
            .iter()
            .find(|u| u.username == username)
            .cloned()
    }

    #[must_use]
    pub fn member_by_id(&self, id: u64) -> Option<User> {
        self.metadata
            .load()
            .members
            .iter()
            .find(|u| u.id == id)
            .cloned()
    }

    #[must_use]
    pub fn milestone_by_title(&self, title: &str) -> Option<Milestone> {
        self.metadata
            .load()
            .milestones
            .iter()
            .find(|m| m.title == title)
            .cloned()
    }

    #[must_use]
    pub fn label_names(&self) -> Vec<String> {
        self.metadata
            .load()
            .labels
            .iter()
            .map(|l| l.name.clone())
            .collect()
    }
}
