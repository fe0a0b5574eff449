//! In-memory GitLab used by unit tests

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::api::{
    ApiError, ApiResult, GitlabClient, GitlabConnector, Label, Milestone, Project,
    ProjectNamespace, Session, User,
};
use crate::connection::ConnectionHandle;
use crate::descriptor::{Credentials, RepositoryDescriptor};
use crate::mapper::AttributeMapper;

/// Serializes tests that read or write process environment variables
pub static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

pub const HOST: &str = "https://git.example.com";
pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "secret";
/// Token handed out for a successful password login
pub const SESSION_TOKEN: &str = "session-token";
/// Pre-issued token accepted as-is
pub const STATIC_TOKEN: &str = "static-token";

pub fn fake_project(id: u64, path: &str) -> Project {
    let (namespace, name) = path.rsplit_once('/').unwrap_or(("", path));
    Project {
        id,
        name: name.to_string(),
        path: name.to_string(),
        path_with_namespace: path.to_string(),
        namespace: Some(ProjectNamespace {
            id: 100,
            name: namespace.to_string(),
            path: namespace.to_string(),
            full_path: Some(namespace.to_string()),
        }),
        web_url: Some(format!("{HOST}/{path}")),
        description: None,
        default_branch: Some("main".to_string()),
    }
}

fn alice() -> User {
    User {
        id: 1,
        username: USERNAME.to_string(),
        name: "Alice".to_string(),
        email: Some("alice@example.com".to_string()),
        state: Some("active".to_string()),
    }
}

/// Call counters
#[derive(Debug, Default)]
pub struct Calls {
    pub password_logins: AtomicUsize,
    pub token_connects: AtomicUsize,
    pub session_checks: AtomicUsize,
    pub project_lookups: AtomicUsize,
    pub metadata_loads: AtomicUsize,
}

#[derive(Debug, Default)]
struct State {
    projects: RwLock<HashMap<String, Project>>,
    tokens: RwLock<HashSet<String>>,
    calls: Calls,
    offline: AtomicBool,
    fail_metadata: AtomicBool,
    panic_on_lookup: AtomicBool,
    login_delay_ms: AtomicUsize,
}

#[derive(Debug, Clone, Default)]
pub struct FakeGitlab {
    state: Arc<State>,
}

impl FakeGitlab {
    pub fn new() -> Self {
        let fake = Self::default();
        {
            let mut tokens = fake.state.tokens.write();
            tokens.insert(SESSION_TOKEN.to_string());
            tokens.insert(STATIC_TOKEN.to_string());
        }
        fake
    }

    pub fn with_project(self, project: Project) -> Self {
        self.state
            .projects
            .write()
            .insert(project.path_with_namespace.clone(), project);
        self
    }

    pub fn with_token(self, token: &str) -> Self {
        self.state.tokens.write().insert(token.to_string());
        self
    }

    pub fn with_login_delay(self, delay: Duration) -> Self {
        self.state
            .login_delay_ms
            .store(usize::try_from(delay.as_millis()).unwrap_or(usize::MAX), Ordering::SeqCst);
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.state.offline.store(offline, Ordering::SeqCst);
    }

    pub fn fail_metadata(&self, fail: bool) {
        self.state.fail_metadata.store(fail, Ordering::SeqCst);
    }

    pub fn panic_on_lookup(&self, panic: bool) {
        self.state.panic_on_lookup.store(panic, Ordering::SeqCst);
    }

    pub fn calls(&self) -> &Calls {
        &self.state.calls
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn client(&self, token: &str) -> Arc<dyn GitlabClient> {
        Arc::new(FakeClient {
            host: HOST.to_string(),
            token: token.to_string(),
            state: Arc::clone(&self.state),
        })
    }

    fn check_online(&self) -> ApiResult<()> {
        if self.state.offline.load(Ordering::SeqCst) {
            return Err(ApiError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl GitlabConnector for FakeGitlab {
    fn connect_with_token(&self, host: &str, token: &str) -> ApiResult<Arc<dyn GitlabClient>> {
        self.state
            .calls
            .token_connects
            .fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeClient {
            host: host.to_string(),
            token: token.to_string(),
            state: Arc::clone(&self.state),
        }))
    }

    async fn connect_with_password(
        &self,
        _host: &str,
        username: &str,
        password: &str,
    ) -> ApiResult<Session> {
        self.state
            .calls
            .password_logins
            .fetch_add(1, Ordering::SeqCst);

        let delay = self.state.login_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(u64::try_from(delay).unwrap_or(u64::MAX))).await;
        }

        self.check_online()?;
        if username == USERNAME && password == PASSWORD {
            Ok(Session {
                user: alice(),
                private_token: SESSION_TOKEN.to_string(),
            })
        } else {
            Err(ApiError::Unauthorized { status: 401 })
        }
    }
}

#[derive(Debug)]
struct FakeClient {
    host: String,
    token: String,
    state: Arc<State>,
}

impl FakeClient {
    fn authorize(&self) -> ApiResult<()> {
        if self.state.offline.load(Ordering::SeqCst) {
            return Err(ApiError::Transport("connection refused".to_string()));
        }
        if self.state.tokens.read().contains(&self.token) {
            Ok(())
        } else {
            Err(ApiError::Unauthorized { status: 401 })
        }
    }

    fn metadata_guard(&self) -> ApiResult<()> {
        self.authorize()?;
        if self.state.fail_metadata.load(Ordering::SeqCst) {
            return Err(ApiError::Transport("metadata unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl GitlabClient for FakeClient {
    fn host(&self) -> &str {
        &self.host
    }

    async fn current_session(&self) -> ApiResult<Session> {
        self.state
            .calls
            .session_checks
            .fetch_add(1, Ordering::SeqCst);
        self.authorize()?;
        // Deliberately differs from the bound token
        Ok(Session {
            user: alice(),
            private_token: "session-derived-token".to_string(),
        })
    }

    async fn get_project(&self, namespace: &str, name: &str) -> ApiResult<Option<Project>> {
        self.state
            .calls
            .project_lookups
            .fetch_add(1, Ordering::SeqCst);
        assert!(
            !self.state.panic_on_lookup.load(Ordering::SeqCst),
            "project lookup exploded"
        );
        self.authorize()?;
        Ok(self
            .state
            .projects
            .read()
            .get(&format!("{namespace}/{name}"))
            .cloned())
    }

    async fn project_members(&self, _project_id: u64) -> ApiResult<Vec<User>> {
        self.state
            .calls
            .metadata_loads
            .fetch_add(1, Ordering::SeqCst);
        self.metadata_guard()?;
        Ok(vec![alice()])
    }

    async fn project_milestones(&self, _project_id: u64) -> ApiResult<Vec<Milestone>> {
        self.metadata_guard()?;
        Ok(vec![Milestone {
            id: 11,
            iid: 1,
            title: "v1.0".to_string(),
            state: Some("active".to_string()),
            description: None,
            due_date: None,
        }])
    }

    async fn project_labels(&self, _project_id: u64) -> ApiResult<Vec<Label>> {
        self.metadata_guard()?;
        Ok(vec![
            Label {
                id: Some(1),
                name: "bug".to_string(),
                color: Some("#d9534f".to_string()),
                description: None,
            },
            Label {
                id: Some(2),
                name: "feature".to_string(),
                color: Some("#5cb85c".to_string()),
                description: None,
            },
        ])
    }
}

pub fn descriptor(path: &str) -> RepositoryDescriptor {
    RepositoryDescriptor::new(
        format!("{HOST}/{path}"),
        Credentials::new(USERNAME, PASSWORD),
    )
}

/// Handle for `path` whose client talks to a fresh fake
pub fn handle_for(path: &str) -> ConnectionHandle {
    let fake = FakeGitlab::new()
        .with_project(fake_project(7, path))
        .with_token("glpat-test");
    ConnectionHandle::new(
        HOST.to_string(),
        fake_project(7, path),
        "glpat-test".to_string(),
        AttributeMapper::new(&descriptor(path)),
        fake.client("glpat-test"),
    )
}
