//! Connection resolution and caching
//!
//! [`ConnectionResolver`] turns a [`RepositoryDescriptor`] into a cached
//! [`ConnectionHandle`]:
//!
//! 1. Derive the [`CacheKey`] from URL, username and password hash.
//! 2. On a hit (and no forced refresh), return the cached handle untouched.
//! 3. Otherwise validate the descriptor against GitLab, store the new handle
//!    under the key, then refresh it once.
//!
//! Validation resolves host and project path, authenticates either with a
//! static token or with username and password, reconnects with the effective
//! token and looks the project up. Every failure comes back as a typed
//! [`Error`]; panics raised by a connector are reported as
//! [`Error::UnexpectedFailure`].

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use tracing::Instrument;

use crate::api::GitlabConnector;
use crate::cache::{CacheKey, ConnectionCache};
use crate::connection::ConnectionHandle;
use crate::descriptor::RepositoryDescriptor;
use crate::error::{Error, Result};
use crate::mapper::AttributeMapper;
use crate::project_url::ProjectLocation;

/// Resolver statistics for observability
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that found no entry
    pub misses: u64,
    /// Validations attempted
    pub validations: u64,
    /// Resolutions that ended in an error
    pub failures: u64,
    /// Connections currently cached
    pub entry_count: usize,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    validations: AtomicU64,
    failures: AtomicU64,
}

impl Counters {
    fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Resolves repository descriptors into cached, authenticated connections
pub struct ConnectionResolver {
    connector: Arc<dyn GitlabConnector>,
    cache: Arc<ConnectionCache>,
    counters: Counters,
}

impl std::fmt::Debug for ConnectionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionResolver")
            .field("connector", &self.connector)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl ConnectionResolver {
    /// Resolver with its own, empty cache
    pub fn new(connector: Arc<dyn GitlabConnector>) -> Self {
        Self::with_cache(connector, Arc::new(ConnectionCache::new()))
    }

    /// Resolver sharing an existing cache
    pub fn with_cache(connector: Arc<dyn GitlabConnector>, cache: Arc<ConnectionCache>) -> Self {
        Self {
            connector,
            cache,
            counters: Counters::default(),
        }
    }

    #[must_use]
    pub const fn cache(&self) -> &Arc<ConnectionCache> {
        &self.cache
    }

    /// Cached connection for `descriptor`, creating it on first use
    pub async fn get(&self, descriptor: &RepositoryDescriptor) -> Result<Arc<ConnectionHandle>> {
        self.get_with(descriptor, false).await
    }

    /// Connection for `descriptor`; with `force_refresh` the cached entry is
    /// validated again and replaced
    pub async fn get_with(
        &self,
        descriptor: &RepositoryDescriptor,
        force_refresh: bool,
    ) -> Result<Arc<ConnectionHandle>> {
        let key = CacheKey::for_descriptor(descriptor);

        if !force_refresh {
            if let Some(handle) = self.lookup(&key) {
                return Ok(handle);
            }
            Counters::incr(&self.counters.misses);
            tracing::debug!(cache.key = %key, "Connection cache miss");
        }

        let slot = self.cache.slot(&key);
        let result = {
            let _guard = slot.lock().await;
            // Another caller may have resolved the key while we waited
            match self.lookup_after_wait(&key, force_refresh) {
                Some(handle) => Ok(handle),
                None => self.create(&key, descriptor).await,
            }
        };
        self.cache.release_slot(&key, slot);

        if let Err(ref e) = result {
            Counters::incr(&self.counters.failures);
            tracing::warn!(
                cache.key = %key,
                error.kind = %e.kind(),
                error = %e,
                "Failed to resolve GitLab connection"
            );
        }

        result
    }

    /// Like [`get`](Self::get), but any failure yields `None`
    pub async fn get_or_none(&self, descriptor: &RepositoryDescriptor) -> Option<Arc<ConnectionHandle>> {
        self.get(descriptor).await.ok()
    }

    /// Validate `descriptor` against GitLab and build a new, uncached handle
    pub async fn validate(&self, descriptor: &RepositoryDescriptor) -> Result<ConnectionHandle> {
        Counters::incr(&self.counters.validations);
        let span = tracing::info_span!("gitlab.validate", url = %descriptor.url());
        guarded(self.validate_inner(descriptor))
            .instrument(span)
            .await
    }

    /// Drop the cached connection for `descriptor`
    pub fn invalidate(&self, descriptor: &RepositoryDescriptor) -> bool {
        self.cache
            .remove(&CacheKey::for_descriptor(descriptor))
            .is_some()
    }

    #[must_use]
    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            validations: self.counters.validations.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            entry_count: self.cache.len(),
        }
    }

    fn lookup(&self, key: &CacheKey) -> Option<Arc<ConnectionHandle>> {
        let handle = self.cache.get(key)?;
        Counters::incr(&self.counters.hits);
        tracing::debug!(cache.key = %key, "Connection cache hit");
        Some(handle)
    }

    fn lookup_after_wait(&self, key: &CacheKey, force_refresh: bool) -> Option<Arc<ConnectionHandle>> {
        if force_refresh {
            None
        } else {
            self.lookup(key)
        }
    }

    async fn create(
        &self,
        key: &CacheKey,
        descriptor: &RepositoryDescriptor,
    ) -> Result<Arc<ConnectionHandle>> {
        let handle = Arc::new(self.validate(descriptor).await?);

        if self.cache.insert(key.clone(), Arc::clone(&handle)).is_some() {
            tracing::debug!(cache.key = %key, "Replaced cached connection");
        }

        guarded(handle.refresh()).await?;
        Ok(handle)
    }

    async fn validate_inner(&self, descriptor: &RepositoryDescriptor) -> Result<ConnectionHandle> {
        let location = ProjectLocation::resolve(descriptor)?;
        let host = location.host();

        let token = if descriptor.use_private_token() {
            let token_client = self
                .connector
                .connect_with_token(host, descriptor.password())?;
            token_client.current_session().await?;
            descriptor.password().to_string()
        } else {
            self.connector
                .connect_with_password(host, descriptor.username(), descriptor.password())
                .await?
                .private_token
        };

        let client = self.connector.connect_with_token(host, &token)?;

        // Path problems surface only once the credentials have been accepted
        let path = location.project_path()?;
        let project = client
            .get_project(path.namespace(), path.name())
            .await?
            .ok_or_else(|| Error::UnknownProject(path.path().to_string()))?;

        tracing::info!(
            host,
            project = %project.path_with_namespace,
            project_id = project.id,
            private_token = descriptor.use_private_token(),
            "Resolved GitLab project"
        );

        Ok(ConnectionHandle::new(
            host.to_string(),
            project,
            token,
            AttributeMapper::new(descriptor),
            client,
        ))
    }
}

/// Run `fut`, reporting a panic as [`Error::UnexpectedFailure`]
async fn guarded<T>(fut: impl Future<Output = Result<T>>) -> Result<T> {
    AssertUnwindSafe(fut)
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(Error::UnexpectedFailure(panic_message(panic.as_ref()))))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic in GitLab client".to_string()
    }
}
