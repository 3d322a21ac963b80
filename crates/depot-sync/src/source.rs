use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::SyncResult;

/// Backend-specific configuration of a login source.
///
/// Only some backends can pull users from their directory; those expose it
/// through [`as_synchronizable`](Self::as_synchronizable).
pub trait SourceConfig: Send + Sync {
    fn as_synchronizable(&self) -> Option<&dyn SynchronizableSource> {
        None
    }
}

/// A source whose users can be pulled into the local account table.
#[async_trait]
pub trait SynchronizableSource: Send + Sync {
    /// Run one synchronization of this source.
    ///
    /// Implementations may check `cancel` themselves; the pass only checks
    /// it between sources.
    async fn sync(&self, cancel: &CancellationToken, update_existing: bool) -> SyncResult<()>;
}

/// A configured external login source.
#[derive(Clone)]
pub struct LoginSource {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
    pub is_sync_enabled: bool,
    pub config: Arc<dyn SourceConfig>,
}

impl LoginSource {
    /// An active, sync-enabled source.
    pub fn new(id: i64, name: impl Into<String>, config: Arc<dyn SourceConfig>) -> Self {
        Self {
            id,
            name: name.into(),
            is_active: true,
            is_sync_enabled: true,
            config,
        }
    }

    /// Whether the pass should consider this source at all.
    pub fn wants_sync(&self) -> bool {
        self.is_active && self.is_sync_enabled
    }
}

impl fmt::Debug for LoginSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginSource")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("is_active", &self.is_active)
            .field("is_sync_enabled", &self.is_sync_enabled)
            .finish_non_exhaustive()
    }
}

/// Lists configured login sources, ordered by id.
#[async_trait]
pub trait SourceRegistry: Send + Sync {
    async fn login_sources(&self) -> SyncResult<Vec<LoginSource>>;
}

/// A fixed, in-memory list of sources.
#[derive(Clone, Debug, Default)]
pub struct StaticSourceRegistry {
    sources: Vec<LoginSource>,
}

impl StaticSourceRegistry {
    pub fn new(mut sources: Vec<LoginSource>) -> Self {
        sources.sort_by_key(|s| s.id);
        Self { sources }
    }
}

#[async_trait]
impl SourceRegistry for StaticSourceRegistry {
    async fn login_sources(&self) -> SyncResult<Vec<LoginSource>> {
        Ok(self.sources.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PlainConfig;
    impl SourceConfig for PlainConfig {}

    #[test]
    fn default_config_is_not_synchronizable() {
        assert!(PlainConfig.as_synchronizable().is_none());
    }

    #[test]
    fn wants_sync_needs_both_flags() {
        let mut source = LoginSource::new(1, "ldap", Arc::new(PlainConfig));
        assert!(source.wants_sync());
        source.is_sync_enabled = false;
        assert!(!source.wants_sync());
        source.is_sync_enabled = true;
        source.is_active = false;
        assert!(!source.wants_sync());
    }

    #[tokio::test]
    async fn static_registry_orders_by_id() {
        let registry = StaticSourceRegistry::new(vec![
            LoginSource::new(3, "c", Arc::new(PlainConfig)),
            LoginSource::new(1, "a", Arc::new(PlainConfig)),
            LoginSource::new(2, "b", Arc::new(PlainConfig)),
        ]);
        let names: Vec<_> = registry
            .login_sources()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
    }
}
