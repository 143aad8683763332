use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use uuid::Uuid;

use super::{ToolInstance, ToolKind};

/// Default idle lifetime of a tool instance (30 minutes).
pub const DEFAULT_INSTANCE_TTL: Duration = Duration::from_secs(30 * 60);

/// Thread-safe registry of open tool instances.
///
/// Each page render of a tool creates a fresh instance; instances never
/// share state with each other.
#[derive(Debug, Clone)]
pub struct ToolStore {
    inner: Arc<ToolStoreInner>,
}

#[derive(Debug)]
struct ToolStoreInner {
    instances: RwLock<HashMap<Uuid, Arc<ToolInstance>>>,
    ttl: Duration,
}

impl Default for ToolStore {
    fn default() -> Self {
        Self::new(DEFAULT_INSTANCE_TTL)
    }
}

impl ToolStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(ToolStoreInner {
                instances: RwLock::new(HashMap::new()),
                ttl,
            }),
        }
    }

    /// Open a new instance, pruning expired ones first.
    #[must_use]
    pub fn create(&self, kind: ToolKind) -> Arc<ToolInstance> {
        let removed = self.cleanup_expired();
        if removed > 0 {
            tracing::debug!(name: "tools.store.pruned", removed, "Pruned expired tool instances");
        }

        let instance = Arc::new(ToolInstance::new(kind));
        self.inner
            .instances
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(instance.id(), Arc::clone(&instance));
        instance
    }

    #[must_use]
    pub fn get(&self, id: &Uuid) -> Option<Arc<ToolInstance>> {
        let guard = self
            .inner
            .instances
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        guard.get(id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove instances idle longer than the configured TTL.
    ///
    /// Returns the number removed.
    pub fn cleanup_expired(&self) -> usize {
        let ttl = self.inner.ttl;
        let mut guard = self
            .inner
            .instances
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = guard.len();
        guard.retain(|_, instance| !instance.is_expired(ttl));
        before - guard.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_get() {
        let store = ToolStore::default();
        assert!(store.is_empty());

        let a = store.create(ToolKind::IpLookup);
        let b = store.create(ToolKind::IpLookup);
        assert_ne!(a.id(), b.id());
        assert_eq!(store.len(), 2);

        let found = store.get(&a.id()).unwrap();
        assert!(Arc::ptr_eq(&found, &a));
        assert!(store.get(&Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_instances_are_independent() {
        let store = ToolStore::default();
        let a = store.create(ToolKind::ZipLookup);
        let b = store.create(ToolKind::ZipLookup);
        a.prefill("90210");
        assert_eq!(a.snapshot().input, "90210");
        assert_eq!(b.snapshot().input, "");
    }

    #[test]
    fn test_cleanup_expired() {
        let store = ToolStore::new(Duration::from_millis(1));
        let _ = store.create(ToolKind::UaCheck);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(store.cleanup_expired(), 1);
        assert!(store.is_empty());
    }
}
