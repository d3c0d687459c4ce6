use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use relaykit_api::errors::PoolError;

use super::handle::TaskHandle;
use crate::config::ResubmitPolicy;

/// Live name → task map of one pool.
///
/// Lookups see the current state, not a snapshot taken at submit time.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    entries: RwLock<HashMap<String, Arc<TaskHandle>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<TaskHandle>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<TaskHandle>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `handle` under its name, returning the entry it replaced.
    ///
    /// # Errors
    /// [`PoolError::NameInUse`] under [`ResubmitPolicy::Reject`] while the
    /// existing entry has not completed.
    pub fn insert(
        &self,
        handle: Arc<TaskHandle>,
        policy: ResubmitPolicy,
    ) -> Result<Option<Arc<TaskHandle>>, PoolError> {
        let mut entries = self.write();
        if policy == ResubmitPolicy::Reject {
            if let Some(existing) = entries.get(handle.name()) {
                if !existing.is_completed() {
                    return Err(PoolError::NameInUse(handle.name().to_string()));
                }
            }
        }
        Ok(entries.insert(handle.name().to_string(), handle))
    }

    /// Removes the entry for `name` only if it still belongs to `ticket`.
    pub fn release(&self, name: &str, ticket: u64) -> Option<Arc<TaskHandle>> {
        let mut entries = self.write();
        match entries.get(name) {
            Some(current) if current.ticket() == ticket => entries.remove(name),
            _ => None,
        }
    }

    /// Removes the entry for `name` whatever submission it belongs to.
    pub fn remove(&self, name: &str) -> Option<Arc<TaskHandle>> {
        self.write().remove(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<TaskHandle>> {
        self.read().get(name).cloned()
    }

    pub fn with_prefix(&self, prefix: &str) -> Vec<Arc<TaskHandle>> {
        self.read()
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(_, handle)| Arc::clone(handle))
            .collect()
    }

    pub fn all(&self) -> Vec<Arc<TaskHandle>> {
        self.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaykit_api::suspend::SkipPolicy;
    use relaykit_api::task::FnTask;

    fn handle(name: &str, ticket: u64) -> Arc<TaskHandle> {
        Arc::new(TaskHandle::new(
            ticket,
            Arc::new(FnTask::new(name, |_| Ok(()))),
            SkipPolicy::Persist,
            false,
        ))
    }

    #[test]
    fn release_ignores_stale_ticket() {
        let registry = TaskRegistry::new();
        registry.insert(handle("job", 1), ResubmitPolicy::Replace).unwrap();
        let replaced = registry
            .insert(handle("job", 2), ResubmitPolicy::Replace)
            .unwrap();
        assert_eq!(replaced.map(|h| h.ticket()), Some(1));

        assert!(registry.release("job", 1).is_none());
        assert_eq!(registry.get("job").map(|h| h.ticket()), Some(2));

        assert!(registry.release("job", 2).is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn reject_policy_refuses_live_names_only() {
        let registry = TaskRegistry::new();
        let first = handle("dup", 1);
        registry.insert(Arc::clone(&first), ResubmitPolicy::Reject).unwrap();

        let err = registry
            .insert(handle("dup", 2), ResubmitPolicy::Reject)
            .unwrap_err();
        assert_eq!(err, PoolError::NameInUse("dup".to_string()));

        first.execute().unwrap();
        assert!(registry.insert(handle("dup", 3), ResubmitPolicy::Reject).is_ok());
    }

    #[test]
    fn prefix_lookup() {
        let registry = TaskRegistry::new();
        registry.insert(handle("crawl-a", 1), ResubmitPolicy::Replace).unwrap();
        registry.insert(handle("crawl-b", 2), ResubmitPolicy::Replace).unwrap();
        registry.insert(handle("index", 3), ResubmitPolicy::Replace).unwrap();

        let mut names: Vec<_> = registry
            .with_prefix("crawl-")
            .iter()
            .map(|h| h.name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["crawl-a", "crawl-b"]);
        assert_eq!(registry.with_prefix("").len(), 3);
        assert_eq!(registry.all().len(), 3);
    }
}
