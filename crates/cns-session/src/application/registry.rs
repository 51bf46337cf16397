//! The session registry: one content structure per (session, process).

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, PoisonError, RwLock};

use cns_structure::domain::structure::ContentStructure;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::key::SessionKey;

/// The per-key slot. It stays the same for the lifetime of the entry; a
/// restart swaps the structure inside it and a finish empties it, both
/// under its lock. Holding the lock serializes all navigation for one key.
pub type StructureSlot = Arc<Mutex<Option<ContentStructure>>>;

/// Exclusive access to a slot that is registered for its key.
pub type SlotGuard = OwnedMutexGuard<Option<ContentStructure>>;

enum Claim {
    Fresh(SlotGuard),
    Existing(StructureSlot),
}

/// Owns every live content structure.
///
/// The map lock is only held for the lookup or update itself, never across
/// an `.await`. A registered slot is never empty while unlocked.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    entries: RwLock<HashMap<SessionKey, StructureSlot>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slot registered for the key. Never creates one.
    #[must_use]
    pub fn get(&self, session_id: &str, process_id: &str) -> Option<StructureSlot> {
        self.get_key(&SessionKey::new(session_id, process_id))
    }

    /// Returns the slot registered for `key`.
    #[must_use]
    pub fn get_key(&self, key: &SessionKey) -> Option<StructureSlot> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Locks the slot for `key`, registering an empty one if there is none.
    ///
    /// The returned guard belongs to the slot currently registered for the
    /// key. A fresh slot is locked before it becomes visible, so nobody else
    /// observes it empty.
    pub async fn lock_or_insert(&self, key: &SessionKey) -> SlotGuard {
        loop {
            let slot = match self.claim(key) {
                Claim::Fresh(guard) => return guard,
                Claim::Existing(slot) => slot,
            };
            let guard = Arc::clone(&slot).lock_owned().await;
            // A finish may have retired the slot while we waited.
            if self.is_registered(key, &slot) {
                return guard;
            }
        }
    }

    /// Inserts `structure` for the key, replacing any previous structure.
    ///
    /// Returns the structure it replaced.
    pub async fn put(
        &self,
        session_id: &str,
        process_id: &str,
        structure: ContentStructure,
    ) -> Option<ContentStructure> {
        let mut guard = self
            .lock_or_insert(&SessionKey::new(session_id, process_id))
            .await;
        guard.replace(structure)
    }

    /// Removes the entry for the key once in-flight navigation on it has
    /// finished. Removing an absent key is a no-op.
    pub async fn remove(&self, session_id: &str, process_id: &str) -> Option<ContentStructure> {
        let key = SessionKey::new(session_id, process_id);
        loop {
            let slot = self.get_key(&key)?;
            let mut guard = Arc::clone(&slot).lock_owned().await;
            if !self.is_registered(&key, &slot) {
                continue;
            }
            let removed = guard.take();
            self.entries
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&key);
            return removed;
        }
    }

    /// Number of live structures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no structure is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn claim(&self, key: &SessionKey) -> Claim {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.entry(key.clone()) {
            Entry::Occupied(occupied) => Claim::Existing(Arc::clone(occupied.get())),
            Entry::Vacant(vacant) => {
                let slot = StructureSlot::default();
                match Arc::clone(&slot).try_lock_owned() {
                    Ok(guard) => {
                        vacant.insert(slot);
                        Claim::Fresh(guard)
                    }
                    Err(_) => {
                        vacant.insert(Arc::clone(&slot));
                        Claim::Existing(slot)
                    }
                }
            }
        }
    }

    fn is_registered(&self, key: &SessionKey, slot: &StructureSlot) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .is_some_and(|registered| Arc::ptr_eq(registered, slot))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use cns_structure::domain::definition::NodeDefinition;

    fn structure(process_id: &str) -> ContentStructure {
        ContentStructure::new(process_id, [NodeDefinition::new("A", "Alpha")])
    }

    #[test]
    fn test_get_on_empty_registry_returns_none() {
        let registry = SessionRegistry::new();

        assert!(registry.get("s-1", "proc/42").is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_put_then_get_returns_structure() {
        // Arrange
        let registry = SessionRegistry::new();

        // Act
        let replaced = registry.put("s-1", "proc/42", structure("proc/42")).await;
        let fetched = registry.get("s-1", "proc/42").unwrap();

        // Assert
        assert!(replaced.is_none());
        let guard = fetched.lock().await;
        assert_eq!(guard.as_ref().unwrap().process_id(), "proc/42");
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_put_replaces_structure_in_the_same_slot() {
        // Arrange
        let registry = SessionRegistry::new();
        registry.put("s-1", "proc/42", structure("proc/42")).await;
        let first = registry.get("s-1", "proc/42").unwrap();
        let mut started = structure("proc/42");
        started.start().unwrap();

        // Act
        let replaced = registry.put("s-1", "proc/42", started).await;

        // Assert
        assert!(!replaced.unwrap().is_started());
        let second = registry.get("s-1", "proc/42").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(second.lock().await.as_ref().unwrap().is_started());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_one_session_can_hold_several_processes() {
        // Arrange
        let registry = SessionRegistry::new();
        registry.put("s-1", "proc/1", structure("proc/1")).await;
        registry.put("s-1", "proc/2", structure("proc/2")).await;

        // Act
        registry.remove("s-1", "proc/1").await;

        // Assert
        assert!(registry.get("s-1", "proc/1").is_none());
        assert!(registry.get("s-1", "proc/2").is_some());
    }

    #[tokio::test]
    async fn test_keys_do_not_collide_when_concatenated() {
        // Arrange
        let registry = SessionRegistry::new();
        registry.put("ab", "c", structure("c")).await;

        // Act & Assert
        assert!(registry.get("a", "bc").is_none());
    }

    #[tokio::test]
    async fn test_remove_absent_key_is_noop() {
        // Arrange
        let registry = SessionRegistry::new();
        registry.put("s-1", "proc/42", structure("proc/42")).await;

        // Act
        let removed = registry.remove("s-2", "proc/42").await;

        // Assert
        assert!(removed.is_none());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_removed_slot_is_left_empty_for_late_holders() {
        // Arrange
        let registry = SessionRegistry::new();
        registry.put("s-1", "proc/42", structure("proc/42")).await;
        let stale = registry.get("s-1", "proc/42").unwrap();

        // Act
        let removed = registry.remove("s-1", "proc/42").await;

        // Assert
        assert!(removed.is_some());
        assert!(stale.lock().await.is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_remove_waits_for_the_slot_lock() {
        // Arrange
        let registry = Arc::new(SessionRegistry::new());
        registry.put("s-1", "proc/42", structure("proc/42")).await;
        let key = SessionKey::new("s-1", "proc/42");
        let held = registry.lock_or_insert(&key).await;

        // Act
        let remover = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.remove("s-1", "proc/42").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let still_registered = registry.get_key(&key).is_some();
        drop(held);
        let removed = remover.await.unwrap();

        // Assert
        assert!(still_registered);
        assert!(removed.is_some());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_lock_or_insert_after_remove_registers_a_new_slot() {
        // Arrange
        let registry = SessionRegistry::new();
        registry.put("s-1", "proc/42", structure("proc/42")).await;
        let old = registry.get("s-1", "proc/42").unwrap();
        registry.remove("s-1", "proc/42").await;

        // Act
        let mut guard = registry
            .lock_or_insert(&SessionKey::new("s-1", "proc/42"))
            .await;
        guard.replace(structure("proc/42"));
        drop(guard);

        // Assert
        let new = registry.get("s-1", "proc/42").unwrap();
        assert!(!Arc::ptr_eq(&old, &new));
        assert!(old.lock().await.is_none());
        assert_eq!(registry.len(), 1);
    }
}
