//! Handle to entity reverse index
//!
//! Collaborators receive entity ids when bodies are added but report
//! collisions by their own handles. `BodyIndex` keeps both directions so
//! either lookup is O(1) and removing an entity drops every handle it owned.

use std::collections::HashMap;
use std::hash::Hash;

use crate::ecs::EntityId;

/// Bidirectional map between collaborator handles and entities
#[derive(Debug, Clone)]
pub struct BodyIndex<H> {
    owners: HashMap<H, EntityId>,
    handles: HashMap<EntityId, Vec<H>>,
}

impl<H: Copy + Eq + Hash> BodyIndex<H> {
    /// Create an empty index
    pub fn new() -> Self {
        Self {
            owners: HashMap::new(),
            handles: HashMap::new(),
        }
    }

    /// Record that `handle` belongs to `entity`
    ///
    /// A handle already present is moved to the new owner.
    pub fn insert(&mut self, handle: H, entity: EntityId) {
        self.remove(handle);
        self.handles.entry(entity.clone()).or_default().push(handle);
        self.owners.insert(handle, entity);
    }

    /// Forget a handle; returns its owner
    pub fn remove(&mut self, handle: H) -> Option<EntityId> {
        let owner = self.owners.remove(&handle)?;
        if let Some(handles) = self.handles.get_mut(owner.as_str()) {
            handles.retain(|h| *h != handle);
            if handles.is_empty() {
                self.handles.remove(owner.as_str());
            }
        }
        Some(owner)
    }

    /// Forget every handle of an entity; returns them in insertion order
    pub fn remove_entity(&mut self, entity: &str) -> Vec<H> {
        let handles = self.handles.remove(entity).unwrap_or_default();
        for handle in &handles {
            self.owners.remove(handle);
        }
        handles
    }

    /// Owner of a handle
    pub fn entity_of(&self, handle: H) -> Option<&EntityId> {
        self.owners.get(&handle)
    }

    /// Handles owned by an entity
    pub fn handles_of(&self, entity: &str) -> &[H] {
        self.handles.get(entity).map_or(&[], Vec::as_slice)
    }

    /// Whether a handle is indexed
    pub fn contains(&self, handle: H) -> bool {
        self.owners.contains_key(&handle)
    }

    /// Number of indexed handles
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.owners.clear();
        self.handles.clear();
    }
}

impl<H: Copy + Eq + Hash> Default for BodyIndex<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_both_directions() {
        let mut index = BodyIndex::new();
        index.insert(1_u32, EntityId::from("ship"));
        index.insert(2, EntityId::from("ship"));
        index.insert(3, EntityId::from("rock"));

        assert_eq!(index.entity_of(2).map(EntityId::as_str), Some("ship"));
        assert_eq!(index.handles_of("ship"), &[1, 2]);
        assert_eq!(index.len(), 3);

        assert_eq!(index.remove(1), Some(EntityId::from("ship")));
        assert_eq!(index.remove(1), None);
        assert_eq!(index.handles_of("ship"), &[2]);
    }

    #[test]
    fn test_remove_entity_drops_all_handles() {
        let mut index = BodyIndex::new();
        index.insert(7_u32, EntityId::from("a"));
        index.insert(8, EntityId::from("a"));
        index.insert(9, EntityId::from("b"));

        assert_eq!(index.remove_entity("a"), vec![7, 8]);
        assert!(!index.contains(7));
        assert!(index.remove_entity("a").is_empty());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_reinsert_moves_handle() {
        let mut index = BodyIndex::new();
        index.insert(1_u32, EntityId::from("a"));
        index.insert(1, EntityId::from("b"));

        assert!(index.handles_of("a").is_empty());
        assert_eq!(index.entity_of(1), Some(&EntityId::from("b")));
    }
}
