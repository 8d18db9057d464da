//! Query results
//!
//! Everything a query or `get` returns is an owned copy. Mutating it never
//! touches the store; systems write back through
//! [`EntityStore::component_value_mut`](super::EntityStore::component_value_mut).

use std::collections::BTreeMap;

use serde_json::Value;

use super::{ComponentInstance, EntityId};

/// Component instances grouped by type name
pub type ComponentMap = BTreeMap<String, Vec<ComponentInstance>>;

/// Copy of one entity and the components it owns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntitySnapshot {
    /// Entity identifier
    pub entity: EntityId,
    /// Every owned type mapped to its instances
    pub components: ComponentMap,
}

/// One entity matched by a query
///
/// Only the requested types that are present are included.
pub type QueryMatch = EntitySnapshot;

impl EntitySnapshot {
    /// Names of the owned component types
    pub fn type_names(&self) -> Vec<String> {
        self.components.keys().cloned().collect()
    }

    /// Whether the entity carries a type
    pub fn has(&self, type_name: &str) -> bool {
        self.components.contains_key(type_name)
    }

    /// Instances of one type
    pub fn instances(&self, type_name: &str) -> &[ComponentInstance] {
        self.components.get(type_name).map_or(&[], Vec::as_slice)
    }

    /// Value of the first instance of a type
    pub fn first(&self, type_name: &str) -> Option<&Value> {
        self.instances(type_name).first().map(|instance| &instance.value)
    }

    /// Values of every instance of a type
    pub fn values(&self, type_name: &str) -> Vec<&Value> {
        self.instances(type_name).iter().map(|instance| &instance.value).collect()
    }
}
