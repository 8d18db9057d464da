//! Entity and component storage
//!
//! Entities live in a hash map keyed by id, with a creation-order index so
//! queries come back in a stable order. Component instances live in a slot
//! map arena; each record remembers its owner and type, so removal by
//! [`ComponentId`] needs no search.
//!
//! Every mutation is announced on the event bus synchronously. Components of
//! a physics or drawable kind additionally fire the derived collaborator
//! events, except on the bulk setup/teardown paths.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;
use slotmap::SlotMap;
use thiserror::Error;

use super::component::ComponentType;
use super::{ComponentId, ComponentInstance, ComponentKind, EntityId, EntitySnapshot, QueryMatch};
use crate::events::{names, EventArg, EventBus};
use crate::foundation::ids::EntityIdGenerator;

/// Entity store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The target entity does not exist
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// No component type with this name was registered
    #[error("Component type not registered: {0}")]
    ComponentNotRegistered(String),
}

#[derive(Debug)]
struct EntityRecord {
    seq: u64,
    components: BTreeMap<String, Vec<ComponentId>>,
}

#[derive(Debug)]
struct ComponentRecord {
    entity: EntityId,
    type_name: String,
    kind: ComponentKind,
    value: Value,
}

impl ComponentRecord {
    fn instance(&self, id: ComponentId) -> ComponentInstance {
        ComponentInstance {
            id,
            kind: self.kind,
            value: self.value.clone(),
        }
    }
}

/// Owns entities, component registrations and component instances
#[derive(Debug)]
pub struct EntityStore {
    types: HashMap<String, ComponentType>,
    entities: HashMap<EntityId, EntityRecord>,
    order: BTreeMap<u64, EntityId>,
    components: SlotMap<ComponentId, ComponentRecord>,
    next_seq: u64,
    ids: EntityIdGenerator,
    events: EventBus,
}

impl EntityStore {
    /// Create an empty store announcing changes on `events`
    pub fn new(events: EventBus) -> Self {
        Self::with_id_generator(events, EntityIdGenerator::default())
    }

    /// Create an empty store with a custom id generator
    pub fn with_id_generator(events: EventBus, ids: EntityIdGenerator) -> Self {
        Self {
            types: HashMap::new(),
            entities: HashMap::new(),
            order: BTreeMap::new(),
            components: SlotMap::with_key(),
            next_seq: 0,
            ids,
            events,
        }
    }

    /// Bus this store announces on
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    // -- Component types --

    /// Register a plain component type
    ///
    /// Registering a name again replaces its factory. Existing instances are
    /// left as they are.
    pub fn register_component<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(Value) -> Value + 'static,
    {
        self.register_component_with_kind(name, ComponentKind::Plain, factory)
    }

    /// Register a component type with an explicit kind
    pub fn register_component_with_kind<F>(
        &mut self,
        name: impl Into<String>,
        kind: ComponentKind,
        factory: F,
    ) -> &mut Self
    where
        F: Fn(Value) -> Value + 'static,
    {
        let name = name.into();
        let previous = self.types.insert(
            name.clone(),
            ComponentType {
                kind,
                factory: Box::new(factory),
            },
        );
        if previous.is_some() {
            log::debug!("Component type '{}' re-registered as {:?}", name, kind);
        } else {
            log::debug!("Component type '{}' registered as {:?}", name, kind);
        }
        self
    }

    /// Whether a component type exists
    pub fn is_registered(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Kind of a registered component type
    pub fn component_kind(&self, name: &str) -> Option<ComponentKind> {
        self.types.get(name).map(|component_type| component_type.kind)
    }

    // -- Entity lifecycle --

    /// Create an entity with a generated id
    pub fn create(&mut self) -> EntityId {
        let id = loop {
            let candidate = self.ids.next_id();
            if !self.entities.contains_key(candidate.as_str()) {
                break EntityId::from(candidate);
            }
        };
        self.insert_entity(id)
    }

    /// Create an entity with a caller-chosen id
    ///
    /// An id that is already live is returned unchanged; nothing is emitted.
    pub fn create_with_id(&mut self, id: impl Into<EntityId>) -> EntityId {
        let id = id.into();
        if self.entities.contains_key(id.as_str()) {
            log::warn!("Entity '{}' already exists, create ignored", id);
            return id;
        }
        self.insert_entity(id)
    }

    fn insert_entity(&mut self, id: EntityId) -> EntityId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entities.insert(
            id.clone(),
            EntityRecord {
                seq,
                components: BTreeMap::new(),
            },
        );
        self.order.insert(seq, id.clone());
        log::trace!("Entity '{}' created", id);
        self.events
            .emit_immediate(names::ENTITY_CREATED, vec![EventArg::Entity(id.clone())]);
        id
    }

    /// Remove an entity and everything it owns
    ///
    /// `entity:removing` fires while the data is still readable, then the
    /// components are stripped without derived events, then
    /// `entity:removed` fires. Unknown ids are a no-op.
    pub fn remove(&mut self, entity: &str) -> bool {
        let Some(snapshot) = self.get(entity) else {
            return false;
        };
        let id = snapshot.entity.clone();
        self.events.emit_immediate(
            names::ENTITY_REMOVING,
            vec![
                EventArg::Entity(id.clone()),
                EventArg::Names(snapshot.type_names()),
                EventArg::Snapshot(snapshot),
            ],
        );

        self.remove_on_clear(&id);
        if let Some(record) = self.entities.remove(id.as_str()) {
            self.order.remove(&record.seq);
        }
        log::trace!("Entity '{}' removed", id);
        self.events
            .emit_immediate(names::ENTITY_REMOVED, vec![EventArg::Entity(id)]);
        true
    }

    /// Remove every entity, oldest first
    pub fn clear(&mut self) {
        let ids: Vec<EntityId> = self.order.values().cloned().collect();
        for id in ids {
            self.remove(&id);
        }
    }

    /// Whether an entity exists
    pub fn contains(&self, entity: &str) -> bool {
        self.entities.contains_key(entity)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of live component instances
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Live entity ids in creation order
    pub fn entities(&self) -> Vec<EntityId> {
        self.order.values().cloned().collect()
    }

    /// Snapshot of an entity and all of its components
    pub fn get(&self, entity: &str) -> Option<EntitySnapshot> {
        let (id, record) = self.entities.get_key_value(entity)?;
        Some(self.snapshot(id, record, |_| true))
    }

    // -- Components --

    /// Attach a component, firing derived collaborator events
    pub fn add_component(
        &mut self,
        entity: &str,
        type_name: &str,
        raw: Value,
    ) -> Result<ComponentId, StoreError> {
        self.attach(entity, type_name, raw, true)
    }

    /// Attach a component without derived collaborator events
    ///
    /// Storage and `component:added` are identical to
    /// [`add_component`](Self::add_component); used for bulk scene loading.
    pub fn add_component_setup(
        &mut self,
        entity: &str,
        type_name: &str,
        raw: Value,
    ) -> Result<ComponentId, StoreError> {
        self.attach(entity, type_name, raw, false)
    }

    fn attach(
        &mut self,
        entity: &str,
        type_name: &str,
        raw: Value,
        derived: bool,
    ) -> Result<ComponentId, StoreError> {
        let entity_id = self
            .entities
            .get_key_value(entity)
            .map(|(id, _)| id.clone())
            .ok_or_else(|| StoreError::EntityNotFound(EntityId::from(entity)))?;
        let component_type = self
            .types
            .get(type_name)
            .ok_or_else(|| StoreError::ComponentNotRegistered(type_name.to_string()))?;

        let kind = component_type.kind;
        let value = (component_type.factory)(raw.clone());
        let derived_event = if derived { kind.added_event() } else { None };
        let derived_value = derived_event.map(|_| value.clone());

        let id = self.components.insert(ComponentRecord {
            entity: entity_id.clone(),
            type_name: type_name.to_string(),
            kind,
            value,
        });
        if let Some(record) = self.entities.get_mut(entity) {
            record
                .components
                .entry(type_name.to_string())
                .or_default()
                .push(id);
        }
        log::trace!("Component '{}' {} added to '{}'", type_name, id, entity_id);

        self.events.emit_immediate(
            names::COMPONENT_ADDED,
            vec![
                EventArg::Entity(entity_id.clone()),
                EventArg::Text(type_name.to_string()),
                EventArg::Data(raw),
                EventArg::Component(id),
            ],
        );
        if let (Some(event), Some(value)) = (derived_event, derived_value) {
            self.events.emit_immediate(
                event,
                vec![
                    EventArg::Entity(entity_id),
                    EventArg::Component(id),
                    EventArg::Data(value),
                ],
            );
        }
        Ok(id)
    }

    /// Remove every instance of a type from an entity
    ///
    /// Returns how many instances were removed; zero means nothing happened
    /// and nothing was emitted.
    pub fn remove_component(&mut self, entity: &str, type_name: &str) -> usize {
        let ids = self
            .entities
            .get(entity)
            .and_then(|record| record.components.get(type_name))
            .cloned()
            .unwrap_or_default();
        ids.into_iter()
            .filter(|id| self.detach(*id, true))
            .count()
    }

    /// Remove one instance by its id
    pub fn remove_component_by_id(&mut self, id: ComponentId) -> bool {
        self.detach(id, true)
    }

    /// Strip every component from an entity without derived events
    ///
    /// The bulk-teardown counterpart of
    /// [`add_component_setup`](Self::add_component_setup). The entity itself
    /// stays alive.
    pub fn remove_on_clear(&mut self, entity: &str) -> usize {
        let ids: Vec<ComponentId> = self
            .entities
            .get(entity)
            .map(|record| record.components.values().flatten().copied().collect())
            .unwrap_or_default();
        ids.into_iter()
            .filter(|id| self.detach(*id, false))
            .count()
    }

    fn detach(&mut self, id: ComponentId, derived: bool) -> bool {
        let Some(record) = self.components.remove(id) else {
            return false;
        };
        if let Some(owner) = self.entities.get_mut(record.entity.as_str()) {
            if let Some(ids) = owner.components.get_mut(&record.type_name) {
                ids.retain(|owned| *owned != id);
                if ids.is_empty() {
                    owner.components.remove(&record.type_name);
                }
            }
        }
        log::trace!("Component '{}' {} removed from '{}'", record.type_name, id, record.entity);

        let derived_event = if derived { record.kind.removed_event() } else { None };
        let derived_value = derived_event.map(|_| record.value.clone());
        self.events.emit_immediate(
            names::COMPONENT_REMOVED,
            vec![
                EventArg::Entity(record.entity.clone()),
                EventArg::Text(record.type_name),
                EventArg::Data(record.value),
                EventArg::Component(id),
            ],
        );
        if let (Some(event), Some(value)) = (derived_event, derived_value) {
            self.events.emit_immediate(
                event,
                vec![
                    EventArg::Entity(record.entity),
                    EventArg::Component(id),
                    EventArg::Data(value),
                ],
            );
        }
        true
    }

    /// Copy of one component instance
    pub fn component(&self, id: ComponentId) -> Option<ComponentInstance> {
        self.components.get(id).map(|record| record.instance(id))
    }

    /// Owner entity and type name of a component instance
    pub fn component_owner(&self, id: ComponentId) -> Option<(&EntityId, &str)> {
        self.components
            .get(id)
            .map(|record| (&record.entity, record.type_name.as_str()))
    }

    /// Mutable access to a stored value
    ///
    /// This is the write path for systems; it fires no events.
    pub fn component_value_mut(&mut self, id: ComponentId) -> Option<&mut Value> {
        self.components.get_mut(id).map(|record| &mut record.value)
    }

    /// Instances of one type on one entity
    pub fn components_of(&self, entity: &str, type_name: &str) -> Vec<ComponentInstance> {
        self.entities
            .get(entity)
            .and_then(|record| record.components.get(type_name))
            .map(|ids| self.instances(ids))
            .unwrap_or_default()
    }

    /// Every instance of a kind with its owner, in entity creation order
    pub fn components_of_kind(&self, kind: ComponentKind) -> Vec<(EntityId, ComponentInstance)> {
        let mut found = Vec::new();
        for id in self.order.values() {
            let Some(record) = self.entities.get(id) else {
                continue;
            };
            for component_id in record.components.values().flatten() {
                if let Some(component) = self.components.get(*component_id) {
                    if component.kind == kind {
                        found.push((id.clone(), component.instance(*component_id)));
                    }
                }
            }
        }
        found
    }

    // -- Queries --

    /// Entities owning every listed type
    ///
    /// Each match carries only the requested types. An empty list matches
    /// every entity.
    pub fn query(&self, types: &[&str]) -> Vec<QueryMatch> {
        self.matching(|record| types.iter().all(|t| record.components.contains_key(*t)), types)
    }

    /// Entities owning at least one listed type
    ///
    /// Each match carries only the requested types it actually owns. An
    /// empty list matches nothing.
    pub fn query_with_any(&self, types: &[&str]) -> Vec<QueryMatch> {
        self.matching(|record| types.iter().any(|t| record.components.contains_key(*t)), types)
    }

    fn matching<P>(&self, predicate: P, types: &[&str]) -> Vec<QueryMatch>
    where
        P: Fn(&EntityRecord) -> bool,
    {
        self.order
            .values()
            .filter_map(|id| self.entities.get_key_value(id.as_str()))
            .filter(|(_, record)| predicate(*record))
            .map(|(id, record)| self.snapshot(id, record, |name| types.contains(&name)))
            .collect()
    }

    fn snapshot<F>(&self, id: &EntityId, record: &EntityRecord, include: F) -> EntitySnapshot
    where
        F: Fn(&str) -> bool,
    {
        let components = record
            .components
            .iter()
            .filter(|(name, _)| include(name.as_str()))
            .map(|(name, ids)| (name.clone(), self.instances(ids)))
            .collect();
        EntitySnapshot {
            entity: id.clone(),
            components,
        }
    }

    fn instances(&self, ids: &[ComponentId]) -> Vec<ComponentInstance> {
        ids.iter()
            .filter_map(|id| self.components.get(*id).map(|record| record.instance(*id)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording_store() -> (EntityStore, Rc<RefCell<Vec<String>>>) {
        let bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for name in [
            names::ENTITY_CREATED,
            names::ENTITY_REMOVING,
            names::ENTITY_REMOVED,
            names::COMPONENT_ADDED,
            names::COMPONENT_REMOVED,
            names::PHYSICS_ADD_BODY,
            names::PHYSICS_REMOVE_BODY,
            names::ADD_DRAWABLE,
            names::REMOVE_DRAWABLE,
        ] {
            let sink = Rc::clone(&log);
            bus.on(name, move |event| {
                sink.borrow_mut().push(event.name.clone());
                Ok(())
            });
        }
        let mut store = EntityStore::with_id_generator(bus, EntityIdGenerator::with_seed("e_", 3));
        store
            .register_component("Pos", |raw| raw)
            .register_component_with_kind("Body", ComponentKind::PhysicsBody, |raw| raw)
            .register_component_with_kind("Sprite", ComponentKind::Drawable, |raw| raw);
        (store, log)
    }

    #[test]
    fn test_add_then_remove_component() {
        let (mut store, _) = recording_store();
        let e = store.create();

        store.add_component(&e, "Pos", json!({"x": 1, "y": 2})).unwrap();
        let snapshot = store.get(&e).unwrap();
        assert_eq!(snapshot.first("Pos"), Some(&json!({"x": 1, "y": 2})));

        assert_eq!(store.remove_component(&e, "Pos"), 1);
        assert!(!store.get(&e).unwrap().has("Pos"));
        assert_eq!(store.component_count(), 0);
    }

    #[test]
    fn test_add_component_errors() {
        let (mut store, _) = recording_store();
        let missing = store.add_component("ghost", "Pos", json!(null));
        assert_eq!(missing, Err(StoreError::EntityNotFound(EntityId::from("ghost"))));

        let e = store.create();
        let unknown = store.add_component(&e, "Velocity", json!(null));
        assert_eq!(unknown, Err(StoreError::ComponentNotRegistered("Velocity".to_string())));
    }

    #[test]
    fn test_factory_output_is_stored() {
        let (mut store, _) = recording_store();
        store.register_component("Health", |raw| json!({ "hp": raw["max"].clone(), "max": raw["max"].clone() }));
        let e = store.create_with_id("hero");

        let id = store.add_component(&e, "Health", json!({"max": 10})).unwrap();
        assert_eq!(store.component(id).unwrap().value, json!({"hp": 10, "max": 10}));
        assert_eq!(store.component_owner(id), Some((&e, "Health")));
    }

    #[test]
    fn test_multiple_instances_per_type() {
        let (mut store, _) = recording_store();
        let e = store.create();
        let first = store.add_component(&e, "Pos", json!(1)).unwrap();
        let second = store.add_component(&e, "Pos", json!(2)).unwrap();
        assert_ne!(first, second);
        assert_eq!(store.components_of(&e, "Pos").len(), 2);

        assert!(store.remove_component_by_id(first));
        assert!(!store.remove_component_by_id(first));
        let remaining = store.components_of(&e, "Pos");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, second);

        assert!(store.remove_component_by_id(second));
        assert!(!store.get(&e).unwrap().has("Pos"));
    }

    #[test]
    fn test_remove_entity_is_idempotent_and_leaves_no_components() {
        let (mut store, log) = recording_store();
        let e = store.create();
        let body = store.add_component(&e, "Body", json!({"mass": 1})).unwrap();
        store.add_component(&e, "Pos", json!({})).unwrap();
        log.borrow_mut().clear();

        assert!(store.remove(&e));
        assert!(!store.remove(&e));

        assert!(!store.contains(&e));
        assert!(store.component(body).is_none());
        assert_eq!(store.component_count(), 0);
        assert_eq!(
            *log.borrow(),
            vec![
                names::ENTITY_REMOVING,
                names::COMPONENT_REMOVED,
                names::COMPONENT_REMOVED,
                names::ENTITY_REMOVED,
            ]
        );
    }

    #[test]
    fn test_removing_event_sees_data_before_teardown() {
        let (mut store, _) = recording_store();
        let e = store.create();
        store.add_component(&e, "Pos", json!({"x": 5})).unwrap();

        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        store.events().on(names::ENTITY_REMOVING, move |event| {
            let owned = event.arg(1).and_then(EventArg::as_names).map(<[String]>::to_vec);
            let snapshot = event.arg(2).and_then(EventArg::as_snapshot).cloned();
            *sink.borrow_mut() = Some((owned, snapshot));
            Ok(())
        });
        store.remove(&e);

        let (owned, snapshot) = seen.borrow_mut().take().unwrap();
        assert_eq!(owned, Some(vec!["Pos".to_string()]));
        assert_eq!(snapshot.unwrap().first("Pos"), Some(&json!({"x": 5})));
    }

    #[test]
    fn test_derived_events_follow_component_kind() {
        let (mut store, log) = recording_store();
        let e = store.create();
        log.borrow_mut().clear();

        store.add_component(&e, "Body", json!({})).unwrap();
        assert_eq!(*log.borrow(), vec![names::COMPONENT_ADDED, names::PHYSICS_ADD_BODY]);
        log.borrow_mut().clear();

        store.add_component(&e, "Pos", json!({})).unwrap();
        assert_eq!(*log.borrow(), vec![names::COMPONENT_ADDED]);
        log.borrow_mut().clear();

        store.add_component(&e, "Sprite", json!({})).unwrap();
        assert_eq!(*log.borrow(), vec![names::COMPONENT_ADDED, names::ADD_DRAWABLE]);
        log.borrow_mut().clear();

        store.remove_component(&e, "Sprite");
        assert_eq!(*log.borrow(), vec![names::COMPONENT_REMOVED, names::REMOVE_DRAWABLE]);
    }

    #[test]
    fn test_setup_and_clear_paths_skip_derived_events() {
        let (mut store, log) = recording_store();
        let e = store.create();
        log.borrow_mut().clear();

        store.add_component_setup(&e, "Body", json!({})).unwrap();
        store.add_component_setup(&e, "Sprite", json!({})).unwrap();
        store.add_component_setup(&e, "Pos", json!({})).unwrap();
        assert_eq!(*log.borrow(), vec![names::COMPONENT_ADDED; 3]);
        log.borrow_mut().clear();

        assert_eq!(store.remove_on_clear(&e), 3);
        assert_eq!(*log.borrow(), vec![names::COMPONENT_REMOVED; 3]);
        assert!(store.contains(&e));
    }

    #[test]
    fn test_remove_missing_is_silent() {
        let (mut store, log) = recording_store();
        let e = store.create();
        log.borrow_mut().clear();

        assert_eq!(store.remove_component(&e, "Pos"), 0);
        assert_eq!(store.remove_component("ghost", "Pos"), 0);
        assert_eq!(store.remove_on_clear("ghost"), 0);
        assert!(!store.remove("ghost"));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_query_all_and_any() {
        let (mut store, _) = recording_store();
        let a = store.create_with_id("a");
        let b = store.create_with_id("b");
        let c = store.create_with_id("c");
        store.register_component("A", |raw| raw).register_component("B", |raw| raw);
        store.add_component(&a, "A", json!(1)).unwrap();
        store.add_component(&a, "B", json!(2)).unwrap();
        store.add_component(&b, "A", json!(3)).unwrap();
        store.add_component(&c, "Pos", json!(4)).unwrap();

        let both = store.query(&["A", "B"]);
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].entity, a);
        assert_eq!(both[0].type_names(), vec!["A", "B"]);

        let any = store.query_with_any(&["A", "B"]);
        let ids: Vec<&str> = any.iter().map(|m| m.entity.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(any[1].type_names(), vec!["A"]);

        assert_eq!(store.query(&[]).len(), 3);
        assert!(store.query_with_any(&[]).is_empty());
    }

    #[test]
    fn test_query_results_are_copies() {
        let (mut store, _) = recording_store();
        let e = store.create();
        let id = store.add_component(&e, "Pos", json!({"x": 1})).unwrap();

        let mut results = store.query(&["Pos"]);
        results[0].components.clear();
        assert_eq!(store.query(&["Pos"])[0].first("Pos"), Some(&json!({"x": 1})));

        if let Some(value) = store.component_value_mut(id) {
            value["x"] = json!(9);
        }
        assert_eq!(store.get(&e).unwrap().first("Pos"), Some(&json!({"x": 9})));
    }

    #[test]
    fn test_create_with_existing_id_is_ignored() {
        let (mut store, log) = recording_store();
        store.create_with_id("dup");
        log.borrow_mut().clear();

        let again = store.create_with_id("dup");
        assert_eq!(again, "dup");
        assert_eq!(store.entity_count(), 1);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_reregistration_keeps_existing_instances() {
        let (mut store, _) = recording_store();
        let e = store.create();
        let old = store.add_component(&e, "Pos", json!(1)).unwrap();

        store.register_component_with_kind("Pos", ComponentKind::Drawable, |_| json!("new"));
        let new = store.add_component(&e, "Pos", json!(1)).unwrap();

        assert_eq!(store.component(old).unwrap().kind, ComponentKind::Plain);
        assert_eq!(store.component(old).unwrap().value, json!(1));
        assert_eq!(store.component(new).unwrap().kind, ComponentKind::Drawable);
        assert_eq!(store.component(new).unwrap().value, json!("new"));
    }

    #[test]
    fn test_components_of_kind_in_creation_order() {
        let (mut store, _) = recording_store();
        let first = store.create_with_id("z");
        let second = store.create_with_id("a");
        store.add_component_setup(&second, "Body", json!(2)).unwrap();
        store.add_component_setup(&first, "Body", json!(1)).unwrap();
        store.add_component_setup(&first, "Sprite", json!(0)).unwrap();

        let bodies = store.components_of_kind(ComponentKind::PhysicsBody);
        let owners: Vec<&str> = bodies.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(owners, vec!["z", "a"]);
    }

    #[test]
    fn test_clear_removes_everything() {
        let (mut store, _) = recording_store();
        for _ in 0..4 {
            let e = store.create();
            store.add_component(&e, "Pos", json!({})).unwrap();
        }
        store.clear();
        assert_eq!(store.entity_count(), 0);
        assert_eq!(store.component_count(), 0);
        assert!(store.entities().is_empty());
    }
}
