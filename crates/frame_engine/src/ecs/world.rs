//! World handed to systems
//!
//! A [`World`] bundles the entity store with the event bus it announces on.
//! Systems get `&mut World` in every lifecycle hook; there is no global
//! engine instance to reach for.

use serde_json::Value;

use super::{ComponentId, ComponentInstance, ComponentKind, EntityId, EntitySnapshot, EntityStore, QueryMatch, StoreError};
use crate::events::{Event, EventArg, EventBus, EventError, ListenerId, ListenerResult, Subscription};
use crate::foundation::ids::EntityIdGenerator;

/// Entity store plus event bus
#[derive(Debug)]
pub struct World {
    store: EntityStore,
    events: EventBus,
    stop_requested: bool,
}

impl World {
    /// Create an empty world with a fresh bus
    pub fn new() -> Self {
        Self::with_parts(EventBus::new(), EntityIdGenerator::default())
    }

    /// Create an empty world from an existing bus and id generator
    pub fn with_parts(events: EventBus, ids: EntityIdGenerator) -> Self {
        Self {
            store: EntityStore::with_id_generator(events.clone(), ids),
            events,
            stop_requested: false,
        }
    }

    /// Entity store
    pub const fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Mutable entity store
    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    /// Event bus; clone it to keep a handle inside a listener
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Ask the engine loop to stop once the current frame completes
    pub fn request_stop(&mut self) {
        log::debug!("Stop requested");
        self.stop_requested = true;
    }

    /// Whether a stop was requested and not yet consumed
    pub const fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    /// Consume a pending stop request
    pub fn take_stop_request(&mut self) -> bool {
        std::mem::take(&mut self.stop_requested)
    }

    // Entities

    /// See [`EntityStore::register_component`]
    pub fn register_component<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(Value) -> Value + 'static,
    {
        self.store.register_component(name, factory);
        self
    }

    /// See [`EntityStore::register_component_with_kind`]
    pub fn register_component_with_kind<F>(
        &mut self,
        name: impl Into<String>,
        kind: ComponentKind,
        factory: F,
    ) -> &mut Self
    where
        F: Fn(Value) -> Value + 'static,
    {
        self.store.register_component_with_kind(name, kind, factory);
        self
    }

    /// Create an entity with a generated id
    pub fn create(&mut self) -> EntityId {
        self.store.create()
    }

    /// Create an entity with a chosen id
    pub fn create_with_id(&mut self, id: impl Into<EntityId>) -> EntityId {
        self.store.create_with_id(id)
    }

    /// Remove an entity and its components
    pub fn remove(&mut self, entity: &str) -> bool {
        self.store.remove(entity)
    }

    /// Snapshot of an entity
    pub fn get(&self, entity: &str) -> Option<EntitySnapshot> {
        self.store.get(entity)
    }

    /// Whether an entity exists
    pub fn contains(&self, entity: &str) -> bool {
        self.store.contains(entity)
    }

    /// Attach a component
    pub fn add_component(&mut self, entity: &str, type_name: &str, raw: Value) -> Result<ComponentId, StoreError> {
        self.store.add_component(entity, type_name, raw)
    }

    /// Attach a component on the bulk path
    pub fn add_component_setup(
        &mut self,
        entity: &str,
        type_name: &str,
        raw: Value,
    ) -> Result<ComponentId, StoreError> {
        self.store.add_component_setup(entity, type_name, raw)
    }

    /// Remove every instance of a type from an entity
    pub fn remove_component(&mut self, entity: &str, type_name: &str) -> usize {
        self.store.remove_component(entity, type_name)
    }

    /// Remove one instance by id
    pub fn remove_component_by_id(&mut self, id: ComponentId) -> bool {
        self.store.remove_component_by_id(id)
    }

    /// Strip components without derived events
    pub fn remove_on_clear(&mut self, entity: &str) -> usize {
        self.store.remove_on_clear(entity)
    }

    /// Copy of one component instance
    pub fn component(&self, id: ComponentId) -> Option<ComponentInstance> {
        self.store.component(id)
    }

    /// Mutable stored value
    pub fn component_value_mut(&mut self, id: ComponentId) -> Option<&mut Value> {
        self.store.component_value_mut(id)
    }

    /// ALL-match query
    pub fn query(&self, types: &[&str]) -> Vec<QueryMatch> {
        self.store.query(types)
    }

    /// ANY-match query
    pub fn query_with_any(&self, types: &[&str]) -> Vec<QueryMatch> {
        self.store.query_with_any(types)
    }

    // Events

    /// Subscribe to an event
    pub fn on<F>(&self, event: impl Into<String>, callback: F) -> Subscription
    where
        F: FnMut(&Event) -> ListenerResult + 'static,
    {
        self.events.on(event, callback)
    }

    /// Subscribe for one delivery
    pub fn once<F>(&self, event: impl Into<String>, callback: F) -> Subscription
    where
        F: FnMut(&Event) -> ListenerResult + 'static,
    {
        self.events.once(event, callback)
    }

    /// Remove a listener
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        self.events.off(event, id)
    }

    /// Queue an event
    pub fn emit(&self, event: impl Into<String>, args: Vec<EventArg>) {
        self.events.emit(event, args);
    }

    /// Dispatch an event now
    pub fn emit_immediate(&self, event: impl Into<String>, args: Vec<EventArg>) -> usize {
        self.events.emit_immediate(event, args)
    }

    /// Drain the event queue
    pub fn process_events(&self) -> Result<usize, EventError> {
        self.events.process_events()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
