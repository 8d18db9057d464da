//! Event system
//!
//! Decoupled publish/subscribe keyed by event name:
//! - Listeners subscribe by name and get a [`Subscription`] token back
//! - [`EventBus::emit`] queues, [`EventBus::process_events`] drains
//! - [`EventBus::emit_immediate`] dispatches synchronously to a snapshot of
//!   the current listeners
//! - A failing listener is logged and never stops the others

mod bus;

pub use bus::{EventBus, ListenerId, ListenerResult, Subscription};

use serde_json::Value;
use thiserror::Error;

use crate::ecs::{ComponentId, EntityId, EntitySnapshot};

/// Well-known event names emitted by the core
pub mod names {
    /// `(entity)`
    pub const ENTITY_CREATED: &str = "entity:created";
    /// `(entity, owned type names, snapshot)`, fired before teardown
    pub const ENTITY_REMOVING: &str = "entity:removing";
    /// `(entity)`
    pub const ENTITY_REMOVED: &str = "entity:removed";
    /// `(entity, type name, raw data, component id)`
    pub const COMPONENT_ADDED: &str = "component:added";
    /// `(entity, type name, old value, component id)`
    pub const COMPONENT_REMOVED: &str = "component:removed";
    /// `(entity, component id, stored value)`
    pub const PHYSICS_ADD_BODY: &str = "physics:add:body";
    /// `(entity, component id, old value)`
    pub const PHYSICS_REMOVE_BODY: &str = "physics:remove:body";
    /// `(entity, component id, stored value)`
    pub const ADD_DRAWABLE: &str = "add:drawable";
    /// `(entity, component id, old value)`
    pub const REMOVE_DRAWABLE: &str = "remove:drawable";
    /// `(system name, dt)`
    pub const SYSTEM_UPDATE_START: &str = "system:update:start";
    /// `(system name, dt)`
    pub const SYSTEM_UPDATE_END: &str = "system:update:end";
    /// `(scene name)`, collaborators drop everything they hold
    pub const SCENE_FLUSH: &str = "scene:flush";
    /// `(scene name)`, collaborators resync from the store
    pub const SCENE_LOADED: &str = "scene:loaded";
    /// Prefix of `physics:collision:enter:<entity>`
    pub const COLLISION_ENTER_PREFIX: &str = "physics:collision:enter:";
    /// Prefix of `physics:collision:exit:<entity>`
    pub const COLLISION_EXIT_PREFIX: &str = "physics:collision:exit:";
}

/// Event argument
///
/// Payloads are positional; the variant tells a listener what it holds.
#[derive(Debug, Clone, PartialEq)]
pub enum EventArg {
    /// Entity identifier
    Entity(EntityId),
    /// Component instance handle
    Component(ComponentId),
    /// Free text, e.g. a component type or system name
    Text(String),
    /// List of names, e.g. the types an entity owns
    Names(Vec<String>),
    /// Floating point value, e.g. a frame delta
    Number(f64),
    /// Integer value
    Int(i64),
    /// Boolean flag
    Bool(bool),
    /// Arbitrary structured data
    Data(Value),
    /// Copy of an entity and its components
    Snapshot(EntitySnapshot),
}

impl EventArg {
    /// Entity id, if this is an entity argument
    pub const fn as_entity(&self) -> Option<&EntityId> {
        match self {
            Self::Entity(id) => Some(id),
            _ => None,
        }
    }

    /// Component id, if this is a component argument
    pub const fn as_component(&self) -> Option<ComponentId> {
        match self {
            Self::Component(id) => Some(*id),
            _ => None,
        }
    }

    /// Text content
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Name list
    pub fn as_names(&self) -> Option<&[String]> {
        match self {
            Self::Names(names) => Some(names),
            _ => None,
        }
    }

    /// Numeric value; integers are widened
    #[allow(clippy::cast_precision_loss)]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Integer value
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Boolean value
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Structured data
    pub const fn as_data(&self) -> Option<&Value> {
        match self {
            Self::Data(value) => Some(value),
            _ => None,
        }
    }

    /// Entity snapshot
    pub const fn as_snapshot(&self) -> Option<&EntitySnapshot> {
        match self {
            Self::Snapshot(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

impl From<EntityId> for EventArg {
    fn from(id: EntityId) -> Self {
        Self::Entity(id)
    }
}

impl From<ComponentId> for EventArg {
    fn from(id: ComponentId) -> Self {
        Self::Component(id)
    }
}

impl From<&str> for EventArg {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for EventArg {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<f64> for EventArg {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for EventArg {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for EventArg {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<bool> for EventArg {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Value> for EventArg {
    fn from(value: Value) -> Self {
        Self::Data(value)
    }
}

impl From<EntitySnapshot> for EventArg {
    fn from(snapshot: EntitySnapshot) -> Self {
        Self::Snapshot(snapshot)
    }
}

/// A named event with positional arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Event name listeners subscribe to
    pub name: String,
    /// Positional arguments
    pub args: Vec<EventArg>,
}

impl Event {
    /// Create an event without arguments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Add an argument to the event (builder pattern)
    pub fn with_arg(mut self, arg: impl Into<EventArg>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Get an argument by position
    pub fn arg(&self, index: usize) -> Option<&EventArg> {
        self.args.get(index)
    }

    /// First entity argument, if any
    pub fn entity(&self) -> Option<&EntityId> {
        self.args.iter().find_map(EventArg::as_entity)
    }

    /// First component id argument, if any
    pub fn component(&self) -> Option<ComponentId> {
        self.args.iter().find_map(EventArg::as_component)
    }
}

/// Event dispatch errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    /// Listeners kept re-emitting past the drain-pass limit
    #[error("event graph did not settle after {passes} passes ({pending} events still queued)")]
    UnstableEventGraph {
        /// Passes made before giving up
        passes: usize,
        /// Events left in the queue
        pending: usize,
    },
}
