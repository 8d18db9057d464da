//! Component types and instances
//!
//! Components are not Rust types here. A component *type* is a name bound
//! to a factory that turns raw input data into the stored value, plus a
//! [`ComponentKind`] fixed at registration. The kind is what tells the
//! store whether adding or removing an instance must also notify the
//! physics or render collaborator.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use slotmap::Key;

slotmap::new_key_type! {
    /// Globally unique handle to one stored component instance
    ///
    /// Keys are versioned, so a removed instance's id is never handed out
    /// again even when its slot is recycled.
    pub struct ComponentId;
}

impl ComponentId {
    /// Stable numeric form, handy for logs and external maps
    pub fn as_u64(self) -> u64 {
        self.data().as_ffi()
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_u64())
    }
}

/// Classification of a component type, chosen when it is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ComponentKind {
    /// Plain data, no collaborator involvement
    #[default]
    Plain,
    /// Backed by a rigid body owned by the physics collaborator
    PhysicsBody,
    /// Backed by a drawable owned by the render collaborator
    Drawable,
}

impl ComponentKind {
    /// Event fired when an instance of this kind is added, if any
    pub const fn added_event(self) -> Option<&'static str> {
        match self {
            Self::Plain => None,
            Self::PhysicsBody => Some(crate::events::names::PHYSICS_ADD_BODY),
            Self::Drawable => Some(crate::events::names::ADD_DRAWABLE),
        }
    }

    /// Event fired when an instance of this kind is removed, if any
    pub const fn removed_event(self) -> Option<&'static str> {
        match self {
            Self::Plain => None,
            Self::PhysicsBody => Some(crate::events::names::PHYSICS_REMOVE_BODY),
            Self::Drawable => Some(crate::events::names::REMOVE_DRAWABLE),
        }
    }
}

/// Factory turning raw component data into the stored value
pub type ComponentFactory = Box<dyn Fn(Value) -> Value>;

/// A registered component type
pub(crate) struct ComponentType {
    pub(crate) kind: ComponentKind,
    pub(crate) factory: ComponentFactory,
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentType")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Copy of one stored component instance
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentInstance {
    /// Handle of this instance
    pub id: ComponentId,
    /// Kind the type had when the instance was created
    pub kind: ComponentKind,
    /// Value produced by the factory
    pub value: Value,
}
