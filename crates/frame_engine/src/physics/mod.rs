//! Physics collaborator contract
//!
//! The core never simulates anything. A physics collaborator is told about
//! bodies through the physics bridge system, is stepped once per tick, and
//! reports contacts back as `physics:collision:enter:<entity>` /
//! `physics:collision:exit:<entity>` events carrying the other entity's
//! snapshot.

mod body_index;

pub use body_index::BodyIndex;

use serde_json::Value;

use crate::ecs::{ComponentId, EntityId, SystemResult, World};
use crate::events::{names, EventArg};

/// Rigid-body simulation driven by the engine
pub trait PhysicsCollaborator {
    /// A physics-body component was added
    fn add_body(&mut self, entity: &EntityId, component: ComponentId, data: &Value) -> SystemResult;

    /// A physics-body component was removed; unknown ids are ignored
    fn remove_body(&mut self, entity: &EntityId, component: ComponentId);

    /// Advance the simulation by `dt` milliseconds
    fn step(&mut self, world: &mut World, dt: f64) -> SystemResult;

    /// Drop every body
    fn clear(&mut self);
}

/// Collaborator that tracks bodies and simulates nothing
#[derive(Debug, Default)]
pub struct NullPhysics {
    bodies: BodyIndex<ComponentId>,
}

impl NullPhysics {
    /// Create an empty collaborator
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bodies currently held
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

impl PhysicsCollaborator for NullPhysics {
    fn add_body(&mut self, entity: &EntityId, component: ComponentId, _data: &Value) -> SystemResult {
        log::trace!("Body {} added for '{}'", component, entity);
        self.bodies.insert(component, entity.clone());
        Ok(())
    }

    fn remove_body(&mut self, entity: &EntityId, component: ComponentId) {
        log::trace!("Body {} removed for '{}'", component, entity);
        self.bodies.remove(component);
    }

    fn step(&mut self, _world: &mut World, _dt: f64) -> SystemResult {
        Ok(())
    }

    fn clear(&mut self) {
        self.bodies.clear();
    }
}

/// Contact phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionPhase {
    /// Two bodies started touching
    Enter,
    /// Two bodies stopped touching
    Exit,
}

/// Event name announcing a contact change for `entity`
pub fn collision_event(phase: CollisionPhase, entity: &str) -> String {
    let prefix = match phase {
        CollisionPhase::Enter => names::COLLISION_ENTER_PREFIX,
        CollisionPhase::Exit => names::COLLISION_EXIT_PREFIX,
    };
    format!("{prefix}{entity}")
}

/// Queue the collision events for both sides of a contact
///
/// Each side receives the other entity's snapshot. Entities that no longer
/// exist get no event.
pub fn notify_collision(world: &World, phase: CollisionPhase, a: &str, b: &str) {
    let (Some(snapshot_a), Some(snapshot_b)) = (world.get(a), world.get(b)) else {
        log::debug!("Collision between '{}' and '{}' ignored, entity missing", a, b);
        return;
    };
    world.emit(collision_event(phase, a), vec![EventArg::Snapshot(snapshot_b)]);
    world.emit(collision_event(phase, b), vec![EventArg::Snapshot(snapshot_a)]);
}
