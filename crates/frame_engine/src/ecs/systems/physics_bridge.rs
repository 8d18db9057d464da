//! Physics bridge system
//!
//! Keeps the physics collaborator's body set in step with the store and
//! advances the simulation once per tick.

use serde_json::Value;

use super::{ChangeFeed, Mirror};
use crate::ecs::{ComponentId, ComponentKind, EntityId, System, SystemResult, World};
use crate::physics::PhysicsCollaborator;

/// Scheduler name of the physics bridge
pub const PHYSICS_BRIDGE: &str = "physics";

/// Scheduler priority of the physics bridge
pub const PHYSICS_PRIORITY: i32 = 100;

impl Mirror for dyn PhysicsCollaborator {
    fn attach(&mut self, entity: &EntityId, component: ComponentId, value: &Value) -> SystemResult {
        self.add_body(entity, component, value)
    }

    fn detach(&mut self, entity: &EntityId, component: ComponentId) {
        self.remove_body(entity, component);
    }

    fn reset(&mut self) {
        self.clear();
    }
}

/// Default system driving a [`PhysicsCollaborator`]
pub struct PhysicsBridge {
    physics: Box<dyn PhysicsCollaborator>,
    feed: ChangeFeed,
}

impl PhysicsBridge {
    /// Bridge to the given collaborator
    pub fn new(physics: Box<dyn PhysicsCollaborator>) -> Self {
        Self {
            physics,
            feed: ChangeFeed::new(ComponentKind::PhysicsBody),
        }
    }

    /// Number of bodies the collaborator currently holds
    pub fn body_count(&self) -> usize {
        self.feed.synced()
    }
}

impl System for PhysicsBridge {
    fn name(&self) -> &str {
        PHYSICS_BRIDGE
    }

    fn priority(&self) -> i32 {
        PHYSICS_PRIORITY
    }

    fn init(&mut self, world: &mut World) -> SystemResult {
        self.feed.subscribe(world.events());
        self.feed.resync();
        Ok(())
    }

    fn update(&mut self, world: &mut World, dt: f64) -> SystemResult {
        self.feed.apply(world, self.physics.as_mut())?;
        self.physics.step(world, dt)
    }

    fn destroy(&mut self, world: &mut World) -> SystemResult {
        self.feed.unsubscribe(world.events());
        self.physics.clear();
        Ok(())
    }
}

impl std::fmt::Debug for PhysicsBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsBridge")
            .field("bodies", &self.feed.synced())
            .finish_non_exhaustive()
    }
}
