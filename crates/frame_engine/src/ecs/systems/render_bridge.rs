//! Render bridge system

use serde_json::Value;

use super::{ChangeFeed, Mirror};
use crate::ecs::{ComponentId, ComponentKind, EntityId, System, SystemResult, World};
use crate::render::RenderCollaborator;

/// Scheduler name of the render bridge
pub const RENDER_BRIDGE: &str = "render";

/// Scheduler priority of the render bridge; runs after game logic
pub const RENDER_PRIORITY: i32 = 1000;

impl Mirror for dyn RenderCollaborator {
    fn attach(&mut self, entity: &EntityId, component: ComponentId, value: &Value) -> SystemResult {
        self.attach_drawable(entity, component, value)
    }

    fn detach(&mut self, entity: &EntityId, component: ComponentId) {
        self.detach_drawable(entity, component);
    }

    fn reset(&mut self) {
        self.clear();
    }
}

/// Default system driving a [`RenderCollaborator`]
pub struct RenderBridge {
    renderer: Box<dyn RenderCollaborator>,
    feed: ChangeFeed,
}

impl RenderBridge {
    /// Bridge to the given collaborator
    pub fn new(renderer: Box<dyn RenderCollaborator>) -> Self {
        Self {
            renderer,
            feed: ChangeFeed::new(ComponentKind::Drawable),
        }
    }

    /// Number of drawables the collaborator currently holds
    pub fn drawable_count(&self) -> usize {
        self.feed.synced()
    }
}

impl System for RenderBridge {
    fn name(&self) -> &str {
        RENDER_BRIDGE
    }

    fn priority(&self) -> i32 {
        RENDER_PRIORITY
    }

    fn init(&mut self, world: &mut World) -> SystemResult {
        self.feed.subscribe(world.events());
        self.feed.resync();
        Ok(())
    }

    fn update(&mut self, world: &mut World, dt: f64) -> SystemResult {
        self.feed.apply(world, self.renderer.as_mut())?;
        self.renderer.render(world, dt)
    }

    fn destroy(&mut self, world: &mut World) -> SystemResult {
        self.feed.unsubscribe(world.events());
        self.renderer.clear();
        Ok(())
    }
}

impl std::fmt::Debug for RenderBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderBridge")
            .field("drawables", &self.feed.synced())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::systems::testing::Journal;
    use serde_json::json;

    struct Recorder(Journal);

    impl RenderCollaborator for Recorder {
        fn attach_drawable(&mut self, entity: &EntityId, _component: ComponentId, _data: &Value) -> SystemResult {
            self.0.record(format!("attach {entity}"));
            Ok(())
        }

        fn detach_drawable(&mut self, entity: &EntityId, _component: ComponentId) {
            self.0.record(format!("detach {entity}"));
        }

        fn render(&mut self, world: &World, _dt: f64) -> SystemResult {
            self.0.record(format!("render {}", world.store().entity_count()));
            Ok(())
        }

        fn clear(&mut self) {
            self.0.record("clear".to_string());
        }
    }

    #[test]
    fn test_drawables_attach_and_detach() {
        let mut world = World::new();
        world.register_component_with_kind("Sprite", ComponentKind::Drawable, |raw| raw);
        world.register_component_with_kind("Body", ComponentKind::PhysicsBody, |raw| raw);
        let journal = Journal::default();
        let mut bridge = RenderBridge::new(Box::new(Recorder(journal.clone())));
        bridge.init(&mut world).unwrap();

        let e = world.create_with_id("ship");
        let sprite = world.add_component(&e, "Sprite", json!({"frame": 0})).unwrap();
        world.add_component(&e, "Body", json!({})).unwrap();
        bridge.update(&mut world, 1.0).unwrap();
        assert_eq!(journal.take(), vec!["attach ship", "render 1"]);
        assert_eq!(bridge.drawable_count(), 1);

        world.remove_component_by_id(sprite);
        bridge.update(&mut world, 1.0).unwrap();
        assert_eq!(journal.take(), vec!["detach ship", "render 1"]);
    }

    #[test]
    fn test_failing_attach_propagates() {
        struct Broken;
        impl RenderCollaborator for Broken {
            fn attach_drawable(&mut self, _: &EntityId, _: ComponentId, _: &Value) -> SystemResult {
                Err(crate::ecs::SystemError::custom("no texture"))
            }
            fn detach_drawable(&mut self, _: &EntityId, _: ComponentId) {}
            fn render(&mut self, _: &World, _: f64) -> SystemResult {
                Ok(())
            }
            fn clear(&mut self) {}
        }

        let mut world = World::new();
        world.register_component_with_kind("Sprite", ComponentKind::Drawable, |raw| raw);
        let mut bridge = RenderBridge::new(Box::new(Broken));
        bridge.init(&mut world).unwrap();
        let e = world.create();
        world.add_component(&e, "Sprite", json!(null)).unwrap();

        assert!(bridge.update(&mut world, 1.0).is_err());
        assert_eq!(bridge.drawable_count(), 0);
    }
}
