//! Render collaborator contract
//!
//! Symmetric to physics: the render bridge tells the collaborator which
//! drawables to attach to or detach from its scene graph, then asks it to
//! render once per tick. Nothing flows back into the core.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::ecs::{ComponentId, EntityId, SystemResult, World};

/// Scene-graph renderer driven by the engine
pub trait RenderCollaborator {
    /// A drawable component was added
    fn attach_drawable(&mut self, entity: &EntityId, component: ComponentId, data: &Value) -> SystemResult;

    /// A drawable component was removed; unknown ids are ignored
    fn detach_drawable(&mut self, entity: &EntityId, component: ComponentId);

    /// Draw one frame
    fn render(&mut self, world: &World, dt: f64) -> SystemResult;

    /// Detach every drawable
    fn clear(&mut self);
}

/// Renderer that keeps a list of attached drawables and draws nothing
#[derive(Debug, Default)]
pub struct NullRenderer {
    attached: BTreeMap<ComponentId, EntityId>,
    frames: u64,
}

impl NullRenderer {
    /// Create an empty renderer
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of attached drawables
    pub fn drawable_count(&self) -> usize {
        self.attached.len()
    }

    /// Frames rendered so far
    pub const fn frames(&self) -> u64 {
        self.frames
    }
}

impl RenderCollaborator for NullRenderer {
    fn attach_drawable(&mut self, entity: &EntityId, component: ComponentId, _data: &Value) -> SystemResult {
        self.attached.insert(component, entity.clone());
        Ok(())
    }

    fn detach_drawable(&mut self, _entity: &EntityId, component: ComponentId) {
        self.attached.remove(&component);
    }

    fn render(&mut self, _world: &World, _dt: f64) -> SystemResult {
        self.frames += 1;
        Ok(())
    }

    fn clear(&mut self) {
        self.attached.clear();
    }
}
