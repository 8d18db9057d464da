//! Sandbox collaborators
//!
//! A toy physics collaborator that detects circle overlaps between bodies,
//! and a renderer that just logs what it would draw.

use std::collections::{BTreeMap, BTreeSet};

use frame_engine::ecs::SystemResult;
use frame_engine::physics::{notify_collision, BodyIndex, CollisionPhase};
use frame_engine::prelude::*;
use serde_json::Value;

const DEFAULT_RADIUS: f64 = 1.0;

/// Circle-overlap physics
#[derive(Debug, Default)]
pub struct CirclePhysics {
    bodies: BodyIndex<ComponentId>,
    radii: BTreeMap<ComponentId, f64>,
    contacts: BTreeSet<(EntityId, EntityId)>,
}

impl CirclePhysics {
    pub fn new() -> Self {
        Self::default()
    }

    fn radius_of(&self, entity: &str) -> f64 {
        self.bodies
            .handles_of(entity)
            .iter()
            .filter_map(|handle| self.radii.get(handle))
            .copied()
            .fold(0.0, f64::max)
    }
}

fn position(world: &World, entity: &str) -> Option<(f64, f64)> {
    let snapshot = world.get(entity)?;
    let pos = snapshot.first("Position")?;
    Some((pos["x"].as_f64()?, pos["y"].as_f64()?))
}

impl PhysicsCollaborator for CirclePhysics {
    fn add_body(&mut self, entity: &EntityId, component: ComponentId, data: &Value) -> SystemResult {
        let radius = data["radius"].as_f64().unwrap_or(DEFAULT_RADIUS);
        if radius <= 0.0 {
            return Err(SystemError::custom(format!("body radius must be positive, got {radius}")));
        }
        self.bodies.insert(component, entity.clone());
        self.radii.insert(component, radius);
        log::debug!("Body {} (r={}) added for '{}'", component, radius, entity);
        Ok(())
    }

    fn remove_body(&mut self, entity: &EntityId, component: ComponentId) {
        self.bodies.remove(component);
        self.radii.remove(&component);
        self.contacts.retain(|(a, b)| a != entity && b != entity);
        log::debug!("Body {} removed for '{}'", component, entity);
    }

    fn step(&mut self, world: &mut World, _dt: f64) -> SystemResult {
        let owners: BTreeSet<EntityId> = self
            .radii
            .keys()
            .filter_map(|handle| self.bodies.entity_of(*handle).cloned())
            .collect();
        let placed: Vec<(EntityId, (f64, f64), f64)> = owners
            .into_iter()
            .filter_map(|entity| {
                let at = position(world, &entity)?;
                let radius = self.radius_of(&entity);
                Some((entity, at, radius))
            })
            .collect();

        let mut touching = BTreeSet::new();
        for (i, (a, (ax, ay), ar)) in placed.iter().enumerate() {
            for (b, (bx, by), br) in &placed[i + 1..] {
                if (ax - bx).hypot(ay - by) < ar + br {
                    touching.insert((a.clone(), b.clone()));
                }
            }
        }

        for (a, b) in touching.difference(&self.contacts) {
            notify_collision(world, CollisionPhase::Enter, a, b);
        }
        for (a, b) in self.contacts.difference(&touching) {
            notify_collision(world, CollisionPhase::Exit, a, b);
        }
        self.contacts = touching;
        Ok(())
    }

    fn clear(&mut self) {
        self.bodies.clear();
        self.radii.clear();
        self.contacts.clear();
    }
}

/// Renderer that logs its drawables every few frames
#[derive(Debug)]
pub struct LogRenderer {
    drawables: BTreeMap<ComponentId, (EntityId, String)>,
    frame: u64,
    every: u64,
}

impl LogRenderer {
    pub fn new(every: u64) -> Self {
        Self {
            drawables: BTreeMap::new(),
            frame: 0,
            every: every.max(1),
        }
    }
}

impl RenderCollaborator for LogRenderer {
    fn attach_drawable(&mut self, entity: &EntityId, component: ComponentId, data: &Value) -> SystemResult {
        let glyph = data["glyph"].as_str().unwrap_or("?").to_string();
        self.drawables.insert(component, (entity.clone(), glyph));
        Ok(())
    }

    fn detach_drawable(&mut self, _entity: &EntityId, component: ComponentId) {
        self.drawables.remove(&component);
    }

    fn render(&mut self, world: &World, _dt: f64) -> SystemResult {
        self.frame += 1;
        if self.frame % self.every != 0 {
            return Ok(());
        }
        for (entity, glyph) in self.drawables.values() {
            if let Some((x, y)) = position(world, entity) {
                log::info!("[frame {}] {} '{}' at ({:.1}, {:.1})", self.frame, glyph, entity, x, y);
            }
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.drawables.clear();
    }
}
