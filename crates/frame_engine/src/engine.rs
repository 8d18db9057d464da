//! Core engine implementation
//!
//! [`Engine`] is the composition root. It owns one world (store + bus), one
//! scheduler, one clock and the system registry, and wires the per-frame
//! sequence: drain queued events, then update every enabled system.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::clock::{CallbackId, CallbackResult, FrameReport, GameClock};
use crate::config::{ConfigError, EngineConfig};
use crate::ecs::scheduler::{SchedulerError, SystemInfo};
use crate::ecs::systems::{PhysicsBridge, RenderBridge};
use crate::ecs::{
    ComponentId, ComponentKind, EntityId, EntitySnapshot, QueryMatch, StoreError, System, SystemRegistry,
    SystemScheduler, World,
};
use crate::events::{names, Event, EventArg, EventError, ListenerId, ListenerResult, Subscription};
use crate::foundation::ids::EntityIdGenerator;
use crate::foundation::time::{Stopwatch, TimeSource};
use crate::physics::{NullPhysics, PhysicsCollaborator};
use crate::render::{NullRenderer, RenderCollaborator};
use crate::scene::{SceneDescriptor, SystemDescriptor};

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Entity store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Event processing error
    #[error("Event error: {0}")]
    Events(#[from] EventError),

    /// Scheduler or system error
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
}

/// World and scheduler, the state every frame operates on
///
/// Clock callbacks registered through [`Engine::on_frame`] and
/// [`Engine::on_fixed_step`] receive this.
#[derive(Debug)]
pub struct EngineCore {
    /// Entities, components and events
    pub world: World,
    /// Scheduled systems
    pub systems: SystemScheduler,
}

impl EngineCore {
    /// One frame: drain queued events, then run the systems
    ///
    /// A queue that does not settle is logged and left for the next frame;
    /// a failing system aborts the frame.
    pub fn frame(&mut self, dt: f64) -> Result<(), EngineError> {
        if let Err(e) = self.world.process_events() {
            log::warn!("{}", e);
        }
        self.systems.update(&mut self.world, dt)?;
        Ok(())
    }
}

/// Main engine struct
pub struct Engine {
    core: EngineCore,
    clock: GameClock<EngineCore>,
    registry: SystemRegistry,
    config: EngineConfig,
    physics: Option<Box<dyn PhysicsCollaborator>>,
    renderer: Option<Box<dyn RenderCollaborator>>,
    frame_driver: CallbackId,
    current_scene: Option<String>,
}

impl Engine {
    /// Create a new engine instance
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        log::info!("Initializing engine...");

        let events = crate::events::EventBus::with_max_passes(config.events.max_dispatch_passes);
        let ids = match config.entities.id_seed {
            Some(seed) => EntityIdGenerator::with_seed(config.entities.id_prefix.clone(), seed),
            None => EntityIdGenerator::new(config.entities.id_prefix.clone()),
        };
        let mut clock = GameClock::new(&config.clock);
        let frame_driver = install_frame_driver(&mut clock);

        Ok(Self {
            core: EngineCore {
                world: World::with_parts(events, ids),
                systems: SystemScheduler::new(),
            },
            clock,
            registry: SystemRegistry::new(),
            config,
            physics: None,
            renderer: None,
            frame_driver,
            current_scene: None,
        })
    }

    /// Read time from a different source (builder pattern)
    #[must_use]
    pub fn with_time_source(mut self, time: Box<dyn TimeSource>) -> Self {
        self.clock.set_time_source(time);
        self
    }

    /// Physics collaborator used by the physics bridge
    ///
    /// Takes effect at [`setup`](Self::setup); ignored afterwards.
    pub fn set_physics(&mut self, physics: Box<dyn PhysicsCollaborator>) -> &mut Self {
        if self.core.systems.is_set_up() {
            log::warn!("Physics collaborator set after setup, ignored");
        } else {
            self.physics = Some(physics);
        }
        self
    }

    /// Render collaborator used by the render bridge
    ///
    /// Takes effect at [`setup`](Self::setup); ignored afterwards.
    pub fn set_renderer(&mut self, renderer: Box<dyn RenderCollaborator>) -> &mut Self {
        if self.core.systems.is_set_up() {
            log::warn!("Render collaborator set after setup, ignored");
        } else {
            self.renderer = Some(renderer);
        }
        self
    }

    /// Configuration the engine was built with
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// System registry scenes resolve against
    pub const fn registry(&self) -> &SystemRegistry {
        &self.registry
    }

    /// Mutable system registry
    pub fn registry_mut(&mut self) -> &mut SystemRegistry {
        &mut self.registry
    }

    /// World
    pub const fn world(&self) -> &World {
        &self.core.world
    }

    /// Mutable world
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.core.world
    }

    /// Scheduler
    pub const fn systems(&self) -> &SystemScheduler {
        &self.core.systems
    }

    /// Frame clock
    pub const fn clock(&self) -> &GameClock<EngineCore> {
        &self.clock
    }

    /// Name of the loaded scene
    pub fn current_scene(&self) -> Option<&str> {
        self.current_scene.as_deref()
    }

    /// Install the bridges and resolve the given systems
    pub fn setup(&mut self, descriptors: &[SystemDescriptor]) -> Result<(), EngineError> {
        if self.core.systems.is_set_up() {
            return Err(SchedulerError::AlreadySetUp.into());
        }
        let physics = self.physics.take().unwrap_or_else(|| Box::new(NullPhysics::new()));
        let renderer = self.renderer.take().unwrap_or_else(|| Box::new(NullRenderer::new()));
        let defaults: Vec<Box<dyn System>> = vec![
            Box::new(PhysicsBridge::new(physics)),
            Box::new(RenderBridge::new(renderer)),
        ];
        self.core
            .systems
            .setup(&mut self.core.world, defaults, descriptors, &self.registry)?;
        log::info!("Engine setup complete: {} systems", self.core.systems.len());
        Ok(())
    }

    // -- Entities --

    /// Register a plain component type
    pub fn register_component<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(Value) -> Value + 'static,
    {
        self.core.world.register_component(name, factory);
        self
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
        self.core.world.register_component_with_kind(name, kind, factory);
        self
    }

    /// Create an entity with a generated id
    pub fn create(&mut self) -> EntityId {
        self.core.world.create()
    }

    /// Create an entity with a chosen id
    pub fn create_with_id(&mut self, id: impl Into<EntityId>) -> EntityId {
        self.core.world.create_with_id(id)
    }

    /// Remove an entity
    pub fn remove(&mut self, entity: &str) -> bool {
        self.core.world.remove(entity)
    }

    /// Snapshot of an entity
    pub fn get(&self, entity: &str) -> Option<EntitySnapshot> {
        self.core.world.get(entity)
    }

    /// Attach a component
    pub fn add_component(&mut self, entity: &str, type_name: &str, raw: Value) -> Result<ComponentId, EngineError> {
        Ok(self.core.world.add_component(entity, type_name, raw)?)
    }

    /// Attach a component without derived events
    pub fn add_component_setup(
        &mut self,
        entity: &str,
        type_name: &str,
        raw: Value,
    ) -> Result<ComponentId, EngineError> {
        Ok(self.core.world.add_component_setup(entity, type_name, raw)?)
    }

    /// Remove every instance of a type from an entity
    pub fn remove_component(&mut self, entity: &str, type_name: &str) -> usize {
        self.core.world.remove_component(entity, type_name)
    }

    /// Remove one component instance
    pub fn remove_component_by_id(&mut self, id: ComponentId) -> bool {
        self.core.world.remove_component_by_id(id)
    }

    /// ALL-match query
    pub fn query(&self, types: &[&str]) -> Vec<QueryMatch> {
        self.core.world.query(types)
    }

    /// ANY-match query
    pub fn query_with_any(&self, types: &[&str]) -> Vec<QueryMatch> {
        self.core.world.query_with_any(types)
    }

    // -- Events --

    /// Subscribe to an event
    pub fn on<F>(&self, event: impl Into<String>, callback: F) -> Subscription
    where
        F: FnMut(&Event) -> ListenerResult + 'static,
    {
        self.core.world.on(event, callback)
    }

    /// Subscribe for one delivery
    pub fn once<F>(&self, event: impl Into<String>, callback: F) -> Subscription
    where
        F: FnMut(&Event) -> ListenerResult + 'static,
    {
        self.core.world.once(event, callback)
    }

    /// Remove a listener
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        self.core.world.off(event, id)
    }

    /// Queue an event
    pub fn emit(&self, event: impl Into<String>, args: Vec<EventArg>) {
        self.core.world.emit(event, args);
    }

    /// Dispatch an event now
    pub fn emit_immediate(&self, event: impl Into<String>, args: Vec<EventArg>) -> usize {
        self.core.world.emit_immediate(event, args)
    }

    /// Drain the event queue
    pub fn process_events(&self) -> Result<usize, EngineError> {
        Ok(self.core.world.process_events()?)
    }

    // -- Systems --

    /// Add a system
    pub fn add_system(&mut self, system: Box<dyn System>) -> Result<(), EngineError> {
        Ok(self.core.systems.add_system(&mut self.core.world, system)?)
    }

    /// Remove a non-default system
    pub fn remove_system(&mut self, name: &str) -> Result<bool, EngineError> {
        Ok(self.core.systems.remove_system(&mut self.core.world, name)?)
    }

    /// Flip a system's enabled flag
    pub fn toggle(&mut self, name: &str) -> Option<bool> {
        self.core.systems.toggle(name)
    }

    /// Enable the named systems
    pub fn setup_scene(&mut self, names: &[&str]) {
        self.core.systems.setup_scene(names);
    }

    /// Disable every non-default system
    pub fn clear_systems(&mut self) {
        self.core.systems.clear();
    }

    /// Info for one system
    pub fn get_system(&self, name: &str) -> Option<SystemInfo> {
        self.core.systems.get_system(name)
    }

    // -- Clock --

    /// Start the frame clock
    pub fn start(&mut self) {
        self.clock.start();
    }

    /// Stop the frame clock
    pub fn stop(&mut self) {
        self.clock.stop();
    }

    /// Whether the clock is running
    pub const fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    /// Run one scheduled frame, if any
    ///
    /// A stop requested through [`World::request_stop`] during the frame
    /// stops the clock once the frame completes.
    pub fn tick(&mut self) -> Option<FrameReport> {
        let report = self.clock.tick(&mut self.core)?;
        if self.core.world.take_stop_request() {
            self.clock.stop();
        }
        Some(report)
    }

    /// Run one frame with an explicit delta, bypassing the clock
    pub fn update(&mut self, dt: f64) -> Result<(), EngineError> {
        self.core.frame(dt)
    }

    /// Run up to `frames` frames back to back; returns how many ran
    pub fn run_frames(&mut self, frames: usize) -> usize {
        self.start();
        let mut ran = 0;
        while ran < frames && self.tick().is_some() {
            ran += 1;
        }
        ran
    }

    /// Run until stopped, pacing to `target_fps` when set
    pub fn run(&mut self) {
        let frame_budget = self
            .config
            .target_fps
            .map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps)));
        log::info!("Starting main loop...");
        self.start();
        loop {
            let stopwatch = Stopwatch::start_new();
            if self.tick().is_none() {
                break;
            }
            if let Some(budget) = frame_budget {
                if let Some(remaining) = budget.checked_sub(stopwatch.elapsed()) {
                    std::thread::sleep(remaining);
                }
            }
        }
        log::info!("Main loop exited after {} frames", self.clock.frame_count());
    }

    /// Register a variable-timestep callback
    pub fn on_frame<F>(&mut self, callback: F) -> CallbackId
    where
        F: FnMut(&mut EngineCore, f64) -> CallbackResult + 'static,
    {
        self.clock.add(callback)
    }

    /// Unregister a variable-timestep callback
    pub fn remove_frame_callback(&mut self, id: CallbackId) -> bool {
        if id == self.frame_driver {
            log::warn!("The engine frame callback cannot be removed");
            return false;
        }
        self.clock.remove(id)
    }

    /// Register a fixed-timestep callback
    pub fn on_fixed_step<F>(&mut self, callback: F) -> CallbackId
    where
        F: FnMut(&mut EngineCore, f64) -> CallbackResult + 'static,
    {
        self.clock.add_fixed(callback)
    }

    /// Unregister a fixed-timestep callback
    pub fn remove_fixed_step(&mut self, id: CallbackId) -> bool {
        self.clock.remove_fixed(id)
    }

    /// Drop every user clock callback and reset the accumulator
    pub fn clear_clock(&mut self) {
        self.clock.clear();
        self.frame_driver = install_frame_driver(&mut self.clock);
    }

    // -- Scenes --

    /// Replace the current scene
    ///
    /// Non-default systems are disabled, collaborators are flushed and every
    /// entity is removed. The scene's systems are then resolved and enabled,
    /// its entities created through the bulk path, and `scene:loaded`
    /// announced so collaborators resync. Returns the created entity ids.
    ///
    /// A scene naming an unregistered component type is rejected before
    /// anything is torn down. Repeated entity ids keep only their first entry.
    pub fn load_scene(&mut self, scene: &SceneDescriptor) -> Result<Vec<EntityId>, EngineError> {
        if let Some(missing) = scene
            .entities
            .iter()
            .flat_map(|entity| entity.components.keys())
            .find(|type_name| !self.core.world.store().is_registered(type_name.as_str()))
        {
            log::error!("Scene '{}' uses unregistered component '{}'", scene.name, missing);
            return Err(StoreError::ComponentNotRegistered(missing.clone()).into());
        }
        if !self.core.systems.is_set_up() {
            self.setup(&[])?;
        }
        self.unload_scene();
        log::info!("Loading scene '{}'", scene.name);

        let world = &mut self.core.world;
        self.core.systems.resolve_descriptors(world, &scene.systems, &self.registry);
        self.core.systems.setup_scene(&scene.system_names());

        let mut created = Vec::with_capacity(scene.entities.len());
        for descriptor in &scene.entities {
            let id = match &descriptor.id {
                Some(id) if world.contains(id) => {
                    log::warn!("Scene '{}' lists entity '{}' twice, skipping the duplicate", scene.name, id);
                    continue;
                }
                Some(id) => world.create_with_id(id.as_str()),
                None => world.create(),
            };
            for (type_name, raw) in &descriptor.components {
                world.add_component_setup(&id, type_name, raw.clone())?;
            }
            created.push(id);
        }

        world.emit_immediate(names::SCENE_LOADED, vec![EventArg::Text(scene.name.clone())]);
        self.current_scene = Some(scene.name.clone());
        log::debug!("Scene '{}' loaded with {} entities", scene.name, created.len());
        Ok(created)
    }

    /// Tear down the current scene, keeping registrations and systems
    pub fn unload_scene(&mut self) {
        let name = self.current_scene.take().unwrap_or_default();
        self.core.systems.clear();
        self.core
            .world
            .emit_immediate(names::SCENE_FLUSH, vec![EventArg::Text(name)]);
        self.core.world.store_mut().clear();
    }

    /// Stop the clock, destroy every system and remove every entity
    pub fn shutdown(&mut self) {
        log::info!("Shutting down engine");
        self.clock.stop();
        self.core.systems.shutdown(&mut self.core.world);
        self.core.world.store_mut().clear();
        self.current_scene = None;
    }
}

fn install_frame_driver(clock: &mut GameClock<EngineCore>) -> CallbackId {
    clock.add(|core: &mut EngineCore, dt| -> CallbackResult {
        core.frame(dt)?;
        Ok(())
    })
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("core", &self.core)
            .field("clock", &self.clock)
            .field("registry", &self.registry)
            .field("current_scene", &self.current_scene)
            .finish_non_exhaustive()
    }
}
